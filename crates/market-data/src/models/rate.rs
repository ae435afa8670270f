use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single (date, currency) lookup.
///
/// The currency is always stored upper-cased; the date is day precision.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateQuery {
    pub date: NaiveDate,
    pub currency: String,
}

impl RateQuery {
    pub fn new(date: NaiveDate, currency: &str) -> Self {
        Self {
            date,
            currency: currency.trim().to_uppercase(),
        }
    }

    /// Wire key used by the rate service batch response: `"2024-03-15|USD"`.
    pub fn wire_key(&self) -> String {
        format!("{}|{}", self.date.format("%Y-%m-%d"), self.currency)
    }
}

/// An exchange rate answer: `1 base = rate quote`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub base: String,
    pub quote: String,
    pub date: NaiveDate,
    pub rate: Decimal,
    pub source: String,
}

/// Three ASCII letters, nothing else.
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Fiat or crypto ticker: 2 to 10 ASCII alphanumerics with at least one letter
/// (`USDC`, `1INCH`, `BTC`).
pub fn is_valid_asset_code(code: &str) -> bool {
    (2..=10).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_alphanumeric())
        && code.chars().any(|c| c.is_ascii_alphabetic())
}
