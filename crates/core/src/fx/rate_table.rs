use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fx_errors::FxError;
use super::fx_traits::NearestRateSource;
use crate::errors::Result;

/// In-memory rate history, one time series per currency.
///
/// Rates are home-currency units per one unit of the currency. Lookups
/// return the closest rate on or before the requested date, never a later
/// one.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    /// Currency -> (Date -> Rate). BTreeMap gives O(log N) range lookups.
    rates: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(currency, date, rate)` triples.
    pub fn from_rates<I, S>(rates: I) -> Self
    where
        I: IntoIterator<Item = (S, NaiveDate, Decimal)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (currency, date, rate) in rates {
            table.insert(currency.as_ref(), date, rate);
        }
        table
    }

    /// Add one observation. Non-positive rates are ignored.
    pub fn insert(&mut self, currency: &str, date: NaiveDate, rate: Decimal) {
        if rate <= Decimal::ZERO {
            log::warn!("Ignoring non-positive {} rate {} on {}", currency, rate, date);
            return;
        }
        self.rates
            .entry(currency.trim().to_uppercase())
            .or_default()
            .insert(date, rate);
    }

    pub fn rate_on_or_before(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .get(&currency.trim().to_uppercase())?
            .range(..=date)
            .next_back()
            .map(|(_, rate)| *rate)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl NearestRateSource for RateTable {
    fn id(&self) -> &'static str {
        "RATE_TABLE"
    }

    async fn nearest_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal> {
        self.rate_on_or_before(currency, date).ok_or_else(|| {
            FxError::RateNotFound {
                currency: currency.to_uppercase(),
                date,
            }
            .into()
        })
    }
}
