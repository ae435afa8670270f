//! Price fallback models.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use ledgerly_market_data::Quote;

/// Last Buy/Sell price recorded in the ledger for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePrice {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub currency: String,
}

/// Which step of the waterfall produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    /// Quote stored for today
    ActiveQuote,
    /// Fetched from the live quote provider just now
    LiveRefresh,
    /// Most recent stored quote of any age
    LatestQuote,
    /// Most recent trade price from the ledger
    LastTrade,
}

/// Best known price for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPrice {
    pub price: Decimal,
    pub source: PriceSource,
    pub date: NaiveDate,
    pub currency: String,
}

/// A fallback price tagged with the instant it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCandidate {
    pub price: Decimal,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub source: PriceSource,
}

impl PriceCandidate {
    pub fn from_quote(quote: &Quote, source: PriceSource) -> Self {
        Self {
            price: quote.close,
            currency: quote.currency.clone(),
            timestamp: quote.timestamp,
            source,
        }
    }

    /// Trades carry a day only; they are placed at midnight UTC.
    pub fn from_trade(trade: &TradePrice) -> Self {
        let timestamp = trade
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_default();
        Self {
            price: trade.price,
            currency: trade.currency.clone(),
            timestamp,
            source: PriceSource::LastTrade,
        }
    }
}

impl From<PriceCandidate> for BestPrice {
    fn from(candidate: PriceCandidate) -> Self {
        Self {
            price: candidate.price,
            source: candidate.source,
            date: candidate.timestamp.date_naive(),
            currency: candidate.currency,
        }
    }
}
