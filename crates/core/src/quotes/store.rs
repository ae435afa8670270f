//! Read-only stores consulted by the price fallback waterfall.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{Quote, TradePrice};
use crate::errors::Result;

/// Stored market quotes.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Quote recorded for `symbol` on `day`, if any.
    async fn active_quote(&self, symbol: &str, day: NaiveDate) -> Result<Option<Quote>>;

    /// Most recent quote for `symbol` regardless of age.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>>;
}

/// Ledger trades.
#[async_trait]
pub trait TradePriceStore: Send + Sync {
    /// Price of the most recent Buy or Sell of `symbol`.
    async fn last_trade_price(&self, symbol: &str) -> Result<Option<TradePrice>>;
}
