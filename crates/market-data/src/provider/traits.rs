//! Provider trait definitions.
//!
//! Two kinds of providers live in this crate:
//! - [`FxRateProvider`]: answers "how many `quote` for one `base` on `date`"
//! - [`LiveQuoteProvider`]: answers "what is the current price of `symbol`"

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Trait for third-party exchange-rate providers.
///
/// Providers are read-only and stateless from the caller's point of view.
/// A caller holding several providers tries them in order and accepts the
/// first positive, finite answer.
///
/// # Example
///
/// ```ignore
/// use ledgerly_market_data::provider::{FxRateProvider, FrankfurterProvider};
///
/// let provider = FrankfurterProvider::new();
/// let rate = provider.get_rate("USD", "CZK", date).await?;
/// ```
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "FRANKFURTER".
    ///
    /// Used for logging and to tag where a resolved rate came from.
    fn id(&self) -> &'static str;

    /// Fetch the rate for one unit of `base` expressed in `quote` on `date`.
    ///
    /// # Returns
    ///
    /// A strictly positive rate on success. Providers must map zero or
    /// missing values to an error instead of returning them.
    async fn get_rate(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError>;
}

/// Trait for live quote sources used to refresh a stale instrument price.
#[async_trait]
pub trait LiveQuoteProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "YAHOO".
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for `symbol`.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}
