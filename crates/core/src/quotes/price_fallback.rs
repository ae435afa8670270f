//! Best-available price waterfall.
//!
//! 1. today's stored quote
//! 2. a fresh quote from the live provider
//! 3. the fresher of the latest stored quote and the last trade price

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ledgerly_market_data::LiveQuoteProvider;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::model::{BestPrice, PriceCandidate, PriceSource};
use super::store::{QuoteStore, TradePriceStore};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct PriceFallbackResolver {
    quotes: Arc<dyn QuoteStore>,
    trades: Arc<dyn TradePriceStore>,
    live: Option<Arc<dyn LiveQuoteProvider>>,
    today: Clock,
}

impl PriceFallbackResolver {
    pub fn new(
        quotes: Arc<dyn QuoteStore>,
        trades: Arc<dyn TradePriceStore>,
        live: Option<Arc<dyn LiveQuoteProvider>>,
    ) -> Self {
        Self {
            quotes,
            trades,
            live,
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replace the clock used to decide what "today" is.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub async fn get_best_available_price(&self, symbol: &str) -> Option<BestPrice> {
        let today = (self.today)();

        match self.quotes.active_quote(symbol, today).await {
            Ok(Some(quote)) if quote.close > Decimal::ZERO => {
                return Some(PriceCandidate::from_quote(&quote, PriceSource::ActiveQuote).into());
            }
            Ok(_) => debug!("No active quote for {} on {}", symbol, today),
            Err(e) => warn!("Active quote lookup for {} failed: {}", symbol, e),
        }

        if let Some(live) = &self.live {
            match live.get_latest_quote(symbol).await {
                Ok(quote) if quote.close > Decimal::ZERO => {
                    return Some(
                        PriceCandidate::from_quote(&quote, PriceSource::LiveRefresh).into(),
                    );
                }
                Ok(_) => debug!("{} returned no usable price for {}", live.id(), symbol),
                Err(e) => debug!("{} refresh for {} failed: {}", live.id(), symbol, e),
            }
        }

        let latest = match self.quotes.latest_quote(symbol).await {
            Ok(quote) => quote
                .filter(|q| q.close > Decimal::ZERO)
                .map(|q| PriceCandidate::from_quote(&q, PriceSource::LatestQuote)),
            Err(e) => {
                warn!("Latest quote lookup for {} failed: {}", symbol, e);
                None
            }
        };
        let trade = match self.trades.last_trade_price(symbol).await {
            Ok(trade) => trade
                .filter(|t| t.price > Decimal::ZERO)
                .map(|t| PriceCandidate::from_trade(&t)),
            Err(e) => {
                warn!("Last trade lookup for {} failed: {}", symbol, e);
                None
            }
        };

        select_freshest([latest, trade].into_iter().flatten()).map(BestPrice::from)
    }
}

/// The candidate with the strictly latest timestamp.
///
/// Returns `None` for no candidates, or when the latest timestamp is shared
/// by more than one candidate.
pub fn select_freshest(
    candidates: impl IntoIterator<Item = PriceCandidate>,
) -> Option<PriceCandidate> {
    let mut best: Option<PriceCandidate> = None;
    let mut tied = false;
    for candidate in candidates {
        match &best {
            Some(current) if candidate.timestamp < current.timestamp => {}
            Some(current) if candidate.timestamp == current.timestamp => tied = true,
            _ => {
                best = Some(candidate);
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best
    }
}
