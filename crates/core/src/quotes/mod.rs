//! Price fallback: best known price for an instrument.
//!
//! Used to fill valuation gaps, not by the import pipeline itself.

mod model;
mod price_fallback;
mod store;


pub use model::{BestPrice, PriceCandidate, PriceSource, Quote, TradePrice};
pub use price_fallback::{select_freshest, PriceFallbackResolver};
pub use store::{QuoteStore, TradePriceStore};
