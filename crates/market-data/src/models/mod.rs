//! Market data models
//!
//! - `quote` - Live quote returned by a quote provider (Quote)
//! - `rate` - Exchange-rate request/answer types (RateQuery, FxRate)

mod quote;
mod rate;

pub use quote::Quote;
pub use rate::{is_valid_asset_code, is_valid_currency_code, FxRate, RateQuery};
