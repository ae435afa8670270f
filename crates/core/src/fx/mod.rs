//! Exchange-rate resolution for one import.
//!
//! A [`RateResolver`] answers "home-currency units per one unit of currency
//! on a date", memoizing into a [`RateCache`] owned by the caller.

mod fx_errors;
mod fx_model;
mod fx_traits;
mod rate_cache;
mod rate_resolver;
mod rate_table;


pub use fx_errors::FxError;
pub use fx_model::{RateKey, RateOrigin, ResolvedRate};
pub use fx_traits::NearestRateSource;
pub use rate_cache::RateCache;
pub use rate_resolver::RateResolver;
pub use rate_table::RateTable;
