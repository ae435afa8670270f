//! Ledgerly Market Data Crate
//!
//! Network collaborators for the statement importer:
//!
//! - [`RateServiceClient`] - the internal "nearest rate on or before" service,
//!   with batched and single-pair lookups
//! - [`FrankfurterProvider`], [`CurrencyApiProvider`] - external exchange-rate
//!   fallbacks, chained by [`FxProviderRegistry`]
//! - [`YahooQuoteProvider`] - live quote refresh for instrument valuation
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +---------------------+
//! |  Rate resolver   | ---> |  RateServiceClient  |  (nearest on or before)
//! |  (ledgerly-core) |      +---------------------+
//! |                  |      +---------------------+      +-------------+
//! |                  | ---> | FxProviderRegistry  | ---> | Frankfurter |
//! +------------------+      +---------------------+  |   +-------------+
//!                                                    +-> | currency-api|
//!                                                        +-------------+
//! ```

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use errors::{MarketDataError, RetryClass};
pub use models::{is_valid_asset_code, is_valid_currency_code, FxRate, Quote, RateQuery};

pub use provider::currency_api::CurrencyApiProvider;
pub use provider::frankfurter::FrankfurterProvider;
pub use provider::rate_service::RateServiceClient;
pub use provider::yahoo::YahooQuoteProvider;
pub use provider::{FxRateProvider, LiveQuoteProvider};

pub use registry::FxProviderRegistry;
