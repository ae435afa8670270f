//! Rate and quote provider abstractions and implementations.
//!
//! This module contains:
//! - The [`FxRateProvider`] and [`LiveQuoteProvider`] traits
//! - External FX providers (Frankfurter, currency-api)
//! - The internal rate service client (batched and single-pair lookups)
//! - The Yahoo live quote provider

mod traits;

pub mod currency_api;
pub mod frankfurter;
pub mod rate_service;
pub mod yahoo;

pub use traits::{FxRateProvider, LiveQuoteProvider};

use rust_decimal::Decimal;

use crate::errors::MarketDataError;

/// Reject zero and negative rates at the provider boundary.
pub(crate) fn ensure_positive(provider: &str, rate: Decimal) -> Result<Decimal, MarketDataError> {
    if rate > Decimal::ZERO {
        Ok(rate)
    } else {
        Err(MarketDataError::ValidationFailed {
            message: format!("{} returned non-positive rate {}", provider, rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("X", dec!(1.5)).unwrap(), dec!(1.5));
        assert!(ensure_positive("X", Decimal::ZERO).is_err());
        assert!(ensure_positive("X", dec!(-2)).is_err());
    }
}
