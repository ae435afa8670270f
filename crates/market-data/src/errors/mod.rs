//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all rate and quote lookups
//! - [`RetryClass`]: Classification for determining fallback behavior

mod retry;

pub use retry::RetryClass;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while talking to rate or quote providers.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which tells a fallback chain whether to move on to the next provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider has no rate for this currency on (or near) this date.
    #[error("Rate not found: {provider} has no {currency} rate for {date}")]
    RateNotFound {
        /// The provider that was asked
        provider: String,
        /// Requested currency code
        currency: String,
        /// Requested date
        date: NaiveDate,
    },

    /// The requested symbol was not found by the quote provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider does not accept this currency code. Codes are
    /// provider-specific (ISO 4217 only, or crypto tickers too), so another
    /// provider may still answer.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// A provider-specific error occurred (HTTP status, malformed payload).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered, but with a value that cannot be used
    /// (zero, negative, not finite).
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// All providers were tried and all failed.
    #[error("All providers failed")]
    AllProvidersFailed,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the fallback classification for this error.
    ///
    /// ```
    /// use ledgerly_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::AllProvidersFailed;
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    ///
    /// let error = MarketDataError::ProviderError {
    ///     provider: "FRANKFURTER".to_string(),
    ///     message: "HTTP 500".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::AllProvidersFailed => RetryClass::Never,

            Self::InvalidCurrency(_)
            | Self::RateNotFound { .. }
            | Self::SymbolNotFound(_)
            | Self::ProviderError { .. }
            | Self::ValidationFailed { .. }
            | Self::Network(_) => RetryClass::NextProvider,
        }
    }

    pub(crate) fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_currency_tries_next_provider() {
        let error = MarketDataError::InvalidCurrency("USDC".to_string());
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_exhausted_chain_never_retries() {
        assert_eq!(
            MarketDataError::AllProvidersFailed.retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_rate_not_found_tries_next_provider() {
        let error = MarketDataError::RateNotFound {
            provider: "FRANKFURTER".to_string(),
            currency: "HUF".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_validation_failed_tries_next_provider() {
        let error = MarketDataError::ValidationFailed {
            message: "rate is zero".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::provider("CURRENCY_API", "HTTP 404");
        assert_eq!(
            format!("{}", error),
            "Provider error: CURRENCY_API - HTTP 404"
        );

        let error = MarketDataError::RateNotFound {
            provider: "RATE_SERVICE".to_string(),
            currency: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };
        assert_eq!(
            format!("{}", error),
            "Rate not found: RATE_SERVICE has no USD rate for 2024-03-15"
        );
    }
}
