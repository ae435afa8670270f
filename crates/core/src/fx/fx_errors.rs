use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the in-memory rate sources.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("No {currency} rate on or before {date}")]
    RateNotFound { currency: String, date: NaiveDate },

    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),
}
