//! Core error types for the Ledgerly importer.
//!
//! Row-level problems never surface here: parsers skip malformed rows and the
//! normalizer drops records it cannot canonicalize. These errors describe
//! failures that abort a whole file or a whole call.

use thiserror::Error;

use crate::fx::FxError;
use crate::import::ContentError;
use ledgerly_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the import pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Unrecognized statement: {0}")]
    UnknownProvider(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Failed to save transactions: {0}")]
    Sink(String),
}

/// Validation errors for parsed field values.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unrecognized date format: {0}")]
    DateFormat(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Sink(err.to_string())
    }
}
