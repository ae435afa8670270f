//! Ledgerly Core - statement recognition, parsing and normalization.
//!
//! Decoded statement content flows through
//! [`recognition`] → [`parsers`] → [`normalizer`] and leaves as canonical
//! transactions valued in the home currency. Network access happens only
//! through the traits of the `ledgerly-market-data` crate.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod import;
pub mod normalizer;
pub mod parsers;
pub mod quotes;
pub mod recognition;
pub mod transactions;

pub use import::{ImportContent, ImportService, ImportServiceTrait, Provider, TransactionSink};
pub use normalizer::Normalizer;
pub use recognition::{identify, Recognizer};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
