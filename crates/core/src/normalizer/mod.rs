//! Normalizer: drafts → canonical records valued in the home currency.

mod normalizer_service;

#[cfg(test)]
mod normalizer_service_tests;

pub use normalizer_service::{round_home, NormalizeOutcome, Normalizer};
