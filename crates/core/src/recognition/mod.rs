//! Recognizer: decoded content + file name → provider.
//!
//! Rows are matched by header rules, markup and document text by regex
//! pattern rules, workbooks by structural predicates.

mod recognizer;
mod rules;


pub use recognizer::Recognizer;
pub use rules::{
    HeaderRule, MatchTarget, PatternRule, PredicateRule, Rule, TRADING212_HEADER_PREFIX,
};

use crate::constants::UNKNOWN_PROVIDER;
use crate::import::{ImportContent, Provider};

/// Identify `content` with the default rule set.
pub fn identify(content: &ImportContent, filename: &str) -> Option<Provider> {
    Recognizer::new().identify(content, filename)
}

/// Tag of a recognition result, `"unknown"` when none.
pub fn provider_tag(provider: Option<Provider>) -> &'static str {
    provider.map(|p| p.tag()).unwrap_or(UNKNOWN_PROVIDER)
}
