use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use ledgerly_market_data::RateQuery;

/// Rate-cache key: day-precision date plus upper-cased currency code.
///
/// Textual form is `"<date>|<CURRENCY>"` (see [`RateQuery::wire_key`]).
pub type RateKey = RateQuery;

/// Where a resolved rate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "camelCase")]
pub enum RateOrigin {
    /// The home currency itself, no lookup
    Home,
    /// Already in the per-import cache
    Cache,
    /// Nearest rate on or before the date from the internal rate source
    Nearest,
    /// External fallback provider, by id
    Fallback(String),
    /// Every source failed; neutral rate substituted
    Default,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Home => f.write_str("home"),
            RateOrigin::Cache => f.write_str("cache"),
            RateOrigin::Nearest => f.write_str("nearest"),
            RateOrigin::Fallback(id) => write!(f, "fallback:{}", id),
            RateOrigin::Default => f.write_str("default"),
        }
    }
}

/// A rate together with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub rate: Decimal,
    pub origin: RateOrigin,
}

impl ResolvedRate {
    pub fn new(rate: Decimal, origin: RateOrigin) -> Self {
        Self { rate, origin }
    }

    pub fn neutral(origin: RateOrigin) -> Self {
        Self::new(Decimal::ONE, origin)
    }

    /// `true` when the rate is the last-resort default.
    pub fn is_degraded(&self) -> bool {
        self.origin == RateOrigin::Default
    }
}
