use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use ledgerly_market_data::{FxProviderRegistry, FxRateProvider};
use log::{debug, warn};
use rust_decimal::Decimal;

use super::fx_model::{RateKey, RateOrigin, ResolvedRate};
use super::fx_traits::NearestRateSource;
use super::rate_cache::RateCache;

/// Resolves `(date, currency)` to home-currency units per one unit.
///
/// Order per pair: home currency, cache, internal nearest-rate source,
/// external providers in order, and finally a neutral rate of 1. Every
/// non-default answer is written to the caller's [`RateCache`].
pub struct RateResolver {
    home_currency: String,
    nearest: Arc<dyn NearestRateSource>,
    fallbacks: FxProviderRegistry,
}

impl RateResolver {
    pub fn new(
        home_currency: &str,
        nearest: Arc<dyn NearestRateSource>,
        fallbacks: Vec<Arc<dyn FxRateProvider>>,
    ) -> Self {
        Self {
            home_currency: home_currency.trim().to_uppercase(),
            nearest,
            fallbacks: FxProviderRegistry::new(fallbacks),
        }
    }

    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    pub fn is_home(&self, currency: &str) -> bool {
        currency.trim().eq_ignore_ascii_case(&self.home_currency)
    }

    pub async fn get_rate(&self, cache: &RateCache, date: NaiveDate, currency: &str) -> Decimal {
        self.resolve(cache, date, currency).await.rate
    }

    pub async fn resolve(&self, cache: &RateCache, date: NaiveDate, currency: &str) -> ResolvedRate {
        if self.is_home(currency) {
            return ResolvedRate::neutral(RateOrigin::Home);
        }

        let key = RateKey::new(date, currency);
        if let Some(rate) = cache.get(&key) {
            return ResolvedRate::new(rate, RateOrigin::Cache);
        }

        match self.nearest.nearest_rate(date, &key.currency).await {
            Ok(rate) if rate > Decimal::ZERO => {
                let rate = cache.insert(key, rate);
                return ResolvedRate::new(rate, RateOrigin::Nearest);
            }
            Ok(rate) => debug!(
                "{} returned unusable rate {} for {}",
                self.nearest.id(),
                rate,
                key.wire_key()
            ),
            Err(e) => debug!("{} failed for {}: {}", self.nearest.id(), key.wire_key(), e),
        }

        if !self.fallbacks.is_empty() {
            match self
                .fallbacks
                .fetch_rate(&key.currency, &self.home_currency, date)
                .await
            {
                Ok(fx) => {
                    let rate = cache.insert(key, fx.rate);
                    return ResolvedRate::new(rate, RateOrigin::Fallback(fx.source));
                }
                Err(e) => debug!("Fallback providers failed for {}: {}", key.wire_key(), e),
            }
        }

        warn!(
            "No exchange rate for {} on {}, using 1 instead",
            key.currency, date
        );
        ResolvedRate::neutral(RateOrigin::Default)
    }

    /// Warm `cache` with one batched lookup for every key not yet cached.
    ///
    /// Best effort: failures are logged and leave the cache as it was.
    pub async fn prefetch(&self, cache: &RateCache, keys: &[RateKey]) {
        let mut seen = HashSet::new();
        let missing: Vec<RateKey> = keys
            .iter()
            .filter(|k| !self.is_home(&k.currency) && !cache.contains(k))
            .filter(|k| seen.insert((*k).clone()))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }

        match self.nearest.nearest_rates(&missing).await {
            Ok(found) => {
                let mut stored = 0usize;
                for (key, rate) in found {
                    if rate > Decimal::ZERO {
                        cache.insert(key, rate);
                        stored += 1;
                    }
                }
                debug!(
                    "Prefetched {} of {} exchange rates from {}",
                    stored,
                    missing.len(),
                    self.nearest.id()
                );
            }
            Err(e) => warn!(
                "Rate prefetch of {} pairs failed, resolving one by one: {}",
                missing.len(),
                e
            ),
        }
    }
}
