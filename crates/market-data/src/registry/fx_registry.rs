//! Ordered fallback over external exchange-rate providers.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::FxRate;
use crate::provider::FxRateProvider;

/// Tries providers in registration order and returns the first usable rate.
pub struct FxProviderRegistry {
    providers: Vec<Arc<dyn FxRateProvider>>,
}

impl FxProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn FxRateProvider>>) -> Self {
        Self { providers }
    }

    /// Fetch `1 base = ? quote` on `date`.
    ///
    /// A provider error classified [`RetryClass::NextProvider`] moves on to
    /// the next provider; [`RetryClass::Never`] stops the walk immediately.
    /// Answers that are zero or negative count as failures.
    pub async fn fetch_rate(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<FxRate, MarketDataError> {
        let mut last_error: Option<MarketDataError> = None;

        for provider in &self.providers {
            match provider.get_rate(base, quote, date).await {
                Ok(rate) if rate > Decimal::ZERO => {
                    debug!("{} answered {}/{} {} = {}", provider.id(), base, quote, date, rate);
                    return Ok(FxRate {
                        base: base.to_uppercase(),
                        quote: quote.to_uppercase(),
                        date,
                        rate,
                        source: provider.id().to_string(),
                    });
                }
                Ok(rate) => {
                    warn!("{} returned non-positive rate {} for {} {}", provider.id(), rate, base, date);
                    last_error = Some(MarketDataError::ValidationFailed {
                        message: format!("{} returned rate {}", provider.id(), rate),
                    });
                }
                Err(e) => {
                    warn!("{} failed for {} {}: {}", provider.id(), base, date, e);
                    if e.retry_class() == RetryClass::Never {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(MarketDataError::AllProvidersFailed))
    }

    pub fn providers(&self) -> &[Arc<dyn FxRateProvider>] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Answer(Decimal),
        NotFound,
        Invalid,
        Exhausted,
    }

    struct MockProvider {
        id: &'static str,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FxRateProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn get_rate(
            &self,
            base: &str,
            _quote: &str,
            date: NaiveDate,
        ) -> Result<Decimal, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Answer(rate) => Ok(rate),
                Behavior::NotFound => Err(MarketDataError::RateNotFound {
                    provider: self.id.to_string(),
                    currency: base.to_string(),
                    date,
                }),
                Behavior::Invalid => Err(MarketDataError::InvalidCurrency(base.to_string())),
                Behavior::Exhausted => Err(MarketDataError::AllProvidersFailed),
            }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_first_positive_answer_wins() {
        let first = MockProvider::new("FIRST", Behavior::NotFound);
        let second = MockProvider::new("SECOND", Behavior::Answer(dec!(23.1)));
        let third = MockProvider::new("THIRD", Behavior::Answer(dec!(99)));
        let registry = FxProviderRegistry::new(vec![first.clone(), second.clone(), third.clone()]);

        let rate = registry.fetch_rate("usd", "czk", date()).await.unwrap();
        assert_eq!(rate.rate, dec!(23.1));
        assert_eq!(rate.source, "SECOND");
        assert_eq!(rate.base, "USD");
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_rate_falls_through() {
        let zero = MockProvider::new("ZERO", Behavior::Answer(Decimal::ZERO));
        let good = MockProvider::new("GOOD", Behavior::Answer(dec!(25.3)));
        let registry = FxProviderRegistry::new(vec![zero, good]);

        let rate = registry.fetch_rate("EUR", "CZK", date()).await.unwrap();
        assert_eq!(rate.source, "GOOD");
    }

    #[tokio::test]
    async fn test_rejected_code_falls_through_to_next_provider() {
        let strict = MockProvider::new("ISO_ONLY", Behavior::Invalid);
        let crypto = MockProvider::new("CRYPTO", Behavior::Answer(dec!(22.8)));
        let registry = FxProviderRegistry::new(vec![strict.clone(), crypto.clone()]);

        let rate = registry.fetch_rate("USDC", "CZK", date()).await.unwrap();
        assert_eq!(rate.rate, dec!(22.8));
        assert_eq!(rate.source, "CRYPTO");
        assert_eq!(strict.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_rejecting_returns_last_error() {
        let first = MockProvider::new("FIRST", Behavior::Invalid);
        let second = MockProvider::new("SECOND", Behavior::Invalid);
        let registry = FxProviderRegistry::new(vec![first, second]);

        let err = registry.fetch_rate("XX1", "CZK", date()).await.unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidCurrency(_)));
    }

    #[tokio::test]
    async fn test_never_class_stops_walk() {
        let exhausted = MockProvider::new("NESTED", Behavior::Exhausted);
        let good = MockProvider::new("GOOD", Behavior::Answer(dec!(25.3)));
        let registry = FxProviderRegistry::new(vec![exhausted, good.clone()]);

        let err = registry.fetch_rate("USD", "CZK", date()).await.unwrap_err();
        assert!(matches!(err, MarketDataError::AllProvidersFailed));
        assert_eq!(good.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = FxProviderRegistry::new(vec![]);
        assert!(registry.is_empty());
        let err = registry.fetch_rate("USD", "CZK", date()).await.unwrap_err();
        assert!(matches!(err, MarketDataError::AllProvidersFailed));
    }
}
