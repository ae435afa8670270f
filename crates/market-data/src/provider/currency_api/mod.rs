//! Free currency API provider (fawazahmed0/exchange-api).
//!
//! Daily snapshots are published as static JSON on a CDN. The jsdelivr
//! endpoint is tried first, then the Cloudflare Pages mirror. Snapshots also
//! carry crypto tickers (`usdc`, `btc`), so codes are not limited to ISO 4217.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::is_valid_asset_code;
use crate::provider::{ensure_positive, FxRateProvider};

const PROVIDER_ID: &str = "CURRENCY_API";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CurrencyApiProvider {
    client: Client,
}

impl CurrencyApiProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Candidate URLs for one daily snapshot, primary first.
    fn snapshot_urls(base: &str, date: NaiveDate) -> [String; 2] {
        let date = date.format("%Y-%m-%d");
        [
            format!(
                "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@{}/v1/currencies/{}.json",
                date, base
            ),
            format!(
                "https://{}.currency-api.pages.dev/v1/currencies/{}.json",
                date, base
            ),
        ]
    }

    async fn fetch_snapshot(&self, url: &str) -> Result<Value, MarketDataError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))
    }
}

impl Default for CurrencyApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull `snapshot[base][quote]` out of a daily snapshot.
///
/// Snapshots look like `{"date": "2024-03-15", "usd": {"czk": 23.117, ...}}`
/// with lowercase codes.
fn extract_rate(snapshot: &Value, base: &str, quote: &str) -> Option<Decimal> {
    let value = snapshot.get(base)?.get(quote)?;
    serde_json::from_value::<Decimal>(value.clone()).ok()
}

#[async_trait]
impl FxRateProvider for CurrencyApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_rate(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        for code in [base, quote] {
            if !is_valid_asset_code(code) {
                return Err(MarketDataError::InvalidCurrency(code.to_string()));
            }
        }
        let base_lc = base.to_lowercase();
        let quote_lc = quote.to_lowercase();

        let mut last_error = None;
        for url in Self::snapshot_urls(&base_lc, date) {
            match self.fetch_snapshot(&url).await {
                Ok(snapshot) => {
                    return match extract_rate(&snapshot, &base_lc, &quote_lc) {
                        Some(rate) => ensure_positive(PROVIDER_ID, rate),
                        None => Err(MarketDataError::RateNotFound {
                            provider: PROVIDER_ID.to_string(),
                            currency: base.to_uppercase(),
                            date,
                        }),
                    };
                }
                Err(e) => {
                    warn!("{} snapshot {} failed: {}", PROVIDER_ID, url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(MarketDataError::AllProvidersFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        assert_eq!(CurrencyApiProvider::new().id(), "CURRENCY_API");
    }

    #[test]
    fn test_snapshot_urls() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let urls = CurrencyApiProvider::snapshot_urls("eur", date);
        assert!(urls[0].contains("currency-api@2024-03-15/v1/currencies/eur.json"));
        assert!(urls[1].starts_with("https://2024-03-15.currency-api.pages.dev/"));
    }

    #[test]
    fn test_extract_rate() {
        let snapshot: Value =
            serde_json::from_str(r#"{"date":"2024-03-15","usd":{"czk":23.117,"eur":0.918}}"#)
                .unwrap();
        assert_eq!(extract_rate(&snapshot, "usd", "czk"), Some(dec!(23.117)));
        assert_eq!(extract_rate(&snapshot, "usd", "huf"), None);
        assert_eq!(extract_rate(&snapshot, "gbp", "czk"), None);
    }

    #[tokio::test]
    async fn test_rejects_malformed_codes_before_any_request() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let err = CurrencyApiProvider::new()
            .get_rate("U$D", "CZK", date)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidCurrency(_)));
    }
}
