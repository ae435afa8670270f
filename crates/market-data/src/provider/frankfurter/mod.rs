//! Frankfurter provider for historical reference exchange rates.
//!
//! Frankfurter republishes the ECB reference rates. For weekends and holidays
//! it answers with the last published business day, which is exactly the
//! "on or before" semantics the importer wants.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::is_valid_currency_code;
use crate::provider::{ensure_positive, FxRateProvider};

/// Provider ID constant
const PROVIDER_ID: &str = "FRANKFURTER";

/// Public endpoint
const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API response from Frankfurter
#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    /// Date the rates were published for (may precede the requested date)
    #[allow(dead_code)]
    date: String,
    /// Target currency -> rate for one unit of base
    rates: HashMap<String, Decimal>,
}

pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a mirror (or a test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, base: &str, quote: &str, date: NaiveDate) -> String {
        format!(
            "{}/{}?from={}&to={}",
            self.base_url,
            date.format("%Y-%m-%d"),
            base,
            quote
        )
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FxRateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_rate(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        let base = base.to_uppercase();
        let quote = quote.to_uppercase();
        for code in [&base, &quote] {
            if !is_valid_currency_code(code) {
                return Err(MarketDataError::InvalidCurrency(code.clone()));
            }
        }

        let url = self.build_url(&base, &quote, date);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::RateNotFound {
                provider: PROVIDER_ID.to_string(),
                currency: base,
                date,
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP {}", status),
            ));
        }

        let body: FrankfurterResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        let rate = body
            .rates
            .get(&quote)
            .copied()
            .ok_or_else(|| MarketDataError::RateNotFound {
                provider: PROVIDER_ID.to_string(),
                currency: base.clone(),
                date,
            })?;

        ensure_positive(PROVIDER_ID, rate)
    }
}
