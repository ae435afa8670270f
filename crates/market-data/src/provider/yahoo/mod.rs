//! Yahoo Finance live quote provider.
//!
//! Reads the latest regular-market price from the public chart endpoint.
//! Used by the price fallback waterfall to refresh a stale instrument price.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{header, Client};
use rust_decimal::Decimal;
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::LiveQuoteProvider;

use models::{YahooChartMeta, YahooChartResponse};

const PROVIDER_ID: &str = "YAHOO";

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance live quote provider.
pub struct YahooQuoteProvider {
    client: Client,
}

impl YahooQuoteProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for YahooQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a chart `meta` block into a quote.
fn quote_from_meta(symbol: &str, meta: YahooChartMeta) -> Result<Quote, MarketDataError> {
    let close = meta
        .regular_market_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .and_then(Decimal::from_f64_retain)
        .map(|d| d.round_dp(6).normalize())
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No valid price for {}", symbol),
        })?;

    let timestamp = meta
        .regular_market_time
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    let currency = meta.currency.unwrap_or_else(|| "USD".to_string());

    Ok(Quote::new(symbol, timestamp, close, currency, PROVIDER_ID))
}

#[async_trait]
impl LiveQuoteProvider for YahooQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let url = format!("{}/{}?range=1d&interval=1d", CHART_URL, encode(symbol));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Quote request failed: {}", e),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP {}", response.status()),
            ));
        }

        let data: YahooChartResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to parse chart response: {}", e),
                })?;

        if let Some(error) = data.chart.error {
            debug!(
                "Yahoo chart error for {}: {:?} {:?}",
                symbol, error.code, error.description
            );
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        let meta = data
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.meta)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        quote_from_meta(symbol, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        assert_eq!(YahooQuoteProvider::new().id(), "YAHOO");
    }

    #[test]
    fn test_chart_meta_to_quote() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"AAPL",
            "regularMarketPrice":189.84,"regularMarketTime":1710532800}}],"error":null}}"#;
        let data: YahooChartResponse = serde_json::from_str(body).unwrap();
        let meta = data.chart.result.unwrap().into_iter().next().unwrap().meta;

        let quote = quote_from_meta("AAPL", meta).unwrap();
        assert_eq!(quote.close, dec!(189.84));
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.source, "YAHOO");
        assert_eq!(quote.timestamp.timestamp(), 1710532800);
    }

    #[test]
    fn test_missing_price_fails_validation() {
        let meta = YahooChartMeta {
            currency: Some("EUR".to_string()),
            symbol: Some("SAP.DE".to_string()),
            regular_market_price: None,
            regular_market_time: None,
        };
        let err = quote_from_meta("SAP.DE", meta).unwrap_err();
        assert!(matches!(err, MarketDataError::ValidationFailed { .. }));
    }

    #[test]
    fn test_chart_error_payload_parses() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let data: YahooChartResponse = serde_json::from_str(body).unwrap();
        assert!(data.chart.result.is_none());
        assert_eq!(data.chart.error.unwrap().code.as_deref(), Some("Not Found"));
    }
}
