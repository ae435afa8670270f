//! Client for the internal rate service.
//!
//! The service answers "nearest available rate on or before a date" against
//! the home currency. Two endpoints are used:
//!
//! - `POST {base}/rates/batch` with `{requests: [{date, currency}], nearest}`,
//!   answering `{rates: {"<date>|<CUR>": number}}`
//! - `GET {base}/rates?currency=&date=&nearest=`, answering one of
//!   `{rate}`, `{value}` or `{czk}`

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::RateQuery;
use crate::provider::ensure_positive;

const PROVIDER_ID: &str = "RATE_SERVICE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    requests: Vec<BatchItem<'a>>,
    nearest: bool,
}

#[derive(Debug, Serialize)]
struct BatchItem<'a> {
    date: String,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    rates: HashMap<String, Option<Decimal>>,
}

/// Single-pair answer. The service has shipped three field names over time.
#[derive(Debug, Default, Deserialize)]
struct SingleResponse {
    rate: Option<Decimal>,
    value: Option<Decimal>,
    czk: Option<Decimal>,
}

impl SingleResponse {
    fn into_rate(self) -> Option<Decimal> {
        self.rate.or(self.value).or(self.czk)
    }
}

/// HTTP client for the internal rate service.
#[derive(Clone)]
pub struct RateServiceClient {
    client: Client,
    base_url: String,
}

impl RateServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    /// Resolve many pairs in one round trip.
    ///
    /// Pairs the service has no rate for are simply absent from the result.
    /// Non-positive values are dropped as well.
    pub async fn get_rates_batch(
        &self,
        queries: &[RateQuery],
    ) -> Result<HashMap<RateQuery, Decimal>, MarketDataError> {
        if queries.is_empty() {
            return Ok(HashMap::new());
        }

        let body = BatchRequest {
            requests: queries
                .iter()
                .map(|q| BatchItem {
                    date: q.date.format("%Y-%m-%d").to_string(),
                    currency: &q.currency,
                })
                .collect(),
            nearest: true,
        };

        let url = format!("{}/rates/batch", self.base_url);
        debug!("POST {} ({} pairs)", url, queries.len());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP {}", response.status()),
            ));
        }

        let parsed: BatchResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        Ok(match_batch_rates(queries, parsed.rates))
    }

    /// Resolve one pair, nearest available on or before `date`.
    pub async fn get_nearest_rate(
        &self,
        date: NaiveDate,
        currency: &str,
    ) -> Result<Decimal, MarketDataError> {
        let url = format!(
            "{}/rates?currency={}&date={}&nearest=true",
            self.base_url,
            urlencoding::encode(&currency.to_uppercase()),
            date.format("%Y-%m-%d")
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::RateNotFound {
                provider: PROVIDER_ID.to_string(),
                currency: currency.to_uppercase(),
                date,
            });
        }
        if !response.status().is_success() {
            return Err(MarketDataError::provider(
                PROVIDER_ID,
                format!("HTTP {}", response.status()),
            ));
        }

        let parsed: SingleResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, e.to_string()))?;

        let rate = parsed
            .into_rate()
            .ok_or_else(|| MarketDataError::RateNotFound {
                provider: PROVIDER_ID.to_string(),
                currency: currency.to_uppercase(),
                date,
            })?;

        ensure_positive(PROVIDER_ID, rate)
    }
}

/// Map `"<date>|<CUR>"` keys back to the queries that asked for them.
fn match_batch_rates(
    queries: &[RateQuery],
    mut rates: HashMap<String, Option<Decimal>>,
) -> HashMap<RateQuery, Decimal> {
    let mut resolved = HashMap::with_capacity(queries.len());
    for query in queries {
        match rates.remove(&query.wire_key()).flatten() {
            Some(rate) if rate > Decimal::ZERO => {
                resolved.insert(query.clone(), rate);
            }
            Some(rate) => {
                warn!(
                    "{} returned unusable rate {} for {}",
                    PROVIDER_ID,
                    rate,
                    query.wire_key()
                );
            }
            None => {}
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn query(y: i32, m: u32, d: u32, currency: &str) -> RateQuery {
        RateQuery::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), currency)
    }

    #[test]
    fn test_batch_request_shape() {
        let queries = [query(2024, 3, 15, "usd")];
        let body = BatchRequest {
            requests: queries
                .iter()
                .map(|q| BatchItem {
                    date: q.date.format("%Y-%m-%d").to_string(),
                    currency: &q.currency,
                })
                .collect(),
            nearest: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "requests": [{"date": "2024-03-15", "currency": "USD"}],
                "nearest": true
            })
        );
    }

    #[test]
    fn test_match_batch_rates() {
        let queries = vec![
            query(2024, 3, 15, "USD"),
            query(2024, 3, 16, "EUR"),
            query(2024, 3, 17, "GBP"),
        ];
        let parsed: BatchResponse = serde_json::from_str(
            r#"{"rates":{"2024-03-15|USD":23.117,"2024-03-16|EUR":0,"2024-03-17|GBP":null}}"#,
        )
        .unwrap();

        let resolved = match_batch_rates(&queries, parsed.rates);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(&queries[0]), Some(&dec!(23.117)));
    }

    #[test]
    fn test_single_response_field_variants() {
        for body in [r#"{"rate":25.1}"#, r#"{"value":25.1}"#, r#"{"czk":25.1}"#] {
            let parsed: SingleResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.into_rate(), Some(dec!(25.1)));
        }
        let empty: SingleResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_rate(), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = RateServiceClient::new("http://localhost:8080/api/");
        assert_eq!(client.base_url, "http://localhost:8080/api");
        assert_eq!(client.id(), "RATE_SERVICE");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let client = RateServiceClient::new("http://127.0.0.1:9");
        let resolved = client.get_rates_batch(&[]).await.unwrap();
        assert!(resolved.is_empty());
    }
}
