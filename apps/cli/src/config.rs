use std::path::PathBuf;
use std::time::Duration;

use ledgerly_core::constants::HOME_CURRENCY;
use ledgerly_core::import::ImportSettings;

pub const DEFAULT_RATE_API_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_OUTPUT: &str = "transactions.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub home_currency: String,
    pub rate_api_url: String,
    pub http_timeout: Duration,
    pub output: PathBuf,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout_ms = get("LEDGERLY_HTTP_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);

        Self {
            home_currency: get("LEDGERLY_HOME_CURRENCY")
                .unwrap_or_else(|| HOME_CURRENCY.to_string())
                .to_uppercase(),
            rate_api_url: get("LEDGERLY_RATE_API_URL")
                .unwrap_or_else(|| DEFAULT_RATE_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            http_timeout: Duration::from_millis(http_timeout_ms),
            output: PathBuf::from(get("LEDGERLY_OUTPUT").unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
            log_format: get("LEDGERLY_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        }
    }

    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            home_currency: self.home_currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.home_currency, "CZK");
        assert_eq!(config.rate_api_url, DEFAULT_RATE_API_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.output, PathBuf::from("transactions.json"));
        assert_eq!(config.log_format, "text");
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config(&[
            ("LEDGERLY_HOME_CURRENCY", "eur"),
            ("LEDGERLY_RATE_API_URL", "https://rates.example.com/api/"),
            ("LEDGERLY_HTTP_TIMEOUT_MS", "soon"),
            ("LEDGERLY_LOG_FORMAT", " "),
        ]);
        assert_eq!(config.home_currency, "EUR");
        assert_eq!(config.rate_api_url, "https://rates.example.com/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, "text");
        assert_eq!(config.import_settings().home_currency, "EUR");
    }
}
