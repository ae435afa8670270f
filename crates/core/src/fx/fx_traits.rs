use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerly_market_data::RateServiceClient;
use log::debug;
use rust_decimal::Decimal;

use super::fx_model::RateKey;
use crate::errors::Result;

/// Internal "nearest available rate on or before a date" lookup.
///
/// Rates are expressed in the home currency per one unit of `currency`.
#[async_trait]
pub trait NearestRateSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn nearest_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal>;

    /// Resolve many keys at once. Keys without a rate are absent from the
    /// result. The default walks the keys one by one.
    async fn nearest_rates(&self, keys: &[RateKey]) -> Result<HashMap<RateKey, Decimal>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.nearest_rate(key.date, &key.currency).await {
                Ok(rate) => {
                    found.insert(key.clone(), rate);
                }
                Err(e) => debug!("{}: no rate for {}: {}", self.id(), key.wire_key(), e),
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl NearestRateSource for RateServiceClient {
    fn id(&self) -> &'static str {
        RateServiceClient::id(self)
    }

    async fn nearest_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal> {
        Ok(self.get_nearest_rate(date, currency).await?)
    }

    async fn nearest_rates(&self, keys: &[RateKey]) -> Result<HashMap<RateKey, Decimal>> {
        Ok(self.get_rates_batch(keys).await?)
    }
}
