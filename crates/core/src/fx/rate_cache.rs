use dashmap::DashMap;
use rust_decimal::Decimal;

use super::fx_model::RateKey;

/// Per-import memo of resolved rates.
///
/// Entries are write-once: the first value stored for a key stays for the
/// lifetime of the cache, later inserts for the same key are ignored.
#[derive(Debug, Default)]
pub struct RateCache {
    entries: DashMap<RateKey, Decimal>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RateKey) -> Option<Decimal> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    pub fn contains(&self, key: &RateKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `rate` unless the key is already present. Returns the value held
    /// after the call.
    pub fn insert(&self, key: RateKey, rate: Decimal) -> Decimal {
        *self.entries.entry(key).or_insert(rate).value()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn key(currency: &str) -> RateKey {
        RateKey::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), currency)
    }

    #[test]
    fn test_first_write_wins() {
        let cache = RateCache::new();
        assert_eq!(cache.insert(key("USD"), dec!(23.1)), dec!(23.1));
        assert_eq!(cache.insert(key("usd"), dec!(99)), dec!(23.1));
        assert_eq!(cache.get(&key("USD")), Some(dec!(23.1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_per_day_and_currency() {
        let cache = RateCache::new();
        cache.insert(key("EUR"), dec!(25.2));
        let next_day = RateKey::new(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(), "EUR");
        assert!(cache.contains(&key("EUR")));
        assert!(!cache.contains(&next_day));
        assert!(!cache.contains(&key("USD")));
    }
}
