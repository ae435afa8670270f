use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::HOME_AMOUNT_DP;
use crate::errors::{Result, ValidationError};
use crate::fx::{RateCache, RateKey, RateResolver};
use crate::import::Provider;
use crate::parsers::common::parse_date;
use crate::transactions::{
    CanonicalTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

/// Round a home-currency amount to two decimals, half away from zero.
pub fn round_home(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(HOME_AMOUNT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Result of normalizing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    /// Canonical records, in input order
    pub transactions: Vec<CanonicalTransaction>,
    /// Records that failed normalization
    pub dropped: usize,
}

/// Turns parser drafts into canonical records valued in the home currency.
pub struct Normalizer {
    resolver: Arc<RateResolver>,
}

impl Normalizer {
    pub fn new(resolver: Arc<RateResolver>) -> Self {
        Self { resolver }
    }

    pub fn home_currency(&self) -> &str {
        self.resolver.home_currency()
    }

    /// Normalize a batch with a fresh rate cache.
    pub async fn normalize(&self, provider: Provider, records: Vec<ParsedRecord>) -> NormalizeOutcome {
        let cache = RateCache::new();
        self.normalize_with_cache(&cache, provider, records).await
    }

    /// Normalize a batch against `cache`.
    ///
    /// Every distinct non-home `(date, currency)` pair, fee currencies
    /// included, is prefetched in one batch before any record is touched.
    pub async fn normalize_with_cache(
        &self,
        cache: &RateCache,
        provider: Provider,
        records: Vec<ParsedRecord>,
    ) -> NormalizeOutcome {
        let pairs = self.rate_pairs(&records);
        self.resolver.prefetch(cache, &pairs).await;

        let results = join_all(
            records
                .iter()
                .map(|record| self.normalize_record(cache, provider, record)),
        )
        .await;

        let mut outcome = NormalizeOutcome::default();
        for (record, result) in records.iter().zip(results) {
            match result {
                Ok(tx) => outcome.transactions.push(tx),
                Err(e) => {
                    warn!(
                        "Dropping {} {} record dated {:?}: {}",
                        provider, record.draft.kind, record.draft.date, e
                    );
                    outcome.dropped += 1;
                }
            }
        }
        debug!(
            "Normalized {} {} records, dropped {}",
            outcome.transactions.len(),
            provider,
            outcome.dropped
        );
        outcome
    }

    /// Distinct non-home pairs referenced by the batch, first-seen order.
    fn rate_pairs(&self, records: &[ParsedRecord]) -> Vec<RateKey> {
        let mut pairs: Vec<RateKey> = Vec::new();
        for record in records {
            let Some(date) = parse_date(&record.draft.date) else {
                continue;
            };
            let fee_currency = record.fee_in_kind.as_ref().map(|f| f.currency.as_str());
            for currency in std::iter::once(record.draft.currency.as_str()).chain(fee_currency) {
                if currency.trim().is_empty() || self.resolver.is_home(currency) {
                    continue;
                }
                let key = RateKey::new(date, currency);
                if !pairs.contains(&key) {
                    pairs.push(key);
                }
            }
        }
        pairs
    }

    async fn normalize_record(
        &self,
        cache: &RateCache,
        provider: Provider,
        record: &ParsedRecord,
    ) -> Result<CanonicalTransaction> {
        let draft = &record.draft;
        let date = parse_date(&draft.date)
            .ok_or_else(|| ValidationError::DateFormat(draft.date.clone()))?;
        let symbol = draft.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        let currency = draft.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(ValidationError::MissingField("currency".to_string()).into());
        }

        // Crypto rewards are tracked in units only
        let crypto_revenue =
            draft.kind == TransactionKind::Revenue && draft.product == ProductKind::Crypto;

        let (ex_rate, amount_home) = if crypto_revenue {
            (Decimal::ONE, Decimal::ZERO)
        } else if self.resolver.is_home(&currency) {
            (Decimal::ONE, draft.amount)
        } else {
            let rate = self.resolver.get_rate(cache, date, &currency).await;
            (rate, round_home(draft.amount * rate))
        };

        let fees = match &record.fee_in_kind {
            Some(fee) => self.convert_fee(cache, date, fee).await,
            None => draft.fees.abs(),
        };

        Ok(CanonicalTransaction {
            date,
            id: symbol,
            amount: draft.quantity.abs(),
            price: draft.price,
            amount_cur: draft.amount,
            currency,
            ex_rate,
            amount_czk: amount_home,
            platform: provider.platform().to_string(),
            product_type: draft.product,
            trans_type: draft.kind,
            fees,
            notes: draft.notes.trim().to_string(),
            isin: draft.isin.clone(),
            company_name: draft.company_name.clone(),
        })
    }

    async fn convert_fee(&self, cache: &RateCache, date: NaiveDate, fee: &FeeInKind) -> Decimal {
        let amount = fee.amount.abs();
        if fee.currency.trim().is_empty() || self.resolver.is_home(&fee.currency) {
            return round_home(amount);
        }
        let rate = self.resolver.get_rate(cache, date, &fee.currency).await;
        round_home(amount * rate)
    }
}
