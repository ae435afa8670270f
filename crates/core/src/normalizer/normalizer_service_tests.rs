//! Tests for batch normalization.

#[cfg(test)]
mod tests {
    use crate::errors::Result;
    use crate::fx::{FxError, NearestRateSource, RateCache, RateKey, RateResolver, RateTable};
    use crate::import::{ImportContent, Provider};
    use crate::normalizer::{round_home, Normalizer};
    use crate::parsers::{parser_for, ParseContext};
    use crate::transactions::{
        DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Rate table that records how it was called.
    struct CountingSource {
        table: RateTable,
        batches: Mutex<Vec<Vec<RateKey>>>,
    }

    impl CountingSource {
        fn new(table: RateTable) -> Arc<Self> {
            Arc::new(Self {
                table,
                batches: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NearestRateSource for CountingSource {
        fn id(&self) -> &'static str {
            "COUNTING"
        }

        async fn nearest_rate(&self, date: NaiveDate, currency: &str) -> Result<Decimal> {
            self.table.nearest_rate(date, currency).await
        }

        async fn nearest_rates(&self, keys: &[RateKey]) -> Result<HashMap<RateKey, Decimal>> {
            self.batches.lock().unwrap().push(keys.to_vec());
            if keys.iter().any(|k| k.currency == "XXX") {
                return Err(FxError::SourceUnavailable("batch rejected".to_string()).into());
            }
            self.table.nearest_rates(keys).await
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn rates() -> RateTable {
        RateTable::from_rates([
            ("USD", date(14), dec!(23.105)),
            ("EUR", date(14), dec!(25.05)),
        ])
    }

    fn normalizer(source: Arc<CountingSource>) -> Normalizer {
        Normalizer::new(Arc::new(RateResolver::new("CZK", source, vec![])))
    }

    fn buy(currency: &str, amount: Decimal) -> DraftTransaction {
        DraftTransaction::new("15.03.2024", " aapl ", TransactionKind::Buy, ProductKind::Stock)
            .with_quantity(dec!(-10))
            .with_price(Some(dec!(172.50)))
            .with_amount(amount, currency)
    }

    #[tokio::test]
    async fn test_foreign_currency_is_converted_and_rounded() {
        let source = CountingSource::new(rates());
        let outcome = normalizer(source)
            .normalize(Provider::Ibkr, vec![buy("usd", dec!(-1725.00)).into()])
            .await;

        assert_eq!(outcome.dropped, 0);
        let tx = &outcome.transactions[0];
        assert_eq!(tx.date, date(15));
        assert_eq!(tx.id, "AAPL");
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.amount, dec!(10));
        assert_eq!(tx.ex_rate, dec!(23.105));
        // -39856.125 rounds away from zero
        assert_eq!(tx.amount_czk, dec!(-39856.13));
        assert_eq!(tx.platform, "Interactive Brokers");
    }

    #[tokio::test]
    async fn test_home_currency_is_not_rounded() {
        let source = CountingSource::new(rates());
        let outcome = normalizer(source.clone())
            .normalize(Provider::Fio, vec![buy("CZK", dec!(-1000.005)).into()])
            .await;
        let tx = &outcome.transactions[0];
        assert_eq!(tx.ex_rate, Decimal::ONE);
        assert_eq!(tx.amount_czk, dec!(-1000.005));
        assert!(source.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_crypto_revenue_is_unvalued() {
        let source = CountingSource::new(rates());
        let reward = DraftTransaction::new(
            "2024-03-15",
            "ETH",
            TransactionKind::Revenue,
            ProductKind::Crypto,
        )
        .with_quantity(dec!(0.01))
        .with_amount(dec!(30), "USD");
        let outcome = normalizer(source)
            .normalize(Provider::Coinbase, vec![reward.into()])
            .await;
        let tx = &outcome.transactions[0];
        assert_eq!(tx.ex_rate, Decimal::ONE);
        assert_eq!(tx.amount_czk, Decimal::ZERO);
        assert_eq!(tx.amount_cur, dec!(30));
    }

    #[tokio::test]
    async fn test_prefetch_once_with_fee_currencies() {
        let source = CountingSource::new(rates());
        let records = vec![
            ParsedRecord::with_fee(
                buy("USD", dec!(-100)),
                Some(FeeInKind::new(dec!(1), "EUR")),
            ),
            buy("USD", dec!(-200)).into(),
            buy("CZK", dec!(-300)).into(),
        ];
        let outcome = normalizer(source.clone())
            .normalize(Provider::Trading212, records)
            .await;

        let batches = source.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![RateKey::new(date(15), "USD"), RateKey::new(date(15), "EUR")]
        );
        assert_eq!(outcome.transactions.len(), 3);
        assert_eq!(outcome.transactions[0].fees, dec!(25.05));
        assert_eq!(outcome.transactions[1].fees, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_currency_defaults_and_keeps_batch() {
        let source = CountingSource::new(rates());
        let records = vec![
            buy("USD", dec!(-100)).into(),
            buy("XXX", dec!(-50)).into(),
            buy("EUR", dec!(-10)).into(),
        ];
        let outcome = normalizer(source)
            .normalize(Provider::Revolut, records)
            .await;

        assert_eq!(outcome.dropped, 0);
        let txs = &outcome.transactions;
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].amount_czk, dec!(-2310.50));
        assert_eq!(txs[1].ex_rate, Decimal::ONE);
        assert_eq!(txs[1].amount_czk, dec!(-50));
        assert_eq!(txs[2].amount_czk, dec!(-250.50));
    }

    #[tokio::test]
    async fn test_bad_records_are_dropped_in_order() {
        let source = CountingSource::new(rates());
        let mut bad_date = buy("USD", dec!(-1));
        bad_date.date = "sometime".to_string();
        let mut no_symbol = buy("USD", dec!(-2));
        no_symbol.symbol = "  ".to_string();
        let records = vec![
            bad_date.into(),
            buy("USD", dec!(-3)).into(),
            no_symbol.into(),
            buy("EUR", dec!(-4)).into(),
        ];
        let outcome = normalizer(source)
            .normalize(Provider::Ibkr, records)
            .await;
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].amount_cur, dec!(-3));
        assert_eq!(outcome.transactions[1].currency, "EUR");
    }

    #[tokio::test]
    async fn test_shared_cache_is_reused() {
        let source = CountingSource::new(rates());
        let normalizer = normalizer(source.clone());
        let cache = RateCache::new();
        normalizer
            .normalize_with_cache(&cache, Provider::Ibkr, vec![buy("USD", dec!(-1)).into()])
            .await;
        normalizer
            .normalize_with_cache(&cache, Provider::Ibkr, vec![buy("USD", dec!(-1)).into()])
            .await;
        assert_eq!(source.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_commission_is_valued_in_home_currency() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 2).unwrap();
        let source = CountingSource::new(RateTable::from_rates([("USD", day, dec!(23))]));
        let content = ImportContent::Text(
            "2024-12-02 U1234567 APPLE INC Buy AAPL 10 150.00 USD -1,500.00 -25.00 34,500.00"
                .to_string(),
        );
        let records = parser_for(Provider::Ibkr)
            .parse(&content, &ParseContext::default())
            .unwrap();

        let outcome = normalizer(source.clone())
            .normalize(Provider::Ibkr, records)
            .await;

        let tx = &outcome.transactions[0];
        assert_eq!(tx.currency, "CZK");
        assert_eq!(tx.amount_czk, dec!(-34500.00));
        assert_eq!(tx.fees, dec!(575.00));
        assert_eq!(
            source.batches.lock().unwrap()[0],
            vec![RateKey::new(day, "USD")]
        );
    }

    #[test]
    fn test_round_home_midpoints() {
        assert_eq!(round_home(dec!(2.345)), dec!(2.35));
        assert_eq!(round_home(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_home(dec!(2.344)), dec!(2.34));
    }
}
