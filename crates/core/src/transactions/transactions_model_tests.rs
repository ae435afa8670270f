//! Tests for transaction models.

#[cfg(test)]
mod tests {
    use crate::transactions::transactions_model::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample() -> CanonicalTransaction {
        CanonicalTransaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            id: "AAPL".to_string(),
            amount: dec!(10),
            price: Some(dec!(150)),
            amount_cur: dec!(-1500),
            currency: "USD".to_string(),
            ex_rate: dec!(23.1),
            amount_czk: dec!(-34650),
            platform: "Interactive Brokers".to_string(),
            product_type: ProductKind::Stock,
            trans_type: TransactionKind::Buy,
            fees: dec!(0),
            notes: String::new(),
            isin: Some("US0378331005".to_string()),
            company_name: None,
        }
    }

    #[test]
    fn test_kind_serialization_uses_display_vocabulary() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::CorporateAction).unwrap(),
            r#""Corporate Action""#
        );
        assert_eq!(serde_json::to_string(&ProductKind::Fx).unwrap(), r#""FX""#);
        assert_eq!(TransactionKind::Withdrawal.to_string(), "Withdrawal");
    }

    #[test]
    fn test_kind_from_str_case_insensitive() {
        assert_eq!("buy".parse::<TransactionKind>(), Ok(TransactionKind::Buy));
        assert_eq!(
            "corporate action".parse::<TransactionKind>(),
            Ok(TransactionKind::CorporateAction)
        );
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_canonical_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["date"], json!("2024-03-15"));
        assert_eq!(value["id"], json!("AAPL"));
        assert_eq!(value["amount_cur"], json!(-1500.0));
        assert_eq!(value["amount_czk"], json!(-34650.0));
        assert_eq!(value["trans_type"], json!("Buy"));
        assert_eq!(value["product_type"], json!("Stock"));
        assert_eq!(value["company_name"], json!(null));
    }

    #[test]
    fn test_staged_transaction_flattens() {
        let staged = StagedTransaction {
            import_key: "abc".to_string(),
            transaction: sample(),
        };
        let value = serde_json::to_value(&staged).unwrap();
        assert_eq!(value["import_key"], json!("abc"));
        assert_eq!(value["platform"], json!("Interactive Brokers"));
    }

    #[test]
    fn test_fee_side_channel_drops_zero_fee() {
        let draft = DraftTransaction::new("2024-03-15", "BTC", TransactionKind::Buy, ProductKind::Crypto);
        let record = ParsedRecord::with_fee(draft.clone(), Some(FeeInKind::new(dec!(0), "EUR")));
        assert!(record.fee_in_kind.is_none());

        let record = ParsedRecord::with_fee(draft, Some(FeeInKind::new(dec!(-1.5), "EUR")));
        assert_eq!(record.fee_in_kind.unwrap().amount, dec!(1.5));
    }

    #[test]
    fn test_draft_builder_filters_blank_isin() {
        let draft = DraftTransaction::new("2024-03-15", "AAPL", TransactionKind::Buy, ProductKind::Stock)
            .with_isin(Some("  ".to_string()))
            .with_company_name(Some("Apple Inc.".to_string()));
        assert!(draft.isin.is_none());
        assert_eq!(draft.company_name.as_deref(), Some("Apple Inc."));
    }
}
