//! Per-batch import keys.
//!
//! A key is a fingerprint of a record's semantic content, so re-importing the
//! same statement yields the same keys. Records that are genuinely identical
//! within one batch (two fills at the same price on the same day) get their
//! occurrence index mixed in so every key in a batch is unique.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::transactions_model::{CanonicalTransaction, StagedTransaction};

/// Computes the base fingerprint of a canonical record.
///
/// The hash covers:
/// - platform
/// - transaction kind and product kind
/// - date
/// - instrument identifier
/// - quantity, unit price, transaction-currency amount
/// - currency
/// - notes (whitespace-collapsed)
pub fn compute_import_key(tx: &CanonicalTransaction) -> String {
    fingerprint(tx, 0)
}

fn fingerprint(tx: &CanonicalTransaction, occurrence: usize) -> String {
    let mut hasher = Sha256::new();

    hasher.update(tx.platform.as_bytes());
    hasher.update(b"|");
    hasher.update(tx.trans_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(tx.product_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(tx.date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(tx.id.as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(tx.amount).as_bytes());
    hasher.update(b"|");
    if let Some(price) = tx.price {
        hasher.update(normalize_decimal(price).as_bytes());
    }
    hasher.update(b"|");
    hasher.update(normalize_decimal(tx.amount_cur).as_bytes());
    hasher.update(b"|");
    hasher.update(tx.currency.as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_notes(&tx.notes).as_bytes());

    // First occurrence keeps the plain fingerprint
    if occurrence > 0 {
        hasher.update(b"|#");
        hasher.update(occurrence.to_string().as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Attach an import key to every record, unique within the batch.
pub fn assign_import_keys(transactions: Vec<CanonicalTransaction>) -> Vec<StagedTransaction> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(transactions.len());

    transactions
        .into_iter()
        .map(|transaction| {
            let base = compute_import_key(&transaction);
            let occurrence = seen.entry(base.clone()).or_insert(0);
            let import_key = if *occurrence == 0 {
                base
            } else {
                fingerprint(&transaction, *occurrence)
            };
            *occurrence += 1;
            StagedTransaction {
                import_key,
                transaction,
            }
        })
        .collect()
}

/// Remove trailing zeros for consistent hashing
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

fn normalize_notes(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
