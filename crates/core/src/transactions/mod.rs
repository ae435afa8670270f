//! Transactions module - draft and canonical records, import keys.

mod idempotency;
mod transactions_constants;
mod transactions_model;

#[cfg(test)]
mod transactions_model_tests;

pub use idempotency::{assign_import_keys, compute_import_key};
pub use transactions_constants::*;
pub use transactions_model::{
    CanonicalTransaction, DraftTransaction, FeeInKind, ParsedRecord, ProductKind,
    StagedTransaction, TransactionKind,
};
