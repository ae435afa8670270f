use std::path::PathBuf;

use async_trait::async_trait;
use ledgerly_core::errors::{Error, Result};
use ledgerly_core::transactions::StagedTransaction;
use ledgerly_core::TransactionSink;
use tracing::info;

/// Writes each batch as a pretty-printed JSON array.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransactionSink for JsonFileSink {
    async fn save_batch(&self, transactions: &[StagedTransaction]) -> Result<usize> {
        let json = serde_json::to_vec_pretty(transactions)
            .map_err(|e| Error::Sink(format!("Cannot serialize batch: {}", e)))?;
        tokio::fs::write(&self.path, json).await?;
        info!("Wrote {} transactions to {}", transactions.len(), self.path.display());
        Ok(transactions.len())
    }
}
