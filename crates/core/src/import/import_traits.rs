use async_trait::async_trait;

use super::import_model::{ImportContent, ImportPreview, ImportReport, Provider};
use crate::errors::Result;
use crate::transactions::StagedTransaction;

/// Persistence collaborator receiving one batch per import.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Save a batch and return how many records were stored.
    async fn save_batch(&self, transactions: &[StagedTransaction]) -> Result<usize>;
}

/// Statement import pipeline.
#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    fn identify(&self, content: &ImportContent, filename: &str) -> Option<Provider>;

    async fn preview(&self, content: &ImportContent, filename: &str) -> Result<ImportPreview>;

    async fn import(&self, content: &ImportContent, filename: &str) -> Result<ImportReport>;
}
