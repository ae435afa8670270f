use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use super::import_model::{ImportContent, ImportPreview, ImportReport, Provider};
use super::import_traits::{ImportServiceTrait, TransactionSink};
use crate::errors::{Error, Result};
use crate::fx::RateResolver;
use crate::normalizer::Normalizer;
use crate::parsers::{parser_for, ParseContext};
use crate::recognition::{provider_tag, Recognizer};
use crate::transactions::assign_import_keys;

/// Recognizer → parser → normalizer → import keys → sink.
pub struct ImportService {
    recognizer: Recognizer,
    normalizer: Normalizer,
    sink: Arc<dyn TransactionSink>,
}

impl ImportService {
    pub fn new(resolver: Arc<RateResolver>, sink: Arc<dyn TransactionSink>) -> Self {
        Self {
            recognizer: Recognizer::new(),
            normalizer: Normalizer::new(resolver),
            sink,
        }
    }

    fn recognize(&self, content: &ImportContent, filename: &str) -> Result<Provider> {
        let provider = self.recognizer.identify(content, filename);
        match provider {
            Some(provider) => {
                info!("{} recognized as {}", filename, provider_tag(Some(provider)));
                Ok(provider)
            }
            None => Err(Error::UnknownProvider(filename.to_string())),
        }
    }
}

#[async_trait]
impl ImportServiceTrait for ImportService {
    fn identify(&self, content: &ImportContent, filename: &str) -> Option<Provider> {
        self.recognizer.identify(content, filename)
    }

    async fn preview(&self, content: &ImportContent, filename: &str) -> Result<ImportPreview> {
        let provider = self.recognize(content, filename)?;
        let ctx = ParseContext::new(self.normalizer.home_currency());
        let records = parser_for(provider).parse(content, &ctx)?;
        let parsed = records.len();

        let outcome = self.normalizer.normalize(provider, records).await;
        Ok(ImportPreview {
            provider,
            parsed,
            dropped: outcome.dropped,
            transactions: assign_import_keys(outcome.transactions),
        })
    }

    async fn import(&self, content: &ImportContent, filename: &str) -> Result<ImportReport> {
        let preview = self.preview(content, filename).await?;
        let saved = if preview.transactions.is_empty() {
            0
        } else {
            self.sink.save_batch(&preview.transactions).await?
        };

        let report = ImportReport {
            provider: preview.provider,
            parsed: preview.parsed,
            normalized: preview.transactions.len(),
            dropped: preview.dropped,
            saved,
        };
        info!(
            "Imported {}: parsed {}, normalized {}, dropped {}, saved {}",
            report.provider, report.parsed, report.normalized, report.dropped, report.saved
        );
        Ok(report)
    }
}
