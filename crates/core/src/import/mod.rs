//! Import pipeline: content model, errors, service and persistence seam.

mod import_errors;
mod import_model;
mod import_service;
mod import_traits;


pub use import_errors::ContentError;
pub use import_model::{
    ContentShape, ImportContent, ImportPreview, ImportReport, ImportSettings, Provider, Sheet,
    Workbook,
};
pub use import_service::ImportService;
pub use import_traits::{ImportServiceTrait, TransactionSink};
