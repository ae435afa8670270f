use thiserror::Error;

use super::import_model::{ContentShape, Provider};

/// Whole-file content problems. Any of these aborts the import of that file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("{0} content is empty")]
    Empty(ContentShape),

    #[error("{provider} statements cannot be read from {shape} content")]
    UnsupportedShape {
        provider: Provider,
        shape: ContentShape,
    },

    #[error("No file extension maps to a content shape: {0}")]
    UnknownExtension(String),

    #[error("Malformed content: {0}")]
    Malformed(String),
}
