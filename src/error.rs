//! Error types for the sticker pack query engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// A configured field path located a value the indexer cannot coerce
    #[error("Unsupported value type at '{path}': {kind}")]
    UnsupportedValueType { path: String, kind: &'static str },

    /// A clause references an attribute with no registered index
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SearchError {
    /// Short machine-readable code, used by the CLI when reporting failures
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::UnsupportedValueType { .. } => "unsupported_value_type",
            SearchError::UnknownAttribute(_) => "unknown_attribute",
            SearchError::Serialize(_) => "serialize_failed",
        }
    }
}
