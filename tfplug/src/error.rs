//! Framework errors
//!
//! Handlers never surface these directly: the server and the handlers turn
//! them into [`crate::types::Diagnostic`]s at the boundary.

#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("Provider not configured")]
    ProviderNotConfigured,

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Invalid attribute path: {0}")]
    InvalidPath(String),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, TfplugError>;
