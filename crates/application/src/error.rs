//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend failure (I/O, index corruption)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encoding or decoding of a stored document failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation is not supported by this component
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl ApplicationError {
    /// Check if this error means the entity is missing
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Domain(DomainError::NotFound { .. })
        )
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ApplicationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
