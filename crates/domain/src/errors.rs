//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Recording identifier is not a UUID
    #[error("Invalid recording id: {0}")]
    InvalidRecordingId(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error_message_is_correct() {
        let err = DomainError::not_found("Recording", "123");
        assert_eq!(err.to_string(), "Recording not found: 123");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("probability out of range".to_string());
        assert_eq!(
            err.to_string(),
            "Validation failed: probability out of range"
        );
    }

    #[test]
    fn invalid_recording_id_message() {
        let err = DomainError::InvalidRecordingId("abc".to_string());
        assert_eq!(err.to_string(), "Invalid recording id: abc");
    }
}
