//! Recording engine errors

use application::error::ApplicationError;
use thiserror::Error;

/// Errors raised by the recording engine
#[derive(Debug, Error)]
pub enum RecordingError {
    /// A filter definition could not be turned into a filter
    #[error("Invalid filter configuration: {0}")]
    InvalidFilter(String),

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] ApplicationError),
}
