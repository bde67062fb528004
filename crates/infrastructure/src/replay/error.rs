//! Replay errors

use application::error::ApplicationError;
use thiserror::Error;

/// Batch-level replay failures
///
/// Failures of individual requests are counted in the stats, never raised.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("No recordings loaded for replay")]
    NoRecordings,

    #[error("Invalid replay configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("A replay is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Storage(#[from] ApplicationError),

    #[error("Not supported: {0}")]
    NotSupported(String),
}
