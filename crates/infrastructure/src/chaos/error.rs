//! Chaos engine errors

use thiserror::Error;

/// Errors raised while loading scenarios or injecting faults
#[derive(Debug, Error)]
pub enum ChaosError {
    /// Scenario definition is incomplete or out of range
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// No injector is registered for the scenario type
    #[error("Unknown injector type: {0}")]
    UnknownInjector(String),

    /// Injector rejected its parameters
    #[error("Invalid parameters for {injector} injector: {reason}")]
    InvalidParameters { injector: String, reason: String },

    /// Endpoint pattern could not be compiled
    #[error("Invalid endpoint pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The action refers to a scenario that is no longer loaded
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}

impl ChaosError {
    /// Create an invalid parameters error
    pub fn invalid_parameters(injector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            injector: injector.into(),
            reason: reason.into(),
        }
    }
}
