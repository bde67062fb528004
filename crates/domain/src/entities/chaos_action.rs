//! Chaos action handed from the decision step to the apply step

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form scenario parameters as they appear in configuration
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A decision to inject a fault into one exchange
///
/// Produced by the decision call and consumed by a separate apply call.
/// The scenario is referenced by name, so a scenario reload between the two
/// calls can leave the action pointing at a scenario that no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosAction {
    /// Injector type, e.g. `latency` or `error`
    #[serde(rename = "type")]
    pub action_type: String,
    /// Name of the scenario that produced the action
    pub scenario: String,
    /// Injector parameters copied from the scenario
    #[serde(default)]
    pub parameters: Parameters,
    /// When the decision was taken
    pub timestamp: DateTime<Utc>,
}

impl ChaosAction {
    /// Create an action stamped with the current time
    pub fn new(
        action_type: impl Into<String>,
        scenario: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self {
            action_type: action_type.into(),
            scenario: scenario.into(),
            parameters,
            timestamp: Utc::now(),
        }
    }
}
