//! Chaos engine statistics snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engine-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Whether any scenario is loaded
    pub enabled: bool,
    /// Number of chaos decisions taken
    pub total_requests: u64,
    /// Injections that completed successfully
    pub injections_applied: u64,
    /// Injections that failed or referred to a stale scenario
    pub injections_failed: u64,
    /// Wall time spent inside injectors (milliseconds)
    pub total_injection_time_ms: u64,
    /// Number of loaded scenarios
    pub scenario_count: usize,
    /// Per-scenario breakdown, in declaration order
    pub scenarios: Vec<ScenarioStats>,
}

/// Statistics for one loaded scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub name: String,
    #[serde(rename = "type")]
    pub scenario_type: String,
    pub probability: f64,
    pub endpoints: Vec<String>,
    pub applied_count: u64,
    pub failed_count: u64,
    pub last_applied: Option<DateTime<Utc>>,
}

