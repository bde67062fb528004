//! Chaos scenario configuration.

use domain::Parameters;
use serde::{Deserialize, Serialize};

/// Chaos section of the application config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Scenarios loaded at startup, evaluated in declaration order
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

/// Definition of a single chaos scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Unique scenario name
    #[serde(default)]
    pub name: String,

    /// Injector type (`latency`, `error`)
    #[serde(rename = "type", default)]
    pub scenario_type: String,

    /// Endpoint glob patterns (`*` matches any sequence)
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Probability of applying the scenario to a matching request (0.0-1.0)
    #[serde(default)]
    pub probability: f64,

    /// Injector-specific parameters
    #[serde(default)]
    pub parameters: Parameters,
}

impl ScenarioConfig {
    /// Create a scenario definition
    pub fn new(
        name: impl Into<String>,
        scenario_type: impl Into<String>,
        endpoints: Vec<String>,
        probability: f64,
    ) -> Self {
        Self {
            name: name.into(),
            scenario_type: scenario_type.into(),
            endpoints,
            probability,
            parameters: Parameters::new(),
        }
    }

    /// Set a single parameter
    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: serde_json::Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}
