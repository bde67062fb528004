//! Replay defaults.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::replay::ReplayConfig;

/// Default replay settings, overridable per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayAppConfig {
    /// Maximum number of in-flight replayed requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between launching two requests in milliseconds
    #[serde(default)]
    pub delay_between_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Send to the target host instead of the recorded URI
    #[serde(default = "super::default_true")]
    pub replace_host: bool,

    /// If non-empty, only these recorded headers are replayed
    #[serde(default)]
    pub preserve_headers: Vec<String>,

    /// Headers forced onto every replayed request
    #[serde(default)]
    pub override_headers: BTreeMap<String, String>,
}

const fn default_concurrency() -> usize {
    10
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ReplayAppConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_between_ms: 0,
            timeout_secs: default_timeout_secs(),
            replace_host: true,
            preserve_headers: Vec::new(),
            override_headers: BTreeMap::new(),
        }
    }
}

impl ReplayAppConfig {
    /// Convert to a `ReplayConfig` for a run against `target_url`
    #[must_use]
    pub fn to_replay_config(&self, target_url: impl Into<String>) -> ReplayConfig {
        ReplayConfig {
            target_url: target_url.into(),
            concurrency: self.concurrency,
            delay_between: Duration::from_millis(self.delay_between_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            replace_host: self.replace_host,
            preserve_headers: self.preserve_headers.clone(),
            override_headers: self.override_headers.clone(),
        }
    }
}
