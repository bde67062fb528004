//! Application state shared across handlers

use std::sync::Arc;

use infrastructure::{AppConfig, ChaosEngine, RecordingEngine};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fault injection engine
    pub chaos: Arc<ChaosEngine>,
    /// Traffic capture engine
    pub recording: Arc<RecordingEngine>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, chaos: Arc<ChaosEngine>, recording: Arc<RecordingEngine>) -> Self {
        Self {
            chaos,
            recording,
            config: Arc::new(config),
        }
    }
}
