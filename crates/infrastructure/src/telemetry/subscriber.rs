//! Tracing subscriber initialization and configuration

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging/tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter used when `RUST_LOG` is not set
    /// (e.g., "info", "mockwarden=debug,tower_http=info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit structured JSON logs instead of human-readable lines
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info,tower_http=info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

/// Error type for tracing initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(json = config.json, filter = %config.log_filter, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = TelemetryConfig::default();
        assert!(!config.json);
        assert_eq!(config.log_filter, "info,tower_http=info");
    }

    #[test]
    fn config_defaults_when_fields_missing() {
        let parsed: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(parsed.json);
        assert_eq!(parsed.log_filter, "info,tower_http=info");
    }

    #[test]
    fn second_init_fails() {
        let config = TelemetryConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(TelemetryError::Init(_))));
    }
}
