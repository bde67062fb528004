//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings and static mock routes
//! - `chaos`: Fault-injection scenarios
//! - `recording`: Traffic capture, filters and storage
//! - `replay`: Replay defaults

mod chaos;
mod recording;
mod replay;
mod server;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use chaos::{ChaosConfig, ScenarioConfig};
pub use recording::{
    RecordingConfig, RecordingFilterConfig, StorageConfig, StorageFormat, StorageType,
};
pub use replay::ReplayAppConfig;
pub use server::{MockRouteConfig, ServerConfig};

use crate::telemetry::TelemetryConfig;

/// Environment variable prefix, e.g. `MOCKWARDEN_SERVER__PORT`
pub const ENV_PREFIX: &str = "MOCKWARDEN";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MOCKWARDEN_CONFIG";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Chaos scenarios
    #[serde(default)]
    pub chaos: ChaosConfig,

    /// Traffic recording
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Replay defaults
    #[serde(default)]
    pub replay: ReplayAppConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    ///
    /// The file is taken from `MOCKWARDEN_CONFIG` when set, otherwise an
    /// optional `config.{toml,yaml,json}` in the working directory is used.
    pub fn load() -> Result<Self, config::ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load_from(Some(Path::new(&path))),
            _ => Self::load_from(None),
        }
    }

    /// Load configuration from an explicit file (required) or the default
    /// optional `config` file, then apply environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., MOCKWARDEN_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
