//! Infrastructure layer - Engines and adapters
//!
//! Implements the ports defined in the application layer and hosts the
//! chaos, recording and replay engines together with configuration and
//! logging setup.

pub mod chaos;
pub mod config;
pub mod persistence;
pub mod recording;
pub mod replay;
pub mod telemetry;

pub use chaos::{ChaosEngine, ChaosError, EngineStats, InjectorRegistry, LoadReport};
pub use config::{AppConfig, RecordingConfig, ScenarioConfig, ServerConfig, StorageConfig};
pub use persistence::{FileStorage, MemoryStorage, create_storage};
pub use recording::{RecordingEngine, RecordingError, RecordingStats};
pub use replay::{ReplayConfig, ReplayError, ReplayManager, ReplayStats, Replayer};
pub use telemetry::{TelemetryConfig, init_tracing};
