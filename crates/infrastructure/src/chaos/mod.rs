//! Chaos engineering engine for resilience testing of API clients.
//!
//! Injects faults into live exchanges so that clients of the mock server
//! can be exercised against slow and failing upstreams.
//!
//! # Overview
//!
//! The chaos engine consists of:
//! - `EndpointMatcher`: Glob-style (`*`) endpoint patterns
//! - `Injector`: One fault type (`LatencyInjector`, `ErrorInjector`), looked up by
//!   type name in an `InjectorRegistry`
//! - `ChaosEngine`: The hot-swappable scenario set, the per-request decision and
//!   the apply step, plus statistics
//!
//! # Example
//!
//! ```ignore
//! use infrastructure::chaos::ChaosEngine;
//! use infrastructure::config::ScenarioConfig;
//!
//! let engine = ChaosEngine::new();
//! engine.load_scenarios(&[ScenarioConfig::new("boom", "error", vec!["/api/*".into()], 0.3)
//!     .with_parameter("error_codes", serde_json::json!([503]))]);
//!
//! if let Some(action) = engine.should_apply_chaos(exchange.path()) {
//!     if let Err(e) = engine.apply_chaos(&action, &mut exchange).await {
//!         // fall back to normal handling
//!     }
//! }
//! ```

mod engine;
mod error;
mod http_error;
mod injector;
mod latency;
mod matcher;
mod stats;

pub use engine::{ChaosEngine, ChaosScenario, LoadReport, SkippedScenario};
pub use error::ChaosError;
pub use http_error::ErrorInjector;
pub use injector::{Injector, InjectorRegistry};
pub use latency::LatencyInjector;
pub use matcher::EndpointMatcher;
pub use stats::{EngineStats, ScenarioStats};
