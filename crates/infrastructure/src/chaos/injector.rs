//! Injector trait and registry

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use application::ports::Exchange;
use async_trait::async_trait;
use domain::Parameters;
use serde_json::Value;

use super::{ChaosError, ErrorInjector, LatencyInjector};

/// A single fault type
///
/// Injectors are shared across concurrent requests, so any internal state
/// (e.g. a random source) must be synchronized.
#[async_trait]
pub trait Injector: Send + Sync + fmt::Debug {
    /// Type name used by scenario definitions
    fn injector_type(&self) -> &'static str;

    /// Check scenario parameters at load time
    fn validate(&self, params: &Parameters) -> Result<(), ChaosError>;

    /// Apply the fault to an in-flight exchange
    async fn inject(
        &self,
        exchange: &mut dyn Exchange,
        params: &Parameters,
    ) -> Result<(), ChaosError>;
}

/// Injectors keyed by type name
#[derive(Debug, Clone, Default)]
pub struct InjectorRegistry {
    injectors: HashMap<String, Arc<dyn Injector>>,
}

impl InjectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `latency` and `error` injectors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LatencyInjector::new()));
        registry.register(Arc::new(ErrorInjector::new()));
        registry
    }

    /// Register an injector under its type name, returning any replaced one
    pub fn register(&mut self, injector: Arc<dyn Injector>) -> Option<Arc<dyn Injector>> {
        self.injectors
            .insert(injector.injector_type().to_string(), injector)
    }

    /// Look up an injector by type name
    pub fn get(&self, injector_type: &str) -> Option<Arc<dyn Injector>> {
        self.injectors.get(injector_type).cloned()
    }

    /// Registered type names, sorted
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.injectors.keys().cloned().collect();
        types.sort();
        types
    }
}

/// Read a duration parameter
///
/// Strings use humantime syntax (`100ms`, `2s`, `1m30s`); bare non-negative
/// numbers are taken as milliseconds.
pub(crate) fn duration_param(
    params: &Parameters,
    key: &str,
    injector: &str,
) -> Result<Duration, ChaosError> {
    match params.get(key) {
        None | Some(Value::Null) => Err(ChaosError::invalid_parameters(
            injector,
            format!("{key} is required"),
        )),
        Some(Value::String(s)) => humantime::parse_duration(s.trim()).map_err(|e| {
            ChaosError::invalid_parameters(injector, format!("{key}: invalid duration '{s}': {e}"))
        }),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(ms) => Ok(Duration::from_millis(ms)),
            None => Err(ChaosError::invalid_parameters(
                injector,
                format!("{key}: must be a non-negative whole number of milliseconds"),
            )),
        },
        Some(other) => Err(ChaosError::invalid_parameters(
            injector,
            format!("{key}: expected a duration string, got {other}"),
        )),
    }
}
