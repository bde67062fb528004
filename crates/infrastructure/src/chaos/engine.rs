//! Scenario set, chaos decision and fault application.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Instant,
};

use application::ports::{CHAOS_APPLIED_KEY, CHAOS_SCENARIO_KEY, Exchange};
use chrono::{DateTime, Utc};
use domain::{ChaosAction, Parameters};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    ChaosError, EndpointMatcher, EngineStats, Injector, InjectorRegistry, ScenarioStats,
};
use crate::config::ScenarioConfig;

/// A validated, loaded scenario
#[derive(Debug)]
pub struct ChaosScenario {
    name: String,
    scenario_type: String,
    probability: f64,
    parameters: Parameters,
    matcher: EndpointMatcher,
    injector: Arc<dyn Injector>,
    applied_count: AtomicU64,
    failed_count: AtomicU64,
    last_applied: RwLock<Option<DateTime<Utc>>>,
}

impl ChaosScenario {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scenario_type(&self) -> &str {
        &self.scenario_type
    }

    pub const fn probability(&self) -> f64 {
        self.probability
    }

    pub fn endpoints(&self) -> &[String] {
        self.matcher.patterns()
    }

    /// Whether the scenario targets the endpoint
    pub fn matches(&self, endpoint: &str) -> bool {
        self.matcher.matches(endpoint)
    }

    fn stats(&self) -> ScenarioStats {
        ScenarioStats {
            name: self.name.clone(),
            scenario_type: self.scenario_type.clone(),
            probability: self.probability,
            endpoints: self.matcher.patterns().to_vec(),
            applied_count: self.applied_count.load(Ordering::Relaxed),
            failed_count: self.failed_count.load(Ordering::Relaxed),
            last_applied: *self.last_applied.read(),
        }
    }
}

/// A scenario rejected during loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedScenario {
    pub name: String,
    pub reason: String,
}

/// Outcome of [`ChaosEngine::load_scenarios`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names of the scenarios now active, in declaration order
    pub loaded: Vec<String>,
    /// Scenarios that were rejected
    pub skipped: Vec<SkippedScenario>,
}

/// Chaos engine
///
/// Holds the active scenario set behind a lock so it can be replaced while
/// requests are in flight. Decisions evaluate scenarios in declaration order
/// and pick the first one that targets the endpoint and wins its probability
/// roll.
#[derive(Debug)]
pub struct ChaosEngine {
    registry: InjectorRegistry,
    scenarios: RwLock<Vec<Arc<ChaosScenario>>>,
    enabled: AtomicBool,
    rng: Mutex<StdRng>,
    total_requests: AtomicU64,
    injections_applied: AtomicU64,
    injections_failed: AtomicU64,
    injection_time_ns: AtomicU64,
}

impl Default for ChaosEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChaosEngine {
    /// Create a disabled engine with the built-in injectors
    pub fn new() -> Self {
        Self::with_registry(InjectorRegistry::with_defaults())
    }

    /// Create a disabled engine with a custom injector registry
    pub fn with_registry(registry: InjectorRegistry) -> Self {
        Self {
            registry,
            scenarios: RwLock::new(Vec::new()),
            enabled: AtomicBool::new(false),
            rng: Mutex::new(StdRng::from_os_rng()),
            total_requests: AtomicU64::new(0),
            injections_applied: AtomicU64::new(0),
            injections_failed: AtomicU64::new(0),
            injection_time_ns: AtomicU64::new(0),
        }
    }

    /// Create an engine whose decisions are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::new().seeded(seed)
    }

    /// Reseed the decision random source
    #[must_use]
    pub fn seeded(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the active scenario set
    ///
    /// Invalid scenarios are skipped with a warning; a later scenario reusing
    /// a loaded name is skipped as well. The engine is enabled iff at least
    /// one scenario was loaded.
    pub fn load_scenarios(&self, configs: &[ScenarioConfig]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut scenarios = Vec::with_capacity(configs.len());
        let mut seen = HashSet::new();

        for config in configs {
            let built = if seen.contains(config.name.as_str()) {
                Err(ChaosError::InvalidScenario(format!(
                    "duplicate scenario name '{}'",
                    config.name
                )))
            } else {
                self.build_scenario(config)
            };

            match built {
                Ok(scenario) => {
                    seen.insert(config.name.as_str());
                    debug!(
                        scenario = %scenario.name,
                        scenario_type = %scenario.scenario_type,
                        probability = scenario.probability,
                        "Loaded chaos scenario"
                    );
                    report.loaded.push(scenario.name.clone());
                    scenarios.push(Arc::new(scenario));
                },
                Err(e) => {
                    warn!(scenario = %config.name, error = %e, "Skipping chaos scenario");
                    report.skipped.push(SkippedScenario {
                        name: config.name.clone(),
                        reason: e.to_string(),
                    });
                },
            }
        }

        let enabled = !scenarios.is_empty();
        *self.scenarios.write() = scenarios;
        self.enabled.store(enabled, Ordering::SeqCst);

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            enabled,
            "Chaos scenarios loaded"
        );
        report
    }

    fn build_scenario(&self, config: &ScenarioConfig) -> Result<ChaosScenario, ChaosError> {
        if config.name.trim().is_empty() {
            return Err(ChaosError::InvalidScenario(
                "scenario name is required".to_string(),
            ));
        }
        if config.scenario_type.trim().is_empty() {
            return Err(ChaosError::InvalidScenario(format!(
                "{}: scenario type is required",
                config.name
            )));
        }
        if !(0.0..=1.0).contains(&config.probability) {
            return Err(ChaosError::InvalidScenario(format!(
                "{}: probability {} is outside [0, 1]",
                config.name, config.probability
            )));
        }

        let injector = self
            .registry
            .get(&config.scenario_type)
            .ok_or_else(|| ChaosError::UnknownInjector(config.scenario_type.clone()))?;
        injector.validate(&config.parameters)?;
        let matcher = EndpointMatcher::new(&config.endpoints)?;

        Ok(ChaosScenario {
            name: config.name.clone(),
            scenario_type: config.scenario_type.clone(),
            probability: config.probability,
            parameters: config.parameters.clone(),
            matcher,
            injector,
            applied_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            last_applied: RwLock::new(None),
        })
    }

    fn roll(&self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.lock().random::<f64>() < probability
    }

    /// Decide whether chaos applies to an endpoint
    ///
    /// Returns the action for the first matching scenario that wins its roll.
    pub fn should_apply_chaos(&self, endpoint: &str) -> Option<ChaosAction> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !self.is_enabled() {
            return None;
        }

        let scenarios = self.scenarios.read();
        scenarios
            .iter()
            .find(|s| s.matches(endpoint) && self.roll(s.probability))
            .map(|s| {
                ChaosAction::new(
                    s.scenario_type.clone(),
                    s.name.clone(),
                    s.parameters.clone(),
                )
            })
    }

    fn scenario(&self, name: &str) -> Option<Arc<ChaosScenario>> {
        self.scenarios
            .read()
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// Apply a previously decided action to the exchange
    ///
    /// On success the exchange is marked with the applied scenario. Fails with
    /// [`ChaosError::ScenarioNotFound`] if the scenario was unloaded since the
    /// decision; the caller should then continue with normal handling.
    pub async fn apply_chaos(
        &self,
        action: &ChaosAction,
        exchange: &mut dyn Exchange,
    ) -> Result<(), ChaosError> {
        let Some(scenario) = self.scenario(&action.scenario) else {
            self.injections_failed.fetch_add(1, Ordering::Relaxed);
            warn!(scenario = %action.scenario, "Chaos scenario no longer loaded");
            return Err(ChaosError::ScenarioNotFound(action.scenario.clone()));
        };

        let started = Instant::now();
        let result = scenario.injector.inject(exchange, &action.parameters).await;
        let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.injection_time_ns.fetch_add(elapsed, Ordering::Relaxed);

        match result {
            Ok(()) => {
                scenario.applied_count.fetch_add(1, Ordering::Relaxed);
                *scenario.last_applied.write() = Some(Utc::now());
                self.injections_applied.fetch_add(1, Ordering::Relaxed);
                exchange.set_value(CHAOS_APPLIED_KEY, Value::Bool(true));
                exchange.set_value(CHAOS_SCENARIO_KEY, Value::String(scenario.name.clone()));
                debug!(
                    scenario = %scenario.name,
                    path = %exchange.path(),
                    "Chaos applied"
                );
                Ok(())
            },
            Err(e) => {
                scenario.failed_count.fetch_add(1, Ordering::Relaxed);
                self.injections_failed.fetch_add(1, Ordering::Relaxed);
                warn!(scenario = %scenario.name, error = %e, "Chaos injection failed");
                Err(e)
            },
        }
    }

    /// Whether any scenario is active
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Names of the active scenarios in declaration order
    pub fn active_scenarios(&self) -> Vec<String> {
        self.scenarios.read().iter().map(|s| s.name.clone()).collect()
    }

    /// Statistics snapshot
    pub fn stats(&self) -> EngineStats {
        let scenarios: Vec<ScenarioStats> =
            self.scenarios.read().iter().map(|s| s.stats()).collect();
        EngineStats {
            enabled: self.is_enabled(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            injections_applied: self.injections_applied.load(Ordering::Relaxed),
            injections_failed: self.injections_failed.load(Ordering::Relaxed),
            total_injection_time_ms: self.injection_time_ns.load(Ordering::Relaxed) / 1_000_000,
            scenario_count: scenarios.len(),
            scenarios,
        }
    }

    /// Unload all scenarios and disable the engine
    pub fn stop(&self) {
        self.scenarios.write().clear();
        self.enabled.store(false, Ordering::SeqCst);
        info!("Chaos engine stopped");
    }
}
