//! Latency injection

use std::time::Duration;

use application::ports::Exchange;
use async_trait::async_trait;
use domain::Parameters;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{ChaosError, Injector, injector::duration_param};

const TYPE: &str = "latency";

/// Delays the exchange by a uniformly drawn duration in `[min_delay, max_delay]`
///
/// The delay is an async sleep, so other requests keep being served.
#[derive(Debug)]
pub struct LatencyInjector {
    rng: Mutex<StdRng>,
}

impl Default for LatencyInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyInjector {
    /// Create an injector seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create an injector with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn bounds(params: &Parameters) -> Result<(Duration, Duration), ChaosError> {
        let min = duration_param(params, "min_delay", TYPE)?;
        let max = duration_param(params, "max_delay", TYPE)?;
        if min > max {
            return Err(ChaosError::invalid_parameters(
                TYPE,
                format!("min_delay ({min:?}) must not exceed max_delay ({max:?})"),
            ));
        }
        Ok((min, max))
    }

    /// Draw a delay in `[min, max]`
    pub fn sample_delay(&self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let span = u64::try_from((max - min).as_nanos()).unwrap_or(u64::MAX);
        let offset = self.rng.lock().random_range(0..=span);
        min + Duration::from_nanos(offset)
    }
}

#[async_trait]
impl Injector for LatencyInjector {
    fn injector_type(&self) -> &'static str {
        TYPE
    }

    fn validate(&self, params: &Parameters) -> Result<(), ChaosError> {
        Self::bounds(params).map(|_| ())
    }

    async fn inject(
        &self,
        exchange: &mut dyn Exchange,
        params: &Parameters,
    ) -> Result<(), ChaosError> {
        let (min, max) = Self::bounds(params)?;
        let delay = self.sample_delay(min, max);
        debug!(path = %exchange.path(), delay_ms = delay.as_millis(), "Injecting latency");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
