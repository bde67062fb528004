//! Recording engine

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use application::ports::{
    CHAOS_APPLIED_KEY, CHAOS_SCENARIO_KEY, Exchange, REQUEST_ID_KEY, RecordingStore,
};
use chrono::{DateTime, Utc};
use domain::{Headers, RecordedRequest, RecordedResponse, Recording, RecordingMetadata};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Filter, RecordingError, build_filters};
use crate::config::RecordingConfig;

/// Snapshot of recording statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStats {
    /// Every exchange seen, whether or not capture was enabled
    pub total_requests: u64,
    /// Exchanges persisted to storage
    pub recorded_requests: u64,
    /// Exchanges dropped by a filter or the body-size cap
    pub filtered_requests: u64,
    /// Storage failures
    pub error_count: u64,
    pub last_recording: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    recorded: AtomicU64,
    filtered: AtomicU64,
    errors: AtomicU64,
    last_recording: RwLock<Option<DateTime<Utc>>>,
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl Counters {
    fn reset(&self, started_at: DateTime<Utc>) {
        self.total.store(0, Ordering::Relaxed);
        self.recorded.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        *self.last_recording.write() = None;
        *self.started_at.write() = Some(started_at);
    }
}

/// Settings captured by `start`, swapped as a whole
#[derive(Debug, Default)]
struct Settings {
    max_body_size: usize,
    filters: Vec<Box<dyn Filter>>,
    include_headers: HashSet<String>,
    exclude_headers: HashSet<String>,
}

impl Settings {
    fn from_config(config: &RecordingConfig) -> Result<Self, RecordingError> {
        let lower = |names: &[String]| {
            names
                .iter()
                .map(|n| n.trim().to_ascii_lowercase())
                .collect::<HashSet<_>>()
        };
        Ok(Self {
            max_body_size: config.max_body_size,
            filters: build_filters(&config.filters)?,
            include_headers: lower(&config.include_headers),
            exclude_headers: lower(&config.exclude_headers),
        })
    }

    fn filter_headers(&self, headers: &Headers) -> Headers {
        headers
            .iter()
            .filter(|(name, _)| {
                let name = name.to_ascii_lowercase();
                (self.include_headers.is_empty() || self.include_headers.contains(&name))
                    && !self.exclude_headers.contains(&name)
            })
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect()
    }
}

/// Captures finished exchanges into a [`RecordingStore`]
#[derive(Debug)]
pub struct RecordingEngine {
    storage: Arc<dyn RecordingStore>,
    settings: RwLock<Arc<Settings>>,
    enabled: AtomicBool,
    counters: Counters,
}

impl RecordingEngine {
    /// Create a stopped engine over a store
    pub fn new(storage: Arc<dyn RecordingStore>) -> Self {
        Self {
            storage,
            settings: RwLock::new(Arc::new(Settings::default())),
            enabled: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Apply a configuration and reset statistics
    ///
    /// Capture is enabled iff `config.enabled`. On an invalid filter the
    /// previous configuration stays in place.
    pub fn start(&self, config: &RecordingConfig) -> Result<(), RecordingError> {
        let settings = Settings::from_config(config)?;
        let filter_count = settings.filters.len();

        *self.settings.write() = Arc::new(settings);
        self.counters.reset(Utc::now());
        self.enabled.store(config.enabled, Ordering::SeqCst);

        info!(
            enabled = config.enabled,
            filters = filter_count,
            max_body_size = config.max_body_size,
            "Recording engine started"
        );
        Ok(())
    }

    /// Stop capturing; statistics are kept
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        info!("Recording engine stopped");
    }

    /// Whether exchanges are currently captured
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Capture one finished exchange
    ///
    /// Filtered or oversized exchanges are counted and dropped without error.
    pub async fn record(
        &self,
        exchange: &dyn Exchange,
        response_body: &[u8],
        duration: Duration,
    ) -> Result<(), RecordingError> {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        if !self.is_enabled() {
            return Ok(());
        }

        let settings = Arc::clone(&self.settings.read());
        let recording = build_recording(exchange, response_body, duration, &settings);

        if let Some(filter) = settings.filters.iter().find(|f| !f.apply(&recording)) {
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            debug!(uri = %recording.uri(), filter = %filter, "Recording filtered");
            return Ok(());
        }

        if recording.request.body.len() > settings.max_body_size
            || recording.response.body.len() > settings.max_body_size
        {
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            debug!(
                uri = %recording.uri(),
                request_bytes = recording.request.body.len(),
                response_bytes = recording.response.body.len(),
                max_body_size = settings.max_body_size,
                "Recording dropped: body too large"
            );
            return Ok(());
        }

        match self.storage.save(&recording).await {
            Ok(()) => {
                self.counters.recorded.fetch_add(1, Ordering::Relaxed);
                *self.counters.last_recording.write() = Some(recording.timestamp);
                debug!(id = %recording.id, uri = %recording.uri(), "Recorded exchange");
                Ok(())
            },
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(uri = %recording.uri(), error = %e, "Failed to store recording");
                Err(e.into())
            },
        }
    }

    /// Account for an exchange whose body was too large to buffer
    ///
    /// Counted like any other exchange and, while capturing, as filtered.
    pub fn record_oversized(&self, exchange: &dyn Exchange, body_bytes: usize) {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        if !self.is_enabled() {
            return;
        }
        self.counters.filtered.fetch_add(1, Ordering::Relaxed);
        debug!(
            uri = %exchange.uri(),
            body_bytes,
            "Recording dropped: body too large to buffer"
        );
    }

    /// Statistics snapshot
    pub fn stats(&self) -> RecordingStats {
        RecordingStats {
            total_requests: self.counters.total.load(Ordering::Relaxed),
            recorded_requests: self.counters.recorded.load(Ordering::Relaxed),
            filtered_requests: self.counters.filtered.load(Ordering::Relaxed),
            error_count: self.counters.errors.load(Ordering::Relaxed),
            last_recording: *self.counters.last_recording.read(),
            started_at: *self.counters.started_at.read(),
        }
    }

    /// Backing store
    pub fn storage(&self) -> Arc<dyn RecordingStore> {
        Arc::clone(&self.storage)
    }
}

fn build_recording(
    exchange: &dyn Exchange,
    response_body: &[u8],
    duration: Duration,
    settings: &Settings,
) -> Recording {
    let request = RecordedRequest {
        method: exchange.method().to_string(),
        uri: exchange.uri().to_string(),
        headers: settings.filter_headers(exchange.request_headers()),
        body: exchange.request_body().to_vec(),
        query_params: exchange.query_params(),
        content_type: exchange
            .request_header("content-type")
            .unwrap_or_default()
            .to_string(),
    };

    let status = match exchange.response_status() {
        0 => 200,
        status => status,
    };
    let response = RecordedResponse {
        status,
        headers: settings.filter_headers(exchange.response_headers()),
        body: response_body.to_vec(),
        content_type: exchange
            .response_headers()
            .get("content-type")
            .cloned()
            .unwrap_or_default(),
    };

    let metadata = RecordingMetadata {
        client_ip: client_ip(exchange),
        user_agent: exchange.request_header("user-agent").map(str::to_string),
        request_id: exchange
            .value(REQUEST_ID_KEY)
            .and_then(Value::as_str)
            .or_else(|| exchange.request_header("x-request-id"))
            .map(str::to_string),
        chaos_applied: exchange
            .value(CHAOS_APPLIED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false),
        chaos_scenario: exchange
            .value(CHAOS_SCENARIO_KEY)
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    Recording::new(request, response, duration).with_metadata(metadata)
}

/// Client address, preferring proxy headers over the socket address
fn client_ip(exchange: &dyn Exchange) -> Option<String> {
    exchange
        .request_header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| exchange.request_header("x-real-ip"))
        .or_else(|| exchange.remote_addr())
        .map(str::to_string)
}
