//! Bounded-concurrency replay of recorded traffic

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use application::ports::{RecordingQuery, RecordingStore};
use chrono::{DateTime, Utc};
use domain::{Headers, Recording, RecordingId};
use parking_lot::Mutex;
use reqwest::{
    Client, Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, warn};
use url::Url;

use super::ReplayError;

/// Headers never copied from a recording
const HOP_HEADERS: [&str; 4] = ["host", "content-length", "connection", "transfer-encoding"];

/// Settings for one replay run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Where requests are sent
    pub target_url: String,
    /// Maximum requests in flight
    pub concurrency: usize,
    /// Pause between launching consecutive requests
    pub delay_between: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Send to the target's scheme and host instead of the recorded one
    pub replace_host: bool,
    /// If non-empty, only these recorded headers are sent
    pub preserve_headers: Vec<String>,
    /// Headers set on every request, replacing recorded values
    pub override_headers: BTreeMap<String, String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            concurrency: 10,
            delay_between: Duration::ZERO,
            timeout: Duration::from_secs(30),
            replace_host: true,
            preserve_headers: Vec::new(),
            override_headers: BTreeMap::new(),
        }
    }
}

impl ReplayConfig {
    /// Config targeting `target_url` with defaults otherwise
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Default::default()
        }
    }
}

/// Statistics for one replay run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    /// Running mean of request latency over requests that were sent
    #[serde(with = "humantime_duration")]
    pub average_latency: Duration,
    /// Requests that contributed a latency sample
    #[serde(default)]
    pub latency_samples: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ReplayStats {
    /// Account for one request that was sent
    ///
    /// Success means the request got any HTTP response, whatever its status.
    pub fn record(&mut self, latency: Duration, success: bool) {
        self.total_requests += 1;
        if success {
            self.success_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        self.latency_samples += 1;
        let avg = i128::try_from(self.average_latency.as_nanos()).unwrap_or(i128::MAX);
        let sample = i128::try_from(latency.as_nanos()).unwrap_or(i128::MAX);
        let next = avg + (sample - avg) / i128::from(self.latency_samples);
        self.average_latency = Duration::from_nanos(u64::try_from(next.max(0)).unwrap_or(u64::MAX));
    }

    /// Account for a recording that could not be turned into a request
    ///
    /// Counts as a failure but leaves the latency mean untouched.
    pub fn record_unsent(&mut self) {
        self.total_requests += 1;
        self.failed_requests += 1;
    }

    /// Wall time of the run, once finished
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Per-run request shaping, shared by all workers
#[derive(Debug)]
struct RequestPlan {
    target: Url,
    replace_host: bool,
    preserve: HashSet<String>,
    overrides: HeaderMap,
}

impl RequestPlan {
    fn new(target: Url, config: &ReplayConfig) -> Self {
        let mut overrides = HeaderMap::new();
        for (name, value) in &config.override_headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    overrides.insert(name, value);
                },
                _ => warn!(header = %name, "Ignoring invalid override header"),
            }
        }

        Self {
            target,
            replace_host: config.replace_host,
            preserve: config
                .preserve_headers
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
            overrides,
        }
    }

    /// Destination for a recorded request
    fn url_for(&self, recording: &Recording) -> Result<Url, String> {
        let original = recording.uri();

        if self.replace_host {
            let (path, query) = match Url::parse(original) {
                Ok(absolute) => (absolute.path().to_string(), absolute.query().map(str::to_string)),
                Err(_) => {
                    let (path, query) = original
                        .split_once('?')
                        .map_or((original, None), |(p, q)| (p, Some(q)));
                    (path.to_string(), query.map(str::to_string))
                },
            };
            let mut url = self.target.clone();
            url.set_path(&path);
            url.set_query(query.as_deref());
            return Ok(url);
        }

        match Url::parse(original) {
            Ok(url) => Ok(url),
            Err(e) => recording
                .request
                .headers
                .get("host")
                .ok_or_else(|| format!("'{original}' is not absolute and no host was recorded: {e}"))
                .and_then(|host| {
                    Url::parse(&format!("http://{host}{original}")).map_err(|e| e.to_string())
                }),
        }
    }

    /// Outbound headers for a recorded request
    fn headers_for(&self, recorded: &Headers) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in recorded {
            let lower = name.to_ascii_lowercase();
            if HOP_HEADERS.contains(&lower.as_str()) {
                continue;
            }
            if !self.preserve.is_empty() && !self.preserve.contains(&lower) {
                continue;
            }
            match (
                HeaderName::from_bytes(lower.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                },
                _ => debug!(header = %name, "Skipping unrepresentable header"),
            }
        }
        for (name, value) in &self.overrides {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

/// Resends recordings against a target
#[derive(Debug, Default)]
pub struct Replayer {
    recordings: Vec<Recording>,
    stats: Arc<Mutex<ReplayStats>>,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the recordings matching a query, replacing the current snapshot
    pub async fn load_recordings(
        &mut self,
        store: &dyn RecordingStore,
        query: &RecordingQuery,
    ) -> Result<usize, ReplayError> {
        self.recordings = store.list(query).await?;
        info!(count = self.recordings.len(), "Loaded recordings for replay");
        Ok(self.recordings.len())
    }

    /// Load specific recordings in the given order
    pub async fn load_by_ids(
        &mut self,
        store: &dyn RecordingStore,
        ids: &[RecordingId],
    ) -> Result<usize, ReplayError> {
        let mut recordings = Vec::with_capacity(ids.len());
        for id in ids {
            recordings.push(store.load(id).await?);
        }
        self.recordings = recordings;
        info!(count = self.recordings.len(), "Loaded recordings for replay");
        Ok(self.recordings.len())
    }

    /// Replace the snapshot directly
    pub fn set_recordings(&mut self, recordings: Vec<Recording>) {
        self.recordings = recordings;
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    /// Statistics of the current or last run
    pub fn stats(&self) -> ReplayStats {
        self.stats.lock().clone()
    }

    /// Replay every loaded recording
    ///
    /// At most `concurrency` requests are in flight; consecutive launches
    /// are spaced by `delay_between`. Individual failures are counted and
    /// never abort the batch.
    pub async fn replay_traffic(&self, config: &ReplayConfig) -> Result<ReplayStats, ReplayError> {
        if self.recordings.is_empty() {
            return Err(ReplayError::NoRecordings);
        }
        if config.concurrency == 0 {
            return Err(ReplayError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        let target = parse_target(&config.target_url)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReplayError::Client(e.to_string()))?;

        *self.stats.lock() = ReplayStats {
            start_time: Some(Utc::now()),
            ..Default::default()
        };
        info!(
            target = %target,
            recordings = self.recordings.len(),
            concurrency = config.concurrency,
            delay_ms = config.delay_between.as_millis(),
            "Replay started"
        );

        let plan = Arc::new(RequestPlan::new(target, config));
        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let mut workers = JoinSet::new();
        let last = self.recordings.len() - 1;

        for (i, recording) in self.recordings.iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let client = client.clone();
            let plan = Arc::clone(&plan);
            let stats = Arc::clone(&self.stats);
            let recording = recording.clone();

            workers.spawn(async move {
                match replay_one(&client, &plan, &recording).await {
                    Some((latency, success)) => stats.lock().record(latency, success),
                    None => stats.lock().record_unsent(),
                }
                drop(permit);
            });

            if i < last && !config.delay_between.is_zero() {
                tokio::time::sleep(config.delay_between).await;
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Replay worker panicked");
            }
        }

        let stats = {
            let mut stats = self.stats.lock();
            stats.end_time = Some(Utc::now());
            stats.clone()
        };
        info!(
            total = stats.total_requests,
            success = stats.success_requests,
            failed = stats.failed_requests,
            average_latency_ms = stats.average_latency.as_millis(),
            "Replay finished"
        );
        Ok(stats)
    }
}

fn parse_target(raw: &str) -> Result<Url, ReplayError> {
    let invalid = |reason: String| ReplayError::InvalidTargetUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Send one recorded request, returning its latency and whether a response arrived
///
/// `None` means no request could be built for the recording.
async fn replay_one(
    client: &Client,
    plan: &RequestPlan,
    recording: &Recording,
) -> Option<(Duration, bool)> {
    let url = match plan.url_for(recording) {
        Ok(url) => url,
        Err(reason) => {
            warn!(id = %recording.id, reason = %reason, "Cannot build replay URL");
            return None;
        },
    };
    let Ok(method) = Method::from_bytes(recording.method().as_bytes()) else {
        warn!(id = %recording.id, method = %recording.method(), "Invalid method");
        return None;
    };

    let request = client
        .request(method, url.clone())
        .headers(plan.headers_for(&recording.request.headers))
        .body(recording.request.body.clone());

    let started = Instant::now();
    let result = request.send().await;
    let latency = started.elapsed();

    match result {
        Ok(response) => {
            let status = response.status();
            // Drain so the connection can be reused
            let _ = response.bytes().await;
            debug!(id = %recording.id, url = %url, status = status.as_u16(), "Replayed request");
            Some((latency, true))
        },
        Err(e) => {
            warn!(id = %recording.id, url = %url, error = %e, "Replay request failed");
            Some((latency, false))
        },
    }
}

#[cfg(test)]
mod tests {
    use domain::{RecordedRequest, RecordedResponse};

    use super::*;

    fn recording(uri: &str, headers: &[(&str, &str)]) -> Recording {
        Recording::new(
            RecordedRequest {
                method: "GET".to_string(),
                uri: uri.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                ..Default::default()
            },
            RecordedResponse::default(),
            Duration::ZERO,
        )
    }

    fn plan(config: &ReplayConfig) -> RequestPlan {
        RequestPlan::new(parse_target(&config.target_url).unwrap(), config)
    }

    #[test]
    fn online_mean_is_exact() {
        let mut stats = ReplayStats::default();
        stats.record(Duration::from_millis(100), true);
        stats.record(Duration::from_millis(200), false);
        assert_eq!(stats.average_latency, Duration::from_millis(150));
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.success_requests, 1);
        assert_eq!(stats.failed_requests, 1);
    }

    #[test]
    fn online_mean_handles_decreasing_latency() {
        let mut stats = ReplayStats::default();
        for ms in [300, 100, 200] {
            stats.record(Duration::from_millis(ms), true);
        }
        assert_eq!(stats.average_latency, Duration::from_millis(200));
    }

    #[test]
    fn unsent_requests_fail_without_latency_sample() {
        let mut stats = ReplayStats::default();
        stats.record_unsent();
        stats.record(Duration::from_millis(100), true);
        stats.record_unsent();
        assert_eq!(stats.average_latency, Duration::from_millis(100));
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.failed_requests, 2);
        assert_eq!(stats.latency_samples, 1);
    }

    #[test]
    fn stats_serialize_latency_as_text() {
        let mut stats = ReplayStats::default();
        stats.record(Duration::from_millis(150), true);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["average_latency"], "150ms");
        let back: ReplayStats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn replace_host_keeps_path_and_query() {
        let p = plan(&ReplayConfig::new("https://staging.example.com:8443/ignored"));
        let url = p.url_for(&recording("/api/users?page=2", &[])).unwrap();
        assert_eq!(url.as_str(), "https://staging.example.com:8443/api/users?page=2");

        let url = p
            .url_for(&recording("http://prod.example.com/api/x", &[]))
            .unwrap();
        assert_eq!(url.as_str(), "https://staging.example.com:8443/api/x");
    }

    #[test]
    fn literal_uri_when_not_replacing_host() {
        let config = ReplayConfig {
            replace_host: false,
            ..ReplayConfig::new("http://target:1")
        };
        let p = plan(&config);
        let url = p
            .url_for(&recording("http://origin.example.com/a?b=1", &[]))
            .unwrap();
        assert_eq!(url.as_str(), "http://origin.example.com/a?b=1");

        let url = p
            .url_for(&recording("/a", &[("host", "origin.local:8080")]))
            .unwrap();
        assert_eq!(url.as_str(), "http://origin.local:8080/a");

        assert!(p.url_for(&recording("/a", &[])).is_err());
    }

    #[test]
    fn header_rules() {
        let mut config = ReplayConfig::new("http://target");
        config
            .override_headers
            .insert("authorization".to_string(), "Bearer replay".to_string());
        let p = plan(&config);

        let headers = p.headers_for(
            &recording(
                "/",
                &[
                    ("host", "origin"),
                    ("content-length", "10"),
                    ("connection", "keep-alive"),
                    ("transfer-encoding", "chunked"),
                    ("accept", "application/json"),
                    ("authorization", "Bearer original"),
                ],
            )
            .request
            .headers,
        );

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["accept"], "application/json");
        assert_eq!(headers["authorization"], "Bearer replay");
    }

    #[test]
    fn preserve_list_restricts_headers() {
        let mut config = ReplayConfig::new("http://target");
        config.preserve_headers = vec!["X-Tenant".to_string()];
        config
            .override_headers
            .insert("x-replay".to_string(), "1".to_string());
        let p = plan(&config);

        let headers = p.headers_for(
            &recording("/", &[("x-tenant", "acme"), ("accept", "*/*")])
                .request
                .headers,
        );
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-tenant"], "acme");
        assert_eq!(headers["x-replay"], "1");
    }

    #[test]
    fn target_validation() {
        assert!(parse_target("http://localhost:8080").is_ok());
        assert!(matches!(
            parse_target("not a url"),
            Err(ReplayError::InvalidTargetUrl { .. })
        ));
        assert!(parse_target("ftp://example.com").is_err());
    }

    #[tokio::test]
    async fn replay_without_recordings_fails_fast() {
        let replayer = Replayer::new();
        let err = replayer
            .replay_traffic(&ReplayConfig::new("http://localhost:1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::NoRecordings));
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let mut replayer = Replayer::new();
        replayer.set_recordings(vec![recording("/", &[])]);
        let config = ReplayConfig {
            concurrency: 0,
            ..ReplayConfig::new("http://localhost:1")
        };
        assert!(matches!(
            replayer.replay_traffic(&config).await,
            Err(ReplayError::InvalidConfig(_))
        ));
    }
}
