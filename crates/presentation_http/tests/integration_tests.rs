//! Integration tests for the HTTP server
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use application::ports::{RecordingQuery, RecordingStore};
use axum::http::StatusCode;
use axum_test::TestServer;
use domain::Recording;
use infrastructure::{
    AppConfig, ChaosEngine, MemoryStorage, RecordingConfig, RecordingEngine, ScenarioConfig,
    config::MockRouteConfig,
};
use presentation_http::{routes::create_router, state::AppState};
use serde_json::{Value, json};

struct Harness {
    server: TestServer,
    chaos: Arc<ChaosEngine>,
    storage: Arc<dyn RecordingStore>,
}

fn harness(config: AppConfig, scenarios: &[ScenarioConfig]) -> Harness {
    let chaos = Arc::new(ChaosEngine::with_seed(7));
    chaos.load_scenarios(scenarios);

    let storage: Arc<dyn RecordingStore> = Arc::new(MemoryStorage::new(100));
    let recording = Arc::new(RecordingEngine::new(Arc::clone(&storage)));
    recording
        .start(&config.recording)
        .expect("recording config is valid");

    let state = AppState::new(config, Arc::clone(&chaos), recording);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    Harness {
        server,
        chaos,
        storage,
    }
}

fn recording_config() -> AppConfig {
    AppConfig {
        recording: RecordingConfig {
            enabled: true,
            ..RecordingConfig::default()
        },
        ..AppConfig::default()
    }
}

fn outage_on_api() -> ScenarioConfig {
    ScenarioConfig::new("api-outage", "error", vec!["/api/*".to_string()], 1.0)
        .with_parameter("error_codes", json!([503]))
}

/// Recordings are saved on a background task; poll until `count` have landed
async fn wait_for_recordings(storage: &Arc<dyn RecordingStore>, count: usize) -> Vec<Recording> {
    for _ in 0..100 {
        let recordings = storage.list(&RecordingQuery::new()).await.unwrap();
        if recordings.len() >= count {
            return recordings;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} recordings to be stored");
}

#[tokio::test]
async fn health_reports_engine_state() {
    let h = harness(recording_config(), &[outage_on_api()]);

    let response = h.server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["chaos_enabled"], true);
    assert_eq!(body["recording_enabled"], true);
}

#[tokio::test]
async fn unknown_path_gets_default_echo() {
    let h = harness(AppConfig::default(), &[]);

    let response = h.server.get("/anything/here").add_query_param("x", "1").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/anything/here");
    assert_eq!(body["query"], "x=1");
}

#[tokio::test]
async fn configured_mock_route_is_served() {
    let mut config = AppConfig::default();
    config.server.routes.push(MockRouteConfig {
        method: "POST".to_string(),
        path: "/users".to_string(),
        status: 201,
        body: r#"{"id":42}"#.to_string(),
        content_type: "application/json".to_string(),
    });
    let h = harness(config, &[]);

    let response = h.server.post("/users").json(&json!({"name": "ada"})).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], 42);

    // Same path, other method falls through to the echo
    let response = h.server.get("/users").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["path"], "/users");
}

#[tokio::test]
async fn request_id_header_is_returned() {
    let h = harness(AppConfig::default(), &[]);

    let response = h.server.get("/ping").await;
    assert!(!response.header("x-request-id").is_empty());

    let response = h
        .server
        .get("/ping")
        .add_header("x-request-id", "client-chosen-id")
        .await;
    assert_eq!(response.header("x-request-id"), "client-chosen-id");
}

#[tokio::test]
async fn error_scenario_short_circuits_matching_requests() {
    let h = harness(AppConfig::default(), &[outage_on_api()]);

    let response = h.server.get("/api/orders").await;
    response.assert_status_service_unavailable();
    let body: Value = response.json();
    assert_eq!(body["error"], "Service Unavailable");
    assert_eq!(body["status"], 503);

    // Outside the scenario's endpoints nothing happens
    h.server.get("/other").await.assert_status_ok();

    let stats = h.chaos.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.injections_applied, 1);
}

#[tokio::test]
async fn latency_scenario_delays_then_serves_normally() {
    let scenario = ScenarioConfig::new("slow", "latency", vec!["/slow".to_string()], 1.0)
        .with_parameter("min_delay", json!("50ms"))
        .with_parameter("max_delay", json!("60ms"));
    let h = harness(AppConfig::default(), &[scenario]);

    let started = std::time::Instant::now();
    let response = h.server.get("/slow").await;

    response.assert_status_ok();
    assert!(started.elapsed() >= Duration::from_millis(50));
    let body: Value = response.json();
    assert_eq!(body["path"], "/slow");
}

#[tokio::test]
async fn admin_paths_bypass_chaos() {
    let everything = ScenarioConfig::new("everything", "error", vec!["*".to_string()], 1.0)
        .with_parameter("error_codes", json!([500]));
    let h = harness(AppConfig::default(), &[everything]);

    h.server.get("/__admin/chaos/stats").await.assert_status_ok();
    h.server.get("/health").await.assert_status_internal_server_error();
}

#[tokio::test]
async fn chaos_stats_list_scenarios() {
    let h = harness(AppConfig::default(), &[outage_on_api()]);
    h.server.get("/api/a").await;

    let response = h.server.get("/__admin/chaos/stats").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["enabled"], true);
    assert_eq!(body["scenario_count"], 1);
    assert_eq!(body["injections_applied"], 1);
    assert_eq!(body["scenarios"][0]["name"], "api-outage");
    assert_eq!(body["scenarios"][0]["type"], "error");
}

#[tokio::test]
async fn exchanges_are_recorded_and_browsable() {
    let h = harness(recording_config(), &[]);

    h.server
        .post("/api/users")
        .json(&json!({"name": "grace"}))
        .await
        .assert_status_ok();

    let recordings = wait_for_recordings(&h.storage, 1).await;
    let recording = &recordings[0];
    assert_eq!(recording.method(), "POST");
    assert_eq!(recording.uri(), "/api/users");
    assert_eq!(recording.status(), 200);
    assert_eq!(recording.request.body, br#"{"name":"grace"}"#);
    assert!(recording.metadata.request_id.is_some());
    assert!(!recording.metadata.chaos_applied);

    let response = h.server.get("/__admin/recordings").await;
    response.assert_status_ok();
    let list: Value = response.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["method"], "POST");
    let id = list[0]["id"].as_str().unwrap().to_string();

    let response = h.server.get(&format!("/__admin/recordings/{id}")).await;
    response.assert_status_ok();
    let full: Value = response.json();
    assert_eq!(full["request"]["uri"], "/api/users");

    h.server
        .delete(&format!("/__admin/recordings/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    h.server
        .get(&format!("/__admin/recordings/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn admin_requests_are_not_recorded() {
    let h = harness(recording_config(), &[]);

    h.server.get("/__admin/recordings").await.assert_status_ok();
    h.server.get("/real").await.assert_status_ok();

    let recordings = wait_for_recordings(&h.storage, 1).await;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].uri(), "/real");
}

#[tokio::test]
async fn chaos_responses_are_recorded_with_marker() {
    let h = harness(recording_config(), &[outage_on_api()]);

    h.server
        .get("/api/orders")
        .await
        .assert_status_service_unavailable();

    let recordings = wait_for_recordings(&h.storage, 1).await;
    let recording = &recordings[0];
    assert_eq!(recording.status(), 503);
    assert!(recording.metadata.chaos_applied);
    assert_eq!(recording.metadata.chaos_scenario.as_deref(), Some("api-outage"));
}

#[tokio::test]
async fn recording_listing_accepts_filters() {
    let h = harness(recording_config(), &[]);

    h.server.get("/a").await;
    h.server.post("/b").await;
    wait_for_recordings(&h.storage, 2).await;

    let response = h
        .server
        .get("/__admin/recordings")
        .add_query_param("method", "post")
        .await;
    let list: Value = response.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["uri"], "/b");
}

#[tokio::test]
async fn recording_stats_include_storage() {
    let h = harness(recording_config(), &[]);
    h.server.get("/counted").await;
    wait_for_recordings(&h.storage, 1).await;

    let response = h.server.get("/__admin/recording/stats").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["engine"]["recorded_requests"], 1);
    assert_eq!(body["storage"]["storage_type"], "memory");
    assert_eq!(body["storage"]["total_recordings"], 1);
}

#[tokio::test]
async fn oversized_request_is_served_and_counted_as_filtered() {
    let mut config = recording_config();
    config.server.max_body_bytes = 32;
    let h = harness(config, &[]);

    h.server
        .post("/upload")
        .text("x".repeat(64))
        .await
        .assert_status_ok();

    let body: Value = h.server.get("/__admin/recording/stats").await.json();
    assert_eq!(body["engine"]["total_requests"], 1);
    assert_eq!(body["engine"]["filtered_requests"], 1);
    assert_eq!(body["engine"]["recorded_requests"], 0);
    assert!(h.storage.list(&RecordingQuery::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_request_is_served_with_recording_off() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 32;
    let h = harness(config, &[]);

    h.server
        .post("/upload")
        .text("x".repeat(64))
        .await
        .assert_status_ok();

    let body: Value = h.server.get("/__admin/recording/stats").await.json();
    assert_eq!(body["engine"]["total_requests"], 1);
    assert_eq!(body["engine"]["filtered_requests"], 0);
}

#[tokio::test]
async fn invalid_recording_id_is_bad_request() {
    let h = harness(AppConfig::default(), &[]);

    h.server
        .get("/__admin/recordings/not-a-uuid")
        .await
        .assert_status_bad_request();
}
