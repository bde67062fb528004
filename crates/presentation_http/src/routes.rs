//! Route definitions

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::{
    handlers,
    middleware::{ChaosLayer, RecordingLayer, RequestIdLayer},
    state::AppState,
};

/// Create the main router with all routes and the chaos/recording middleware
pub fn create_router(state: AppState) -> Router {
    let chaos = ChaosLayer::new(Arc::clone(&state.chaos));
    let recording = RecordingLayer::new(
        Arc::clone(&state.recording),
        state.config.server.max_body_bytes,
    );

    Router::new()
        // Health
        .route("/health", get(handlers::health::health_check))
        // Admin API
        .route("/__admin/chaos/stats", get(handlers::admin::chaos_stats))
        .route(
            "/__admin/recording/stats",
            get(handlers::admin::recording_stats),
        )
        .route("/__admin/recordings", get(handlers::admin::list_recordings))
        .route(
            "/__admin/recordings/{id}",
            get(handlers::admin::get_recording).delete(handlers::admin::delete_recording),
        )
        // Everything else is mocked
        .fallback(handlers::mock::mock_response)
        .with_state(state)
        // Last added runs first: request id, recording, chaos
        .layer(chaos)
        .layer(recording)
        .layer(RequestIdLayer::new())
}
