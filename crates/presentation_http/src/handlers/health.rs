//! Health check handler

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chaos_enabled: bool,
    pub recording_enabled: bool,
}

/// Liveness check - is the server running?
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chaos_enabled: state.chaos.is_enabled(),
        recording_enabled: state.recording.is_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_engine_flags() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            chaos_enabled: true,
            recording_enabled: false,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["chaos_enabled"], true);
        assert_eq!(json["recording_enabled"], false);
    }
}
