//! Admin API
//!
//! Engine statistics and read/delete access to stored recordings. Served
//! under `/__admin`, outside the reach of chaos and recording.

use application::ports::{RecordingQuery, StorageStats};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use domain::{Recording, RecordingId};
use infrastructure::{EngineStats, RecordingStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{error::ApiError, state::AppState};

/// Default page size for recording listings
const DEFAULT_LIST_LIMIT: usize = 100;

/// Recording engine and storage statistics
#[derive(Debug, Serialize)]
pub struct RecordingStatsResponse {
    pub engine: RecordingStats,
    pub storage: StorageStats,
}

/// Query string accepted by the recording listing
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordingsParams {
    pub method: Option<String>,
    pub endpoint: Option<String>,
    pub status: Option<u16>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl From<ListRecordingsParams> for RecordingQuery {
    fn from(params: ListRecordingsParams) -> Self {
        Self {
            method: params.method,
            endpoint: params.endpoint,
            status: params.status,
            offset: params.offset,
            limit: Some(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
            ..Self::default()
        }
    }
}

/// One line of a recording listing
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub status: u16,
    pub duration_ms: u128,
}

impl From<&Recording> for RecordingSummary {
    fn from(recording: &Recording) -> Self {
        Self {
            id: recording.id.to_string(),
            timestamp: recording.timestamp,
            method: recording.method().to_string(),
            uri: recording.uri().to_string(),
            status: recording.status(),
            duration_ms: recording.duration.as_millis(),
        }
    }
}

/// Chaos engine statistics
pub async fn chaos_stats(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.chaos.stats())
}

/// Recording engine statistics plus storage totals
pub async fn recording_stats(
    State(state): State<AppState>,
) -> Result<Json<RecordingStatsResponse>, ApiError> {
    let storage = state.recording.storage().stats().await?;
    Ok(Json(RecordingStatsResponse {
        engine: state.recording.stats(),
        storage,
    }))
}

/// List stored recordings, newest first
#[instrument(skip(state))]
pub async fn list_recordings(
    State(state): State<AppState>,
    Query(params): Query<ListRecordingsParams>,
) -> Result<Json<Vec<RecordingSummary>>, ApiError> {
    let query = RecordingQuery::from(params);
    let recordings = state.recording.storage().list(&query).await?;
    debug!(count = recordings.len(), "Listed recordings");
    Ok(Json(recordings.iter().map(RecordingSummary::from).collect()))
}

/// Fetch a full recording
pub async fn get_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recording>, ApiError> {
    let id = RecordingId::parse(&id)?;
    let recording = state.recording.storage().load(&id).await?;
    Ok(Json(recording))
}

/// Delete a recording
#[instrument(skip(state))]
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = RecordingId::parse(&id)?;
    state.recording.storage().delete(&id).await?;
    debug!(%id, "Deleted recording");
    Ok(StatusCode::NO_CONTENT)
}
