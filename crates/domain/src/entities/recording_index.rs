//! Lightweight secondary index entry for a stored recording

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Recording, RecordingId};

/// One index entry per stored recording
///
/// Holds just enough to filter and sort recordings without reading their
/// files back from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingIndex {
    pub id: RecordingId,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub status: u16,
    pub filename: String,
}

impl RecordingIndex {
    /// Build the index entry for a recording stored under `filename`
    pub fn from_recording(recording: &Recording, filename: impl Into<String>) -> Self {
        Self {
            id: recording.id,
            timestamp: recording.timestamp,
            method: recording.request.method.clone(),
            uri: recording.request.uri.clone(),
            status: recording.response.status,
            filename: filename.into(),
        }
    }
}
