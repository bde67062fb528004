//! Offline recording management
//!
//! Works directly on a recording directory, so the server does not need to
//! be running.

use std::path::Path;

use anyhow::{Context, Result};
use application::ports::{RecordingQuery, RecordingStore};
use domain::Recording;
use infrastructure::{AppConfig, FileStorage};
use tracing::info;

use crate::cli::StorageArgs;

/// Open the recording directory named by the arguments or the configuration
pub async fn open_store(config: &AppConfig, args: &StorageArgs) -> Result<FileStorage> {
    let directory = args
        .dir
        .clone()
        .unwrap_or_else(|| config.recording.storage.directory.clone());
    let format = args
        .format
        .map_or(config.recording.storage.format, Into::into);

    FileStorage::open(&directory, format, config.recording.max_recordings)
        .await
        .with_context(|| format!("failed to open recordings in {}", directory.display()))
}

/// One-line summary used by `recordings list`
pub fn summary_line(recording: &Recording) -> String {
    format!(
        "{}  {}  {:<7} {}  {:>6}ms  {}",
        recording.id,
        recording.timestamp.format("%Y-%m-%d %H:%M:%S"),
        recording.method(),
        recording.status(),
        recording.duration.as_millis(),
        recording.uri()
    )
}

/// Write every recording matching `query` to `output` as a JSON array
pub async fn export(
    store: &dyn RecordingStore,
    query: &RecordingQuery,
    output: &Path,
) -> Result<usize> {
    let recordings = store.list(query).await?;
    let json = serde_json::to_vec_pretty(&recordings)?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(count = recordings.len(), output = %output.display(), "Exported recordings");
    Ok(recordings.len())
}
