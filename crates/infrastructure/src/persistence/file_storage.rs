//! File-backed recording store
//!
//! Layout: `<dir>/index.json` maps recording id → [`RecordingIndex`]; each
//! recording lives in `<dir>/{YYYYMMDD-HHMMSS}-{id}.{json|jsonl}` as indented
//! JSON. The index is rewritten in full after every mutation, so a crash
//! mid-write can leave it truncated.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use application::{
    error::ApplicationError,
    ports::{RecordingQuery, RecordingStore, StorageStats},
};
use async_trait::async_trait;
use domain::{Recording, RecordingId, RecordingIndex};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, instrument, warn};

use super::eviction_candidates;
use crate::config::StorageFormat;

/// Name of the index document inside the storage directory
pub const INDEX_FILE: &str = "index.json";

type Index = HashMap<RecordingId, RecordingIndex>;

/// Recording store writing one file per recording
///
/// A single lock covers the index and every file operation.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
    format: StorageFormat,
    max_files: usize,
    index: RwLock<Index>,
}

impl FileStorage {
    /// Open (or create) a storage directory
    ///
    /// A missing `index.json` yields an empty store; a corrupt one is an
    /// error. `max_files == 0` disables eviction.
    pub async fn open(
        directory: impl AsRef<Path>,
        format: StorageFormat,
        max_files: usize,
    ) -> Result<Self, ApplicationError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).await.map_err(|e| {
            ApplicationError::Storage(format!(
                "failed to create {}: {e}",
                directory.display()
            ))
        })?;

        let index = match fs::read(directory.join(INDEX_FILE)).await {
            Ok(bytes) => serde_json::from_slice::<Index>(&bytes).map_err(|e| {
                ApplicationError::Serialization(format!("corrupt {INDEX_FILE}: {e}"))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Index::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            directory = %directory.display(),
            recordings = index.len(),
            "Opened recording directory"
        );

        Ok(Self {
            directory,
            format,
            max_files,
            index: RwLock::new(index),
        })
    }

    /// Storage directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn filename(&self, recording: &Recording) -> String {
        format!(
            "{}-{}.{}",
            recording.timestamp.format("%Y%m%d-%H%M%S"),
            recording.id,
            self.format.extension()
        )
    }

    async fn write_index(&self, index: &Index) -> Result<(), ApplicationError> {
        let bytes = serde_json::to_vec_pretty(index)?;
        fs::write(self.directory.join(INDEX_FILE), bytes).await?;
        Ok(())
    }

    async fn read_recording(&self, entry: &RecordingIndex) -> Result<Recording, ApplicationError> {
        let bytes = fs::read(self.directory.join(&entry.filename)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn remove_file(&self, filename: &str) {
        match fs::remove_file(self.directory.join(filename)).await {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => warn!(file = %filename, error = %e, "Failed to remove recording file"),
        }
    }

    /// Drop the oldest entries beyond the cap from `index`, returning them
    fn evict(&self, index: &mut Index) -> Vec<RecordingIndex> {
        let evicted = eviction_candidates(
            index.iter().map(|(id, entry)| (id, entry.timestamp)),
            self.max_files,
        );
        evicted.iter().filter_map(|id| index.remove(id)).collect()
    }
}

#[async_trait]
impl RecordingStore for FileStorage {
    #[instrument(skip(self, recording), fields(id = %recording.id))]
    async fn save(&self, recording: &Recording) -> Result<(), ApplicationError> {
        let filename = self.filename(recording);
        let bytes = serde_json::to_vec_pretty(recording)?;

        let mut index = self.index.write().await;
        fs::write(self.directory.join(&filename), bytes).await?;

        // The live index only changes once the new one is on disk
        let mut next = index.clone();
        next.insert(
            recording.id,
            RecordingIndex::from_recording(recording, filename.clone()),
        );
        let evicted = self.evict(&mut next);
        if let Err(e) = self.write_index(&next).await {
            self.remove_file(&filename).await;
            return Err(e);
        }
        *index = next;

        for entry in evicted {
            self.remove_file(&entry.filename).await;
            debug!(id = %entry.id, file = %entry.filename, "Evicted recording");
        }
        Ok(())
    }

    async fn load(&self, id: &RecordingId) -> Result<Recording, ApplicationError> {
        let index = self.index.read().await;
        let entry = index
            .get(id)
            .ok_or_else(|| ApplicationError::NotFound(format!("recording {id}")))?;
        self.read_recording(entry).await
    }

    async fn list(&self, query: &RecordingQuery) -> Result<Vec<Recording>, ApplicationError> {
        let index = self.index.read().await;

        let mut entries: Vec<&RecordingIndex> = index
            .values()
            .filter(|e| query.matches(e.timestamp, &e.method, &e.uri, e.status))
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut recordings = Vec::new();
        for entry in query.paginate(entries) {
            match self.read_recording(entry).await {
                Ok(recording) => recordings.push(recording),
                Err(e) => {
                    warn!(file = %entry.filename, error = %e, "Skipping unreadable recording");
                },
            }
        }
        Ok(recordings)
    }

    async fn delete(&self, id: &RecordingId) -> Result<(), ApplicationError> {
        let mut index = self.index.write().await;
        let mut next = index.clone();
        let entry = next
            .remove(id)
            .ok_or_else(|| ApplicationError::NotFound(format!("recording {id}")))?;
        self.write_index(&next).await?;
        *index = next;
        self.remove_file(&entry.filename).await;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), ApplicationError> {
        let mut index = self.index.write().await;
        for entry in index.values() {
            self.remove_file(&entry.filename).await;
        }
        let removed = index.len();
        index.clear();
        self.write_index(&index).await?;
        info!(removed, "Deleted all recordings");
        Ok(())
    }

    async fn stats(&self) -> Result<StorageStats, ApplicationError> {
        let index = self.index.read().await;

        let mut total_size_bytes = 0;
        for entry in index.values() {
            if let Ok(meta) = fs::metadata(self.directory.join(&entry.filename)).await {
                total_size_bytes += meta.len();
            }
        }

        Ok(StorageStats {
            storage_type: "file".to_string(),
            total_recordings: index.len(),
            total_size_bytes,
            oldest_recording: index.values().map(|e| e.timestamp).min(),
            newest_recording: index.values().map(|e| e.timestamp).max(),
        })
    }

    async fn close(&self) -> Result<(), ApplicationError> {
        let index = self.index.read().await;
        self.write_index(&index).await
    }
}
