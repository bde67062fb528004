//! Recording persistence
//!
//! Two [`RecordingStore`] implementations:
//! - [`FileStorage`]: one JSON file per recording plus an `index.json`
//! - [`MemoryStorage`]: process-local map for tests and ephemeral runs
//!
//! Both cap the number of stored recordings and evict the oldest by
//! timestamp once the cap is exceeded.

mod file_storage;
mod memory_storage;

use std::sync::Arc;

use application::{error::ApplicationError, ports::RecordingStore};
use domain::RecordingId;
use tracing::info;

pub use file_storage::{FileStorage, INDEX_FILE};
pub use memory_storage::MemoryStorage;

use crate::config::{StorageConfig, StorageType};

/// Build the store described by the configuration
pub async fn create_storage(
    config: &StorageConfig,
    max_recordings: usize,
) -> Result<Arc<dyn RecordingStore>, ApplicationError> {
    let store: Arc<dyn RecordingStore> = match config.storage_type {
        StorageType::File => Arc::new(
            FileStorage::open(&config.directory, config.format, max_recordings).await?,
        ),
        StorageType::Memory => Arc::new(MemoryStorage::new(max_recordings)),
    };
    info!(
        storage_type = %config.storage_type,
        max_recordings,
        "Recording storage ready"
    );
    Ok(store)
}

/// Ids to evict so that at most `max` entries remain, oldest first
///
/// `max == 0` disables the cap.
fn eviction_candidates<'a, I>(entries: I, max: usize) -> Vec<RecordingId>
where
    I: Iterator<Item = (&'a RecordingId, chrono::DateTime<chrono::Utc>)>,
{
    let mut entries: Vec<_> = entries.collect();
    if max == 0 || entries.len() <= max {
        return Vec::new();
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let excess = entries.len() - max;
    entries.into_iter().take(excess).map(|(id, _)| *id).collect()
}
