//! In-memory recording store

use std::collections::HashMap;

use application::{
    error::ApplicationError,
    ports::{RecordingQuery, RecordingStore, StorageStats},
};
use async_trait::async_trait;
use domain::{Recording, RecordingId};
use parking_lot::RwLock;
use tracing::debug;

use super::eviction_candidates;

/// Recording store backed by a map
///
/// Nothing survives the process; `close` is a no-op.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    recordings: RwLock<HashMap<RecordingId, Recording>>,
    max_recordings: usize,
}

impl MemoryStorage {
    /// Create a store holding at most `max_recordings` (0 for no cap)
    pub fn new(max_recordings: usize) -> Self {
        Self {
            recordings: RwLock::new(HashMap::new()),
            max_recordings,
        }
    }
}

#[async_trait]
impl RecordingStore for MemoryStorage {
    async fn save(&self, recording: &Recording) -> Result<(), ApplicationError> {
        let mut recordings = self.recordings.write();
        recordings.insert(recording.id, recording.clone());

        let evicted = eviction_candidates(
            recordings.iter().map(|(id, r)| (id, r.timestamp)),
            self.max_recordings,
        );
        for id in evicted {
            recordings.remove(&id);
            debug!(id = %id, "Evicted recording");
        }
        Ok(())
    }

    async fn load(&self, id: &RecordingId) -> Result<Recording, ApplicationError> {
        self.recordings
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ApplicationError::NotFound(format!("recording {id}")))
    }

    async fn list(&self, query: &RecordingQuery) -> Result<Vec<Recording>, ApplicationError> {
        let mut matches: Vec<Recording> = self
            .recordings
            .read()
            .values()
            .filter(|r| query.matches(r.timestamp, r.method(), r.uri(), r.status()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(query.paginate(matches))
    }

    async fn delete(&self, id: &RecordingId) -> Result<(), ApplicationError> {
        self.recordings
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApplicationError::NotFound(format!("recording {id}")))
    }

    async fn delete_all(&self) -> Result<(), ApplicationError> {
        self.recordings.write().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<StorageStats, ApplicationError> {
        let recordings = self.recordings.read();
        Ok(StorageStats {
            storage_type: "memory".to_string(),
            total_recordings: recordings.len(),
            total_size_bytes: recordings
                .values()
                .map(|r| (r.request.body.len() + r.response.body.len()) as u64)
                .sum(),
            oldest_recording: recordings.values().map(|r| r.timestamp).min(),
            newest_recording: recordings.values().map(|r| r.timestamp).max(),
        })
    }

    async fn close(&self) -> Result<(), ApplicationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use domain::{RecordedRequest, RecordedResponse};

    use super::*;

    fn recording(method: &str, uri: &str, status: u16, secs: i64) -> Recording {
        Recording::new(
            RecordedRequest {
                method: method.to_string(),
                uri: uri.to_string(),
                ..Default::default()
            },
            RecordedResponse {
                status,
                body: b"body".to_vec(),
                ..Default::default()
            },
            Duration::ZERO,
        )
        .with_timestamp(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    #[tokio::test]
    async fn save_load_delete() {
        let store = MemoryStorage::new(0);
        let rec = recording("GET", "/a", 200, 0);
        store.save(&rec).await.unwrap();

        assert_eq!(store.load(&rec.id).await.unwrap(), rec);
        store.delete(&rec.id).await.unwrap();
        assert!(store.load(&rec.id).await.unwrap_err().is_not_found());
        assert!(store.delete(&rec.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_sorts_newest_first_and_filters() {
        let store = MemoryStorage::new(0);
        store.save(&recording("GET", "/api/a", 200, 1)).await.unwrap();
        store.save(&recording("POST", "/api/b", 201, 2)).await.unwrap();
        store.save(&recording("GET", "/other", 404, 3)).await.unwrap();

        let all = store.list(&RecordingQuery::new()).await.unwrap();
        let uris: Vec<_> = all.iter().map(Recording::uri).collect();
        assert_eq!(uris, vec!["/other", "/api/b", "/api/a"]);

        let api = store
            .list(&RecordingQuery::new().with_endpoint("/api").with_method("get"))
            .await
            .unwrap();
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].uri(), "/api/a");

        let page = store
            .list(&RecordingQuery::new().with_page(1, Some(1)))
            .await
            .unwrap();
        assert_eq!(page[0].uri(), "/api/b");
    }

    #[tokio::test]
    async fn cap_evicts_oldest() {
        let store = MemoryStorage::new(2);
        let oldest = recording("GET", "/1", 200, 1);
        store.save(&recording("GET", "/2", 200, 2)).await.unwrap();
        store.save(&oldest).await.unwrap();
        store.save(&recording("GET", "/3", 200, 3)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_recordings, 2);
        assert!(store.load(&oldest.id).await.is_err());
    }

    #[tokio::test]
    async fn stats_and_delete_all() {
        let store = MemoryStorage::new(0);
        store.save(&recording("GET", "/1", 200, 5)).await.unwrap();
        store.save(&recording("GET", "/2", 200, 9)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.storage_type, "memory");
        assert_eq!(stats.total_size_bytes, 8);
        assert!(stats.oldest_recording < stats.newest_recording);

        store.delete_all().await.unwrap();
        assert_eq!(store.stats().await.unwrap().total_recordings, 0);
    }
}
