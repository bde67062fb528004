//! Replay orchestration over a recording store

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use application::ports::{RecordingQuery, RecordingStore};
use domain::RecordingId;
use parking_lot::Mutex;
use tracing::info;

use super::{ReplayConfig, ReplayError, ReplayStats, Replayer};

/// Runs one replay at a time and keeps the last result
#[derive(Debug)]
pub struct ReplayManager {
    store: Arc<dyn RecordingStore>,
    running: AtomicBool,
    last_stats: Mutex<Option<ReplayStats>>,
}

/// Clears the running flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ReplayManager {
    pub fn new(store: Arc<dyn RecordingStore>) -> Self {
        Self {
            store,
            running: AtomicBool::new(false),
            last_stats: Mutex::new(None),
        }
    }

    fn begin(&self) -> Result<RunGuard<'_>, ReplayError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| RunGuard(&self.running))
            .map_err(|_| ReplayError::AlreadyRunning)
    }

    /// Replay every recording matching the query
    pub async fn start_replay(
        &self,
        config: &ReplayConfig,
        query: &RecordingQuery,
    ) -> Result<ReplayStats, ReplayError> {
        let _guard = self.begin()?;
        let mut replayer = Replayer::new();
        replayer.load_recordings(self.store.as_ref(), query).await?;
        self.run(&replayer, config).await
    }

    /// Replay specific recordings in the given order
    pub async fn replay_ids(
        &self,
        config: &ReplayConfig,
        ids: &[RecordingId],
    ) -> Result<ReplayStats, ReplayError> {
        let _guard = self.begin()?;
        let mut replayer = Replayer::new();
        replayer.load_by_ids(self.store.as_ref(), ids).await?;
        self.run(&replayer, config).await
    }

    async fn run(&self, replayer: &Replayer, config: &ReplayConfig) -> Result<ReplayStats, ReplayError> {
        let stats = replayer.replay_traffic(config).await?;
        *self.last_stats.lock() = Some(stats.clone());
        Ok(stats)
    }

    /// In-flight batches cannot be cancelled
    pub fn stop_replay(&self) -> Result<(), ReplayError> {
        info!("Replay stop requested");
        Err(ReplayError::NotSupported(
            "stopping an in-flight replay".to_string(),
        ))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stats of the last completed run
    pub fn last_stats(&self) -> Option<ReplayStats> {
        self.last_stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::persistence::MemoryStorage;

    use super::*;

    fn manager() -> ReplayManager {
        ReplayManager::new(Arc::new(MemoryStorage::new(0)))
    }

    #[test]
    fn stop_is_not_supported() {
        assert!(matches!(
            manager().stop_replay(),
            Err(ReplayError::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn empty_store_reports_no_recordings() {
        let m = manager();
        let err = m
            .start_replay(&ReplayConfig::new("http://localhost:1"), &RecordingQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::NoRecordings));
        assert!(!m.is_running());
        assert!(m.last_stats().is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_a_storage_error() {
        let err = manager()
            .replay_ids(&ReplayConfig::new("http://localhost:1"), &[RecordingId::new()])
            .await
            .unwrap_err();
        assert!(matches!(err, ReplayError::Storage(ref e) if e.is_not_found()));
    }

    #[test]
    fn only_one_run_at_a_time() {
        let m = manager();
        let guard = m.begin().unwrap();
        assert!(matches!(m.begin(), Err(ReplayError::AlreadyRunning)));
        drop(guard);
        assert!(m.begin().is_ok());
    }
}
