//! Recording storage port
//!
//! Defines the interface for persisting and querying captured exchanges.
//! Implementations may keep recordings on disk (one file per recording plus
//! an index) or purely in memory.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Recording, RecordingId};
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Port for recording persistence
#[async_trait]
pub trait RecordingStore: Send + Sync + fmt::Debug {
    /// Persist a recording
    async fn save(&self, recording: &Recording) -> Result<(), ApplicationError>;

    /// Load a single recording by id
    ///
    /// Returns `ApplicationError::NotFound` if the id is unknown.
    async fn load(&self, id: &RecordingId) -> Result<Recording, ApplicationError>;

    /// List recordings matching the query, newest first
    async fn list(&self, query: &RecordingQuery) -> Result<Vec<Recording>, ApplicationError>;

    /// Delete a single recording
    async fn delete(&self, id: &RecordingId) -> Result<(), ApplicationError>;

    /// Delete every recording
    async fn delete_all(&self) -> Result<(), ApplicationError>;

    /// Aggregate statistics over the stored recordings
    async fn stats(&self) -> Result<StorageStats, ApplicationError>;

    /// Release resources held by the store
    async fn close(&self) -> Result<(), ApplicationError>;
}

/// Query parameters for listing recordings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingQuery {
    /// Only recordings captured at or after this instant
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Only recordings captured at or before this instant
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Only this method (case-insensitive)
    #[serde(default)]
    pub method: Option<String>,
    /// Only URIs containing this substring
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Only this response status
    #[serde(default)]
    pub status: Option<u16>,
    /// Number of matches to skip after sorting
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of matches to return
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecordingQuery {
    /// Create an empty query matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a method
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Restrict to URIs containing a substring
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Restrict to a response status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a capture time window
    #[must_use]
    pub const fn with_time_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Set offset and limit
    #[must_use]
    pub const fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Check the summary fields of a recording against the query
    pub fn matches(&self, timestamp: DateTime<Utc>, method: &str, uri: &str, status: u16) -> bool {
        if self.start_time.is_some_and(|start| timestamp < start) {
            return false;
        }
        if self.end_time.is_some_and(|end| timestamp > end) {
            return false;
        }
        if let Some(ref wanted) = self.method {
            if !wanted.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if let Some(ref endpoint) = self.endpoint {
            if !uri.contains(endpoint.as_str()) {
                return false;
            }
        }
        self.status.is_none_or(|wanted| wanted == status)
    }

    /// Apply offset and limit to an already sorted list
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Storage statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Backend name (`file` or `memory`)
    pub storage_type: String,
    /// Number of stored recordings
    pub total_recordings: usize,
    /// Approximate size in bytes
    pub total_size_bytes: u64,
    /// Timestamp of the oldest recording
    pub oldest_recording: Option<DateTime<Utc>>,
    /// Timestamp of the newest recording
    pub newest_recording: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = RecordingQuery::new();
        assert!(q.matches(at(0), "GET", "/anything", 200));
    }

    #[test]
    fn method_match_is_case_insensitive() {
        let q = RecordingQuery::new().with_method("post");
        assert!(q.matches(at(0), "POST", "/", 200));
        assert!(!q.matches(at(0), "GET", "/", 200));
    }

    #[test]
    fn endpoint_is_substring() {
        let q = RecordingQuery::new().with_endpoint("/users");
        assert!(q.matches(at(0), "GET", "/api/users/1?x=1", 200));
        assert!(!q.matches(at(0), "GET", "/api/orders", 200));
    }

    #[test]
    fn status_and_time_range() {
        let q = RecordingQuery::new()
            .with_status(404)
            .with_time_range(Some(at(10)), Some(at(20)));
        assert!(q.matches(at(15), "GET", "/", 404));
        assert!(!q.matches(at(15), "GET", "/", 200));
        assert!(!q.matches(at(5), "GET", "/", 404));
        assert!(!q.matches(at(20) + Duration::seconds(1), "GET", "/", 404));
    }

    #[test]
    fn paginate_applies_offset_then_limit() {
        let q = RecordingQuery::new().with_page(1, Some(2));
        assert_eq!(q.paginate(vec![1, 2, 3, 4]), vec![2, 3]);
        let q = RecordingQuery::new().with_page(3, None);
        assert_eq!(q.paginate(vec![1, 2, 3, 4]), vec![4]);
    }
}
