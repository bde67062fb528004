//! Captured request/response exchange
//!
//! A [`Recording`] is created once per captured exchange and is immutable
//! afterwards. Bodies are kept as raw bytes and serialized as base64 so that
//! binary payloads survive a round trip through the JSON storage format.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RecordingId;

/// Header map keyed by lowercase header name
pub type Headers = BTreeMap<String, String>;

/// Query parameters, one entry per key with every value in request order
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// The request half of a captured exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method (upper case)
    pub method: String,
    /// Request URI including the query string
    pub uri: String,
    /// Headers surviving the include/exclude lists
    #[serde(default)]
    pub headers: Headers,
    /// Raw request body
    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
    /// Decoded query parameters
    #[serde(default)]
    pub query_params: QueryParams,
    /// Request content type, empty when absent
    #[serde(default)]
    pub content_type: String,
}

/// The response half of a captured exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers surviving the include/exclude lists
    #[serde(default)]
    pub headers: Headers,
    /// Raw response body
    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
    /// Response content type, empty when absent
    #[serde(default)]
    pub content_type: String,
}

/// Contextual information captured alongside an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Client address as seen by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// Client user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Correlation id propagated through the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Whether a chaos scenario altered this exchange
    #[serde(default)]
    pub chaos_applied: bool,
    /// Name of the chaos scenario that was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaos_scenario: Option<String>,
}

/// A single captured request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier
    pub id: RecordingId,
    /// When the exchange was captured
    pub timestamp: DateTime<Utc>,
    /// Time spent handling the request
    #[serde(with = "duration_nanos")]
    pub duration: Duration,
    /// Captured request
    pub request: RecordedRequest,
    /// Captured response
    pub response: RecordedResponse,
    /// Capture metadata
    #[serde(default)]
    pub metadata: RecordingMetadata,
}

impl Recording {
    /// Create a new recording stamped with a fresh id and the current time
    pub fn new(request: RecordedRequest, response: RecordedResponse, duration: Duration) -> Self {
        Self {
            id: RecordingId::new(),
            timestamp: Utc::now(),
            duration,
            request,
            response,
            metadata: RecordingMetadata::default(),
        }
    }

    /// Attach capture metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: RecordingMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the capture timestamp
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Request method
    pub fn method(&self) -> &str {
        &self.request.method
    }

    /// Request URI
    pub fn uri(&self) -> &str {
        &self.request.uri
    }

    /// Response status
    pub const fn status(&self) -> u16 {
        self.response.status
    }
}

mod base64_body {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
