//! Traffic recording configuration.

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Recording section of the application config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Capture exchanges
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of stored recordings before the oldest are evicted
    #[serde(default = "default_max_recordings")]
    pub max_recordings: usize,

    /// Maximum request or response body size in bytes; larger exchanges are dropped
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Filters an exchange must pass (all of them) to be recorded
    #[serde(default)]
    pub filters: Vec<RecordingFilterConfig>,

    /// If non-empty, only these headers are captured
    #[serde(default)]
    pub include_headers: Vec<String>,

    /// Headers that are never captured
    #[serde(default)]
    pub exclude_headers: Vec<String>,
}

const fn default_max_recordings() -> usize {
    10_000
}

const fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_recordings: default_max_recordings(),
            max_body_size: default_max_body_size(),
            storage: StorageConfig::default(),
            filters: Vec::new(),
            include_headers: Vec::new(),
            exclude_headers: Vec::new(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// One JSON file per recording plus `index.json`
    #[default]
    File,
    /// Process memory only
    Memory,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// On-disk file flavour; both hold indented JSON, only the extension differs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Json,
    Jsonl,
}

impl StorageFormat {
    /// File extension for recordings in this format
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,

    /// Directory for the file backend
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File format for the file backend
    #[serde(default)]
    pub format: StorageFormat,
}

fn default_directory() -> PathBuf {
    PathBuf::from("./recordings")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            directory: default_directory(),
            format: StorageFormat::default(),
        }
    }
}

/// A single capture filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingFilterConfig {
    /// Filter type: `method`, `endpoint` or `status`
    #[serde(rename = "type")]
    pub filter_type: String,

    /// Values the filter compares against
    #[serde(default)]
    pub values: Vec<String>,

    /// Invert the filter result
    #[serde(default)]
    pub negate: bool,
}

impl RecordingFilterConfig {
    /// Create a filter definition
    pub fn new(filter_type: impl Into<String>, values: &[&str], negate: bool) -> Self {
        Self {
            filter_type: filter_type.into(),
            values: values.iter().map(|v| (*v).to_string()).collect(),
            negate,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = RecordingConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.max_recordings, 10_000);
        assert_eq!(cfg.max_body_size, 1024 * 1024);
        assert_eq!(cfg.storage.storage_type, StorageType::File);
        assert_eq!(cfg.storage.format.extension(), "json");
    }

    #[test]
    fn deserializes_storage_and_filters() {
        let cfg: RecordingConfig = serde_json::from_value(json!({
            "enabled": true,
            "storage": { "type": "memory", "format": "jsonl" },
            "filters": [{ "type": "method", "values": ["GET"], "negate": true }]
        }))
        .unwrap();

        assert!(cfg.enabled);
        assert_eq!(cfg.storage.storage_type, StorageType::Memory);
        assert_eq!(cfg.storage.format, StorageFormat::Jsonl);
        assert_eq!(cfg.filters[0], RecordingFilterConfig::new("method", &["GET"], true));
    }
}
