//! Command-line definitions

use std::{path::PathBuf, time::Duration};

use application::ports::RecordingQuery;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use infrastructure::config::StorageFormat;

use crate::replay::parse_header;

/// Mockwarden CLI
#[derive(Debug, Parser)]
#[command(name = "mockwarden-cli")]
#[command(author, version, about = "Mockwarden recording and replay CLI", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (defaults to MOCKWARDEN_CONFIG, then ./config.*)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect and manage stored recordings
    Recordings {
        #[command(flatten)]
        storage: StorageArgs,

        #[command(subcommand)]
        action: RecordingsCommand,
    },

    /// Replay stored recordings against a target server
    ///
    /// Example: mockwarden-cli replay http://staging:8080 --method GET --concurrency 4
    Replay(ReplayArgs),

    /// Check that a running server is healthy
    Health {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum RecordingsCommand {
    /// List recordings, newest first
    List(QueryArgs),

    /// Print a full recording as JSON
    Show {
        /// Recording id
        id: String,
    },

    /// Delete a recording
    Delete {
        /// Recording id
        id: String,
    },

    /// Delete every recording
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },

    /// Show storage statistics
    Stats,

    /// Write matching recordings to a single JSON file
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Location of the recording directory
#[derive(Debug, Clone, Default, Args)]
pub struct StorageArgs {
    /// Recording directory (defaults to the configured one)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Recording file format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Jsonl,
}

impl From<FormatArg> for StorageFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => Self::Json,
            FormatArg::Jsonl => Self::Jsonl,
        }
    }
}

/// Recording selection
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// Only this HTTP method
    #[arg(long)]
    pub method: Option<String>,

    /// Only URIs containing this text
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Only this response status
    #[arg(long)]
    pub status: Option<u16>,

    /// Only recordings captured at or after this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub since: Option<DateTime<Utc>>,

    /// Only recordings captured at or before this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub until: Option<DateTime<Utc>>,

    /// Maximum number of recordings
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of matching recordings to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

impl QueryArgs {
    pub fn to_query(&self) -> RecordingQuery {
        RecordingQuery {
            start_time: self.since,
            end_time: self.until,
            method: self.method.clone(),
            endpoint: self.endpoint.clone(),
            status: self.status,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Replay options; unset values fall back to the `[replay]` config section
#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Base URL of the server receiving the traffic
    pub target: String,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Replay only these recording ids, in order (repeatable)
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Maximum in-flight requests
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Pause between launching requests (e.g. "100ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub delay: Option<Duration>,

    /// Per-request timeout (e.g. "5s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Send to the recorded URI instead of the target host
    #[arg(long)]
    pub keep_host: bool,

    /// Only replay these recorded headers (repeatable)
    #[arg(long = "preserve-header")]
    pub preserve_headers: Vec<String>,

    /// Force a header onto every request, as "Name: value" (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

/// Log filter for a verbosity count
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
