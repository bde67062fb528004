//! Replay command

use std::sync::Arc;

use anyhow::Result;
use application::ports::RecordingStore;
use domain::RecordingId;
use infrastructure::{ReplayConfig, ReplayManager, ReplayStats, config::ReplayAppConfig};
use tracing::info;

use crate::cli::ReplayArgs;

/// Parse a `Name: value` (or `Name=value`) header override
pub fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once(':')
        .or_else(|| value.split_once('='))
        .ok_or_else(|| format!("expected 'Name: value', got '{value}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("header name must not be empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Merge command-line options over the configured replay defaults
pub fn build_config(defaults: &ReplayAppConfig, args: &ReplayArgs) -> ReplayConfig {
    let mut config = defaults.to_replay_config(args.target.clone());

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(delay) = args.delay {
        config.delay_between = delay;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if args.keep_host {
        config.replace_host = false;
    }
    if !args.preserve_headers.is_empty() {
        config.preserve_headers.clone_from(&args.preserve_headers);
    }
    for (name, value) in &args.headers {
        config.override_headers.insert(name.clone(), value.clone());
    }
    config
}

/// Replay the selected recordings and return the run statistics
///
/// Explicit ids take precedence over the query filters. An empty selection
/// is an error.
pub async fn run(
    store: Arc<dyn RecordingStore>,
    config: &ReplayConfig,
    args: &ReplayArgs,
) -> Result<ReplayStats> {
    let manager = ReplayManager::new(store);

    let stats = if args.ids.is_empty() {
        manager.start_replay(config, &args.query.to_query()).await?
    } else {
        let ids = args
            .ids
            .iter()
            .map(|id| RecordingId::parse(id))
            .collect::<Result<Vec<_>, _>>()?;
        manager.replay_ids(config, &ids).await?
    };

    info!(
        target = %config.target_url,
        total = stats.total_requests,
        failed = stats.failed_requests,
        "Replay finished"
    );
    Ok(stats)
}
