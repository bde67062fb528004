//! Mockwarden CLI
//!
//! Command-line interface for managing recordings and replaying traffic.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use anyhow::{Context, bail};
use application::ports::RecordingStore;
use clap::Parser;
use domain::RecordingId;
use infrastructure::{AppConfig, TelemetryConfig, init_tracing};
use presentation_cli::{
    Cli, Commands,
    cli::{RecordingsCommand, log_filter_from_verbosity},
    recordings, replay,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TelemetryConfig {
        log_filter: log_filter_from_verbosity(cli.verbose).to_string(),
        json: false,
    })?;

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }),
    };

    match cli.command {
        Commands::Recordings { storage, action } => {
            let store = recordings::open_store(&config, &storage).await?;
            run_recordings(&store, action).await?;
        },

        Commands::Replay(args) => {
            let store: Arc<dyn RecordingStore> =
                Arc::new(recordings::open_store(&config, &args.storage).await?);
            let replay_config = replay::build_config(&config.replay, &args);

            println!("Replaying against {}", replay_config.target_url);
            let stats = replay::run(store, &replay_config, &args).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);

            if stats.failed_requests > 0 {
                bail!("{} of {} requests failed", stats.failed_requests, stats.total_requests);
            }
        },

        Commands::Health { url } => {
            let resp = reqwest::get(format!("{url}/health")).await?;

            if resp.status().is_success() {
                let body = resp.json::<serde_json::Value>().await?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                bail!("server unhealthy: {}", resp.status());
            }
        },
    }

    Ok(())
}

async fn run_recordings(store: &dyn RecordingStore, action: RecordingsCommand) -> anyhow::Result<()> {
    match action {
        RecordingsCommand::List(query) => {
            let found = store.list(&query.to_query()).await?;
            for recording in &found {
                println!("{}", recordings::summary_line(recording));
            }
            println!("{} recording(s)", found.len());
        },

        RecordingsCommand::Show { id } => {
            let recording = store.load(&RecordingId::parse(&id)?).await?;
            println!("{}", serde_json::to_string_pretty(&recording)?);
        },

        RecordingsCommand::Delete { id } => {
            store.delete(&RecordingId::parse(&id)?).await?;
            println!("Deleted {id}");
        },

        RecordingsCommand::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all recordings without --yes");
            }
            let count = store.stats().await?.total_recordings;
            store.delete_all().await?;
            println!("Deleted {count} recording(s)");
        },

        RecordingsCommand::Stats => {
            let stats = store.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        },

        RecordingsCommand::Export { output, query } => {
            let count = recordings::export(store, &query.to_query(), &output).await?;
            println!("Exported {count} recording(s) to {}", output.display());
        },
    }

    store.close().await?;
    Ok(())
}
