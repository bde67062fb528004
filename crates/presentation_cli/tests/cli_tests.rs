//! Command-line parsing tests
#![allow(clippy::panic, clippy::unwrap_used)]

use std::path::PathBuf;

use clap::Parser;
use presentation_cli::{
    Cli, Commands,
    cli::{FormatArg, RecordingsCommand},
};

fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args.iter().copied())
}

#[test]
fn cli_requires_subcommand() {
    assert!(parse_args(&["mockwarden-cli"]).is_err());
}

#[test]
fn recordings_list_with_filters() {
    let cli = parse_args(&[
        "mockwarden-cli",
        "recordings",
        "--dir",
        "/tmp/recs",
        "--format",
        "jsonl",
        "list",
        "--method",
        "POST",
        "--status",
        "201",
        "--limit",
        "5",
    ])
    .unwrap();

    let Commands::Recordings { storage, action } = cli.command else {
        panic!("Expected Recordings command");
    };
    assert_eq!(storage.dir, Some(PathBuf::from("/tmp/recs")));
    assert_eq!(storage.format, Some(FormatArg::Jsonl));
    let RecordingsCommand::List(query) = action else {
        panic!("Expected List action");
    };
    assert_eq!(query.method.as_deref(), Some("POST"));
    assert_eq!(query.status, Some(201));
    assert_eq!(query.limit, Some(5));
    assert_eq!(query.offset, 0);
}

#[test]
fn recordings_show_requires_id() {
    assert!(parse_args(&["mockwarden-cli", "recordings", "show"]).is_err());
}

#[test]
fn recordings_clear_defaults_to_unconfirmed() {
    let cli = parse_args(&["mockwarden-cli", "recordings", "clear"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Recordings {
            action: RecordingsCommand::Clear { yes: false },
            ..
        }
    ));
}

#[test]
fn export_requires_output() {
    assert!(parse_args(&["mockwarden-cli", "recordings", "export"]).is_err());
    let cli = parse_args(&["mockwarden-cli", "recordings", "export", "-o", "out.json"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Recordings {
            action: RecordingsCommand::Export { .. },
            ..
        }
    ));
}

#[test]
fn replay_requires_target() {
    assert!(parse_args(&["mockwarden-cli", "replay"]).is_err());
}

#[test]
fn replay_collects_repeated_options() {
    let cli = parse_args(&[
        "mockwarden-cli",
        "replay",
        "http://localhost:9000",
        "--id",
        "0190a5c8-0000-7000-8000-000000000001",
        "--id",
        "0190a5c8-0000-7000-8000-000000000002",
        "--header",
        "x-a: 1",
        "--header",
        "x-b: 2",
    ])
    .unwrap();

    let Commands::Replay(args) = cli.command else {
        panic!("Expected Replay command");
    };
    assert_eq!(args.target, "http://localhost:9000");
    assert_eq!(args.ids.len(), 2);
    assert_eq!(args.headers.len(), 2);
    assert_eq!(args.headers[1], ("x-b".to_string(), "2".to_string()));
}

#[test]
fn replay_rejects_bad_duration() {
    let result = parse_args(&["mockwarden-cli", "replay", "http://t", "--delay", "soon"]);
    assert!(result.is_err());
}

#[test]
fn health_uses_default_url() {
    let cli = parse_args(&["mockwarden-cli", "health"]).unwrap();
    let Commands::Health { url } = cli.command else {
        panic!("Expected Health command");
    };
    assert_eq!(url, "http://localhost:8080");
}

#[test]
fn verbose_and_config_are_global() {
    let cli = parse_args(&["mockwarden-cli", "health", "-vv", "--config", "mw.toml"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config, Some(PathBuf::from("mw.toml")));
}
