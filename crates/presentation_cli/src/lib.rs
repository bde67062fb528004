//! Mockwarden command-line interface
//!
//! Offline access to a recording directory and replay of stored traffic.

pub mod cli;
pub mod recordings;
pub mod replay;

pub use cli::{Cli, Commands};
