//! Traffic replay
//!
//! The [`Replayer`] resends a loaded snapshot of recordings against a target
//! under bounded concurrency; the [`ReplayManager`] wires it to a
//! [`application::ports::RecordingStore`].

mod error;
mod manager;
mod replayer;

pub use error::ReplayError;
pub use manager::ReplayManager;
pub use replayer::{ReplayConfig, ReplayStats, Replayer};
