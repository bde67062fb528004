//! Port definitions for application layer
//!
//! Ports are interfaces that define how the engines interact with the
//! outside world. The HTTP layer supplies exchanges; storage adapters in the
//! infrastructure layer implement the recording store.

mod exchange;
mod recording_store;

pub use exchange::{
    CHAOS_APPLIED_KEY, CHAOS_SCENARIO_KEY, Exchange, HttpExchange, REQUEST_ID_KEY,
};
pub use recording_store::{RecordingQuery, RecordingStore, StorageStats};
