//! Traffic capture
//!
//! The [`RecordingEngine`] turns finished exchanges into [`domain::Recording`]s,
//! runs them through the configured [`Filter`] chain and body-size cap, and
//! hands the survivors to a [`application::ports::RecordingStore`].

mod engine;
mod error;
mod filters;

pub use engine::{RecordingEngine, RecordingStats};
pub use error::RecordingError;
pub use filters::{
    EndpointFilter, Filter, MethodFilter, StatusFilter, build_filter, build_filters,
};
