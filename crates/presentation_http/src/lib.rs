//! Mockwarden HTTP presentation layer
//!
//! Serves mock responses and wraps every request in the chaos and
//! recording middleware.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use middleware::{ChaosLayer, RecordingLayer, RequestIdLayer};
pub use routes::create_router;
pub use state::AppState;
