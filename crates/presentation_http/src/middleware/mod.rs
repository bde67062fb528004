//! HTTP middleware components
//!
//! Layer order from the outside in: request id, recording, chaos. Admin
//! endpoints bypass chaos and recording.

pub mod chaos;
pub mod exchange;
pub mod recording;
pub mod request_id;

pub use chaos::{ChaosLayer, ChaosMarker};
pub use recording::RecordingLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};

/// Path prefix of the admin API
pub const ADMIN_PREFIX: &str = "/__admin";

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/__admin/")
}
