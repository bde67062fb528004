//! Value objects - Immutable types defined by their attributes

mod recording_id;

pub use recording_id::RecordingId;
