//! Domain entities - Objects with identity and lifecycle

mod chaos_action;
mod recording;
mod recording_index;

pub use chaos_action::{ChaosAction, Parameters};
pub use recording::{
    Headers, QueryParams, RecordedRequest, RecordedResponse, Recording, RecordingMetadata,
};
pub use recording_index::RecordingIndex;
