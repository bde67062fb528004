//! Domain layer for Mockwarden
//!
//! Contains the captured-traffic entities, chaos actions, value objects and
//! domain errors. This layer knows nothing about HTTP servers, storage or
//! configuration files.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
