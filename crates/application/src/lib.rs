//! Application layer - Ports shared by the engines and their hosts
//!
//! Defines the exchange capability surface that the HTTP layer hands to the
//! chaos and recording engines, and the storage port that recording
//! backends implement.

pub mod error;
pub mod ports;

pub use error::ApplicationError;
pub use ports::*;
