//! Event model
//!
//! The immutable value types for captured actions, the versioned binary
//! codec, and the ordered event log.

pub mod codec;
pub mod log;
pub mod types;

pub use log::EventLog;
pub use types::{Button, Event, EventKind, Key, COORD_MAX};
