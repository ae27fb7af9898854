//! # Replaykit
//!
//! An input capture-and-replay engine. Records a timestamped sequence of
//! pointer and keyboard events from the operating system's input layer,
//! stores it as an ordered log, and later replays the log by synthesizing
//! equivalent input events with faithful timing, adjustable speed, and
//! automatic cancellation when a live user interrupts playback.
//!
//! ## Overview
//!
//! OS hooking and event injection are consumed as capabilities: anything
//! that implements [`hook::InputHook`] can feed the capture pipeline, and
//! anything that implements [`hook::InputInjector`] can receive synthesized
//! events during playback. The crate ships no OS backends; network
//! transport, on-disk persistence and process bootstrap are likewise
//! external collaborators that drive the [`engine::Engine`] surface.
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌───────────┐    ┌─────────────┐    ┌───────────┐
//! │  InputHook   │───▶│  Capture  │───▶│  Ingestion  │───▶│ Event Log │
//! │ (callbacks)  │    │  Filter   │    │   Queue     │    │ (ordered) │
//! └──────────────┘    └───────────┘    └─────────────┘    └───────────┘
//!                                                               │
//!                                                               ▼
//! ┌──────────────┐    ┌───────────┐    ┌─────────────────────────────┐
//! │InputInjector │◀───│  Player   │◀───│  Coalescing + Scheduling    │
//! └──────────────┘    └───────────┘    └─────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use replaykit::app::config::Config;
//! use replaykit::engine::Engine;
//! use replaykit::hook::{NullHook, TraceInjector};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let engine = Engine::new(Arc::new(NullHook::new()), Arc::new(TraceInjector), &config)
//!     .expect("engine should start");
//!
//! engine.start_capture(config.capture.clone()).expect("capture should start");
//! // ... OS callbacks feed events through the hook ...
//! let count = engine.stop_capture().expect("capture should stop");
//! println!("captured {count} events");
//! ```

pub mod app;
pub mod broadcast;
pub mod capture;
pub mod engine;
pub mod event;
pub mod hook;
pub mod playback;
pub mod status;
pub mod worker;

// Re-export commonly used types
pub use app::config::CaptureConfig;
pub use engine::Engine;
pub use event::log::EventLog;
pub use event::types::{Button, Event, EventKind, Key};
pub use hook::{InputHook, InputInjector};
pub use status::StatusSnapshot;

/// Result type alias for the replay engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the replay engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a capture session is already active")]
    AlreadyCapturing,

    #[error("no capture session is active")]
    NotCapturing,

    #[error("a playback session is already active")]
    AlreadyPlaying,

    #[error("no playback session is active")]
    NoActivePlayback,

    #[error("the event log is empty")]
    EmptyLog,

    #[error("invalid playback speed: {0} (must be finite and > 0)")]
    InvalidSpeed(f64),

    #[error("corrupt event log: {0}")]
    CorruptLog(String),

    #[error("log payload is not an event sequence: {0}")]
    TypeMismatch(String),

    #[error("{0} exceeded its time bound")]
    Timeout(&'static str),

    #[error("input hook error: {0}")]
    Hook(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
