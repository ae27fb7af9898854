//! Event capture
//!
//! The capture side of the engine: per-event filtering and coalescing, the
//! bounded ingestion queue absorbing raw callback events, and the session
//! that owns listener lifecycle and the consumer thread.

pub mod filter;
pub mod queue;
pub mod session;

pub use filter::CaptureFilter;
pub use queue::{ingestion_queue, IngestionQueue, QueueConsumer, QueueStats, DEFAULT_QUEUE_CAPACITY};
pub use session::CaptureSession;
