//! Event playback
//!
//! Replays an event log against an injector: pre-replay coalescing of dense
//! pointer-move runs, wall-clock scheduling against a speed-scaled timeline,
//! and an interrupt watcher that aborts on real user input.

pub mod coalesce;
pub mod player;

pub use coalesce::coalesce_moves;
pub use player::{FinishCallback, PlaybackOutcome, Player};
