//! Pointer-move coalescing
//!
//! Capture sampling can record pointer moves far denser than playback needs.
//! Before replay, runs of moves closer together than the window collapse to
//! their last sample, so the pointer still lands exactly where it did while
//! skipping redundant intermediate injections. Only moves coalesce; clicks,
//! scrolls and keys always survive.

use crate::event::types::Event;

/// Moves closer than this (in recorded seconds) to the previous kept move
/// collapse into it
pub const MOVE_COALESCE_WINDOW: f64 = 0.010;

/// Collapse dense pointer-move runs, keeping the last move of each run.
pub fn coalesce_moves(events: &[Event]) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    let mut last_move_offset = f64::NEG_INFINITY;

    for event in events {
        if event.is_pointer_move() {
            if event.offset - last_move_offset < MOVE_COALESCE_WINDOW
                && out.last().is_some_and(|prev| prev.is_pointer_move())
            {
                // within the window and directly after a kept move: replace
                *out.last_mut().unwrap() = event.clone();
            } else {
                out.push(event.clone());
            }
            last_move_offset = event.offset;
        } else {
            out.push(event.clone());
        }
    }
    out
}
