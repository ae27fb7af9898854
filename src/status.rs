//! Debounced status reporting
//!
//! Status is polled far more often than it changes, so snapshots are cached
//! for a short window and recomputed lazily. State transitions invalidate
//! the cache so the next poll observes them immediately. The cache has its
//! own lock; computing a fresh snapshot takes the engine's locks, never the
//! other way round.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default snapshot reuse window
pub const STATUS_DEBOUNCE: Duration = Duration::from_millis(100);

/// Point-in-time view of the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub capturing: bool,
    pub playing: bool,
    pub has_recording: bool,
    pub speed: f64,
    pub duration_seconds: f64,
    pub event_count: usize,
    /// Serialized size of the saved log; 0 while a capture is in progress
    pub log_size_bytes: usize,
    /// Captured events per second over the recording's duration
    pub effective_fps: f64,
}

struct Cached {
    snapshot: StatusSnapshot,
    computed_at: Instant,
}

/// Time-bounded snapshot cache
pub struct StatusCache {
    debounce: Duration,
    cached: Mutex<Option<Cached>>,
}

impl StatusCache {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached snapshot if fresh, otherwise recompute and cache.
    pub fn snapshot(&self, recompute: impl FnOnce() -> StatusSnapshot) -> StatusSnapshot {
        let mut cached = self.cached.lock();
        if let Some(entry) = cached.as_ref() {
            if entry.computed_at.elapsed() < self.debounce {
                return entry.snapshot.clone();
            }
        }
        let snapshot = recompute();
        *cached = Some(Cached {
            snapshot: snapshot.clone(),
            computed_at: Instant::now(),
        });
        snapshot
    }

    /// Drop the cached snapshot so the next poll recomputes.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snap(count: usize) -> StatusSnapshot {
        StatusSnapshot {
            event_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_snapshot_reused() {
        let cache = StatusCache::new(Duration::from_secs(60));
        assert_eq!(cache.snapshot(|| snap(1)).event_count, 1);
        // within the window the closure must not run
        assert_eq!(cache.snapshot(|| unreachable!()).event_count, 1);
    }

    #[test]
    fn test_stale_snapshot_recomputed() {
        let cache = StatusCache::new(Duration::from_millis(10));
        assert_eq!(cache.snapshot(|| snap(1)).event_count, 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.snapshot(|| snap(2)).event_count, 2);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let cache = StatusCache::new(Duration::from_secs(60));
        assert_eq!(cache.snapshot(|| snap(1)).event_count, 1);
        cache.invalidate();
        assert_eq!(cache.snapshot(|| snap(2)).event_count, 2);
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let json = serde_json::to_value(snap(7)).unwrap();
        assert_eq!(json["event_count"], 7);
        assert_eq!(json["capturing"], false);
        assert_eq!(json["effective_fps"], 0.0);
    }
}
