//! Live event broadcast
//!
//! Fans captured events out to interested subscribers while a capture
//! session is active. Subscribers hold the receiving end of a bounded
//! channel; a slow subscriber loses messages rather than stalling the
//! capture consumer, and a disconnected one is pruned on the next publish.

use crate::event::types::{Button, Event, EventKind, Key};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Bounded per-subscriber buffer depth
const SUBSCRIBER_BUFFER: usize = 256;

/// A captured event in wire shape, as delivered to live subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    PointerMove { offset: f64, x: i32, y: i32 },
    PointerButton {
        offset: f64,
        x: i32,
        y: i32,
        button: Button,
        pressed: bool,
    },
    Scroll {
        offset: f64,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
    KeyPress { offset: f64, key: Key },
    KeyRelease { offset: f64, key: Key },
}

impl From<&Event> for LiveEvent {
    fn from(event: &Event) -> Self {
        let offset = event.offset;
        match &event.kind {
            EventKind::PointerMove { x, y } => LiveEvent::PointerMove {
                offset,
                x: *x,
                y: *y,
            },
            EventKind::PointerButton {
                x,
                y,
                button,
                pressed,
            } => LiveEvent::PointerButton {
                offset,
                x: *x,
                y: *y,
                button: *button,
                pressed: *pressed,
            },
            EventKind::Scroll { x, y, dx, dy } => LiveEvent::Scroll {
                offset,
                x: *x,
                y: *y,
                dx: *dx,
                dy: *dy,
            },
            EventKind::KeyPress { key } => LiveEvent::KeyPress {
                offset,
                key: key.clone(),
            },
            EventKind::KeyRelease { key } => LiveEvent::KeyRelease {
                offset,
                key: key.clone(),
            },
        }
    }
}

/// Opaque identifier for a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

/// Fan-out hub for live capture events
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<Vec<(SubscriberId, Sender<LiveEvent>)>>,
    next_id: AtomicU64,
    active: AtomicBool,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. The returned receiver sees events published
    /// while a capture session is active.
    pub fn register(&self) -> (SubscriberId, Receiver<LiveEvent>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        self.subscribers.lock().push((id, tx));
        (id, rx)
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unregister(&self, id: SubscriberId) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id);
    }

    /// Gate publishing on capture session boundaries.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an event to every live subscriber. No-op outside an active
    /// capture session. A full subscriber buffer drops that message only;
    /// a disconnected subscriber is removed.
    pub fn publish(&self, event: LiveEvent) {
        if !self.is_active() {
            return;
        }
        self.subscribers.lock().retain(|(id, tx)| {
            match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => {
                    debug!(id = id.0, "broadcast subscriber disconnected, removing");
                    false
                }
            }
        });
    }
}
