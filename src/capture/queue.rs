//! Bounded ingestion queue
//!
//! A bounded FIFO absorbing events from any number of producer threads (OS
//! callback threads) and drained by exactly one consumer thread. `offer` is
//! non-blocking: when the queue is full the event is dropped silently —
//! explicit lossy backpressure, trading completeness for low latency in the
//! callback path. The consumer blocks with a short timeout and exits on a
//! stop sentinel or when every producer handle is gone.

use crate::event::types::Event;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// How long the consumer blocks waiting for an item before re-checking
pub const CONSUMER_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// How long `signal_stop` may wait for sentinel space before giving up
const STOP_SEND_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum QueueItem {
    Event(Event),
    Stop,
}

/// Queue counters for monitoring backpressure
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Events accepted into the queue
    pub offered: AtomicU64,
    /// Events dropped because the queue was full
    pub dropped: AtomicU64,
    /// Events handed to the consumer
    pub drained: AtomicU64,
}

/// Result of one consumer poll
#[derive(Debug)]
pub enum Drained {
    /// An event is ready
    Event(Event),
    /// Poll timeout elapsed with nothing queued
    Idle,
    /// Stop sentinel received or all producers disconnected
    Stopped,
}

/// Producer side. Cloneable; one clone per callback thread is typical.
#[derive(Clone)]
pub struct IngestionQueue {
    tx: Sender<QueueItem>,
    stats: Arc<QueueStats>,
}

/// Consumer side, held by exactly one thread.
pub struct QueueConsumer {
    rx: Receiver<QueueItem>,
    stats: Arc<QueueStats>,
}

/// Create a bounded producer/consumer pair.
pub fn ingestion_queue(capacity: usize) -> (IngestionQueue, QueueConsumer) {
    let (tx, rx) = bounded(capacity);
    let stats = Arc::new(QueueStats::default());
    (
        IngestionQueue {
            tx,
            stats: Arc::clone(&stats),
        },
        QueueConsumer { rx, stats },
    )
}

impl IngestionQueue {
    /// Non-blocking submit. Returns false if the event was dropped (queue
    /// full or consumer gone).
    pub fn offer(&self, event: Event) -> bool {
        match self.tx.try_send(QueueItem::Event(event)) {
            Ok(()) => {
                self.stats.offered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("ingestion queue full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Enqueue the stop sentinel. FIFO ordering guarantees every event
    /// offered before this call is drained before the consumer exits, which
    /// is how capture stop flushes in-flight events. Bounded wait: if the
    /// consumer is gone the sentinel is abandoned.
    pub fn signal_stop(&self) {
        let _ = self.tx.send_timeout(QueueItem::Stop, STOP_SEND_TIMEOUT);
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

impl QueueConsumer {
    /// Block up to [`CONSUMER_POLL_TIMEOUT`] for the next item.
    pub fn poll(&self) -> Drained {
        match self.rx.recv_timeout(CONSUMER_POLL_TIMEOUT) {
            Ok(QueueItem::Event(event)) => {
                self.stats.drained.fetch_add(1, Ordering::Relaxed);
                Drained::Event(event)
            }
            Ok(QueueItem::Stop) => Drained::Stopped,
            Err(RecvTimeoutError::Timeout) => Drained::Idle,
            Err(RecvTimeoutError::Disconnected) => Drained::Stopped,
        }
    }
}
