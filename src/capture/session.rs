//! Capture session lifecycle
//!
//! One session owns a hook subscription, a filter, the ingestion queue, the
//! consumer thread, and a private event log. The hook callback path does the
//! minimum: stamp the offset, run the filter, offer to the queue, mirror
//! accepted events to live subscribers. Stopping unsubscribes first, then
//! pushes the stop sentinel so the consumer drains everything already queued,
//! and hands the finished log back to the caller. Keeping the log private to
//! the session means a teardown in progress can never leak events into a
//! session started after it.

use crate::app::config::CaptureConfig;
use crate::broadcast::{BroadcastHub, LiveEvent};
use crate::capture::filter::CaptureFilter;
use crate::capture::queue::{ingestion_queue, Drained, IngestionQueue, QueueStats};
use crate::event::log::EventLog;
use crate::event::types::Event;
use crate::hook::{HookHandle, InputHook, RawInput};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// An active capture session
pub struct CaptureSession {
    hook: Arc<dyn InputHook>,
    handle: HookHandle,
    queue: IngestionQueue,
    consumer: Option<JoinHandle<()>>,
    log: Arc<Mutex<EventLog>>,
    started_at: Instant,
}

impl CaptureSession {
    /// Subscribe to the hook and start the consumer thread. Captured events
    /// accumulate in a log owned by this session until [`stop`] hands it
    /// back.
    ///
    /// [`stop`]: CaptureSession::stop
    pub fn start(
        hook: Arc<dyn InputHook>,
        config: CaptureConfig,
        queue_capacity: usize,
        broadcast: Arc<BroadcastHub>,
    ) -> crate::Result<Self> {
        let log = Arc::new(Mutex::new(EventLog::new()));
        let (queue, consumer_rx) = ingestion_queue(queue_capacity);
        let started_at = Instant::now();

        let filter = Mutex::new(CaptureFilter::new(config));
        let producer = queue.clone();
        let callback_broadcast = Arc::clone(&broadcast);
        let handle = hook.subscribe(Arc::new(move |raw: RawInput| {
            let now = Instant::now();
            let Some(kind) = filter.lock().accept(raw, now) else {
                return;
            };
            let event = Event {
                offset: now.duration_since(started_at).as_secs_f64(),
                kind,
            };
            // the live mirror only sees events the queue accepted
            if producer.offer(event.clone()) {
                callback_broadcast.publish(LiveEvent::from(&event));
            }
        }))?;

        let consumer_log = Arc::clone(&log);
        let consumer = thread::Builder::new()
            .name("capture-consumer".into())
            .spawn(move || loop {
                match consumer_rx.poll() {
                    Drained::Event(event) => consumer_log.lock().push(event),
                    Drained::Idle => {}
                    Drained::Stopped => break,
                }
            });
        let consumer = match consumer {
            Ok(consumer) => consumer,
            Err(err) => {
                // the subscription must not outlive a session that never ran
                hook.unsubscribe(handle);
                return Err(err.into());
            }
        };

        info!(queue_capacity, "capture session started");
        Ok(Self {
            hook,
            handle,
            queue,
            consumer: Some(consumer),
            log,
            started_at,
        })
    }

    /// When this session's clock started
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Events drained into this session's log so far
    pub fn captured_len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        self.queue.stats()
    }

    /// Tear the session down and hand back the finished log.
    ///
    /// Order matters: unsubscribing first stops new offers, then the stop
    /// sentinel guarantees everything already queued is drained before the
    /// consumer exits.
    pub fn stop(mut self) -> EventLog {
        self.hook.unsubscribe(self.handle);
        self.queue.signal_stop();
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                warn!("capture consumer thread panicked");
            }
        }
        let finished = std::mem::take(&mut *self.log.lock());
        let stats = self.queue.stats();
        debug!(
            count = finished.len(),
            dropped = stats.dropped.load(std::sync::atomic::Ordering::Relaxed),
            "capture session stopped"
        );
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::{Button, Key};
    use crate::Result;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// A hook fake that lets tests push raw inputs through real callbacks.
    #[derive(Default)]
    struct FakeHook {
        callbacks: Mutex<Vec<(HookHandle, crate::hook::HookCallback)>>,
        next: AtomicU64,
    }

    impl FakeHook {
        fn emit(&self, raw: RawInput) {
            let callbacks: Vec<_> = self
                .callbacks
                .lock()
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            for cb in callbacks {
                cb(raw.clone());
            }
        }
    }

    impl InputHook for FakeHook {
        fn subscribe(&self, callback: crate::hook::HookCallback) -> Result<HookHandle> {
            let handle = HookHandle(self.next.fetch_add(1, Ordering::Relaxed));
            self.callbacks.lock().push((handle, callback));
            Ok(handle)
        }

        fn unsubscribe(&self, handle: HookHandle) {
            self.callbacks.lock().retain(|(h, _)| *h != handle);
        }
    }

    fn permissive_config() -> CaptureConfig {
        CaptureConfig {
            capture_move: true,
            capture_click: true,
            capture_keyboard: true,
            smart_capture: false,
            sample_rate_hz: 144,
        }
    }

    fn start_session(hook: &Arc<FakeHook>) -> (CaptureSession, Arc<BroadcastHub>) {
        let broadcast = Arc::new(BroadcastHub::new());
        let session = CaptureSession::start(
            Arc::clone(hook) as Arc<dyn InputHook>,
            permissive_config(),
            1024,
            Arc::clone(&broadcast),
        )
        .unwrap();
        (session, broadcast)
    }

    #[test]
    fn test_captures_clicks_and_keys() {
        let hook = Arc::new(FakeHook::default());
        let (session, _broadcast) = start_session(&hook);

        hook.emit(RawInput::Button {
            x: 10,
            y: 20,
            button: Button::Left,
            pressed: true,
        });
        hook.emit(RawInput::Button {
            x: 10,
            y: 20,
            button: Button::Left,
            pressed: false,
        });
        hook.emit(RawInput::Key {
            key: Key::Char('z'),
            pressed: true,
        });

        assert_eq!(session.stop().len(), 3);
    }

    #[test]
    fn test_stop_flushes_pending_events() {
        let hook = Arc::new(FakeHook::default());
        let (session, _broadcast) = start_session(&hook);

        for _ in 0..50 {
            hook.emit(RawInput::Key {
                key: Key::Char('x'),
                pressed: true,
            });
            hook.emit(RawInput::Key {
                key: Key::Char('x'),
                pressed: false,
            });
        }

        // every emit fit in the queue; stop itself must drain them all,
        // regardless of how far the consumer got before it
        let stats = session.stats();
        assert_eq!(stats.offered.load(Ordering::Relaxed), 100);
        assert_eq!(stats.dropped.load(Ordering::Relaxed), 0);
        assert_eq!(session.stop().len(), 100);
    }

    #[test]
    fn test_offsets_are_non_decreasing() {
        let hook = Arc::new(FakeHook::default());
        let (session, _broadcast) = start_session(&hook);

        hook.emit(RawInput::Key {
            key: Key::Char('a'),
            pressed: true,
        });
        thread::sleep(Duration::from_millis(5));
        hook.emit(RawInput::Key {
            key: Key::Char('a'),
            pressed: false,
        });

        let log = session.stop();
        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].offset >= 0.0);
        assert!(events[1].offset >= events[0].offset);
    }

    #[test]
    fn test_stop_detaches_the_subscription() {
        let hook = Arc::new(FakeHook::default());
        let (session, _broadcast) = start_session(&hook);

        hook.emit(RawInput::Key {
            key: Key::Char('a'),
            pressed: true,
        });
        assert_eq!(session.stop().len(), 1);
        assert!(hook.callbacks.lock().is_empty());
    }

    #[test]
    fn test_captured_len_tracks_drained_events() {
        let hook = Arc::new(FakeHook::default());
        let (session, _broadcast) = start_session(&hook);

        hook.emit(RawInput::Key {
            key: Key::Char('a'),
            pressed: true,
        });
        hook.emit(RawInput::Key {
            key: Key::Char('a'),
            pressed: false,
        });

        // draining is asynchronous; both events must land within the
        // consumer's poll latency
        let deadline = Instant::now() + Duration::from_secs(2);
        while session.captured_len() < 2 {
            assert!(Instant::now() < deadline, "consumer never drained");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(session.stop().len(), 2);
    }

    #[test]
    fn test_accepted_events_mirrored_to_broadcast() {
        let hook = Arc::new(FakeHook::default());
        let (session, broadcast) = start_session(&hook);
        broadcast.set_active(true);
        let (_id, rx) = broadcast.register();

        hook.emit(RawInput::Button {
            x: 1,
            y: 2,
            button: Button::Right,
            pressed: true,
        });

        let live = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(matches!(live, LiveEvent::PointerButton { .. }));
        session.stop();
    }
}
