//! Engine orchestration
//!
//! The engine owns every moving part and exposes the operation surface:
//! capture start/stop, playback start/stop, speed, status, and log
//! export/import. Session state sits behind one mutex, the log behind
//! another, and the rule that keeps this deadlock-free is simple: thread
//! joins, status invalidation and finish callbacks all happen after the
//! state lock is released, never under it.
//!
//! Capture and playback are independent sessions and may run concurrently;
//! each operation guards only against a second session of its own kind.

use crate::app::config::Config;
use crate::broadcast::{BroadcastHub, LiveEvent, SubscriberId};
use crate::capture::CaptureSession;
use crate::event::log::EventLog;
use crate::hook::{InputHook, InputInjector};
use crate::playback::{PlaybackOutcome, Player};
use crate::status::{StatusCache, StatusSnapshot};
use crate::worker::WorkerPool;
use crate::CaptureConfig;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// Default playback speed multiplier
pub const DEFAULT_SPEED: f64 = 1.0;

struct SessionState {
    capture: Option<CaptureSession>,
    player: Option<Player>,
    /// Speed applied to the next playback run; a run in progress keeps the
    /// speed it started with
    speed: f64,
    /// Recording generation, bumped by `start_capture` and `import_log`.
    /// A finished capture installs its log and serialized bytes only while
    /// the epoch it started under is still current, so a teardown that
    /// overlaps a restart or an import can never clobber the newer
    /// recording.
    epoch: u64,
}

struct Shared {
    state: Mutex<SessionState>,
    /// Lock order: `state` before `log` before `saved`
    log: Arc<Mutex<EventLog>>,
    /// Serialized form of the last completed recording; empties on capture
    /// start, refreshed in the background on capture stop
    saved: Mutex<Vec<u8>>,
    status: StatusCache,
    broadcast: Arc<BroadcastHub>,
    hook: Arc<dyn InputHook>,
    injector: Arc<dyn InputInjector>,
    workers: WorkerPool,
    persist_timeout: Duration,
    queue_capacity: usize,
}

impl Shared {
    fn compute_status(&self) -> StatusSnapshot {
        let (live, playing, speed) = {
            let state = self.state.lock();
            (
                state
                    .capture
                    .as_ref()
                    .map(|c| (c.started_at(), c.captured_len())),
                state.player.as_ref().is_some_and(|p| p.is_running()),
                state.speed,
            )
        };

        let capturing = live.is_some();
        let (event_count, duration_seconds) = match live {
            // an active session reports from its own log and clock
            Some((started, len)) => (len, started.elapsed().as_secs_f64()),
            None => {
                let log = self.log.lock();
                (log.len(), log.duration_secs())
            }
        };

        let saved_len = self.saved.lock().len();
        StatusSnapshot {
            capturing,
            playing,
            has_recording: event_count > 0 || saved_len > 0,
            speed,
            duration_seconds,
            event_count,
            // unknown until the post-capture serialization lands
            log_size_bytes: if capturing { 0 } else { saved_len },
            effective_fps: if duration_seconds > 0.0 {
                event_count as f64 / duration_seconds
            } else {
                0.0
            },
        }
    }
}

/// The capture-and-replay engine
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    pub fn new(
        hook: Arc<dyn InputHook>,
        injector: Arc<dyn InputInjector>,
        config: &Config,
    ) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    capture: None,
                    player: None,
                    speed: DEFAULT_SPEED,
                    epoch: 0,
                }),
                log: Arc::new(Mutex::new(EventLog::new())),
                saved: Mutex::new(Vec::new()),
                status: StatusCache::new(Duration::from_millis(
                    config.engine.status_debounce_ms,
                )),
                broadcast: Arc::new(BroadcastHub::new()),
                hook,
                injector,
                workers: WorkerPool::new(config.engine.worker_threads)?,
                persist_timeout: Duration::from_secs(config.engine.persist_timeout_secs),
                queue_capacity: config.engine.queue_capacity,
            }),
        })
    }

    /// Begin recording. The previous recording is discarded.
    pub fn start_capture(&self, config: CaptureConfig) -> crate::Result<()> {
        let mut state = self.shared.state.lock();
        if state.capture.is_some() {
            return Err(crate::Error::AlreadyCapturing);
        }
        let session = CaptureSession::start(
            Arc::clone(&self.shared.hook),
            config,
            self.shared.queue_capacity,
            Arc::clone(&self.shared.broadcast),
        )?;
        // the new recording supersedes the old one everywhere at once
        state.epoch += 1;
        *self.shared.log.lock() = EventLog::new();
        self.shared.saved.lock().clear();
        state.capture = Some(session);
        self.shared.broadcast.set_active(true);
        drop(state);
        self.shared.status.invalidate();
        Ok(())
    }

    /// Stop recording and return the captured event count. Serialization of
    /// the recording happens in the background.
    pub fn stop_capture(&self) -> crate::Result<usize> {
        let (session, my_epoch) = {
            let mut state = self.shared.state.lock();
            let session = state.capture.take().ok_or(crate::Error::NotCapturing)?;
            self.shared.broadcast.set_active(false);
            (session, state.epoch)
        };

        // teardown drains into the session's private log, so a capture
        // started while this runs can never receive this session's events
        let finished = session.stop();
        let count = finished.len();

        let installed = {
            let state = self.shared.state.lock();
            if state.epoch == my_epoch {
                *self.shared.log.lock() = finished.clone();
                true
            } else {
                // a newer recording owns the slot; this one is discarded
                false
            }
        };

        if installed {
            let shared = Arc::clone(&self.shared);
            let _ = self.shared.workers.submit("serialize-recording", move || {
                // an empty recording serializes to nothing, so
                // has_recording stays false
                let bytes = if finished.is_empty() {
                    Vec::new()
                } else {
                    finished.to_bytes()
                };
                let state = shared.state.lock();
                if state.epoch == my_epoch {
                    *shared.saved.lock() = bytes;
                }
                drop(state);
                shared.status.invalidate();
            });
        }

        self.shared.status.invalidate();
        info!(count, "capture stopped");
        Ok(count)
    }

    /// Replay the current recording. `speed_override` applies to this run
    /// only; otherwise the engine's configured speed is used. Returns the
    /// number of events scheduled.
    pub fn start_playback(&self, speed_override: Option<f64>) -> crate::Result<usize> {
        let count = {
            let mut state = self.shared.state.lock();
            if state.player.as_ref().is_some_and(|p| p.is_running()) {
                return Err(crate::Error::AlreadyPlaying);
            }
            state.player = None;

            let speed = speed_override.unwrap_or(state.speed);
            validate_speed(speed)?;

            let events = self.shared.log.lock().events().to_vec();
            if events.is_empty() {
                return Err(crate::Error::EmptyLog);
            }
            let count = events.len();

            let weak: Weak<Shared> = Arc::downgrade(&self.shared);
            let on_finish = Box::new(move |outcome: PlaybackOutcome| {
                if let Some(shared) = weak.upgrade() {
                    shared.state.lock().player = None;
                    shared.status.invalidate();
                    debug!(?outcome, "playback session cleared");
                }
            });

            state.player = Some(Player::spawn(
                events,
                speed,
                Arc::clone(&self.shared.injector),
                Arc::clone(&self.shared.hook),
                on_finish,
            )?);
            count
        };
        self.shared.status.invalidate();
        Ok(count)
    }

    /// Cancel the playback run in progress and wait for it to wind down.
    pub fn stop_playback(&self) -> crate::Result<()> {
        let player = {
            let mut state = self.shared.state.lock();
            match state.player.take() {
                Some(p) if p.is_running() => p,
                // a finished run has already cleared itself
                _ => return Err(crate::Error::NoActivePlayback),
            }
        };
        player.stop();
        self.shared.status.invalidate();
        Ok(())
    }

    /// Set the speed for subsequent playback runs.
    pub fn set_speed(&self, speed: f64) -> crate::Result<()> {
        validate_speed(speed)?;
        self.shared.state.lock().speed = speed;
        self.shared.status.invalidate();
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.shared.state.lock().speed
    }

    /// Current engine status, served from a short-lived cache.
    pub fn status(&self) -> StatusSnapshot {
        self.shared.status.snapshot(|| self.shared.compute_status())
    }

    /// Serialize the current recording. Runs on the worker pool with a time
    /// bound.
    pub fn export_log(&self) -> crate::Result<Vec<u8>> {
        let log = Arc::clone(&self.shared.log);
        let handle = self
            .shared
            .workers
            .submit("export recording", move || log.lock().to_bytes());
        handle.wait_timeout(self.shared.persist_timeout)
    }

    /// Replace the current recording with a previously exported one.
    /// Returns the imported event count. Rejected while capturing.
    pub fn import_log(&self, bytes: Vec<u8>) -> crate::Result<usize> {
        let handle = self.shared.workers.submit("import recording", move || {
            let log = EventLog::from_bytes(&bytes)?;
            Ok::<_, crate::Error>((log, bytes))
        });
        let (log, bytes) = handle.wait_timeout(self.shared.persist_timeout)??;
        let count = log.len();

        {
            let mut state = self.shared.state.lock();
            if state.capture.is_some() {
                return Err(crate::Error::AlreadyCapturing);
            }
            // imports supersede any capture still winding down
            state.epoch += 1;
            *self.shared.log.lock() = log;
            *self.shared.saved.lock() = bytes;
        }
        self.shared.status.invalidate();
        info!(count, "recording imported");
        Ok(count)
    }

    /// Register a live subscriber; it receives events while capturing.
    pub fn subscribe_live(&self) -> (SubscriberId, Receiver<LiveEvent>) {
        self.shared.broadcast.register()
    }

    pub fn unsubscribe_live(&self, id: SubscriberId) {
        self.shared.broadcast.unregister(id)
    }

    /// Stop any active sessions and drain the worker pool.
    pub fn shutdown(&self) {
        let (capture, player) = {
            let mut state = self.shared.state.lock();
            self.shared.broadcast.set_active(false);
            (state.capture.take(), state.player.take())
        };
        if let Some(session) = capture {
            session.stop();
        }
        if let Some(player) = player {
            player.stop();
        }
        self.shared.workers.shutdown();
        info!("engine shut down");
    }
}

fn validate_speed(speed: f64) -> crate::Result<()> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(crate::Error::InvalidSpeed(speed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{NullHook, TraceInjector};

    fn engine() -> Engine {
        Engine::new(
            Arc::new(NullHook::new()),
            Arc::new(TraceInjector),
            &Config::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_double_capture_rejected() {
        let engine = engine();
        engine.start_capture(CaptureConfig::default()).unwrap();
        assert!(matches!(
            engine.start_capture(CaptureConfig::default()),
            Err(crate::Error::AlreadyCapturing)
        ));
        engine.stop_capture().unwrap();
        engine.shutdown();
    }

    #[test]
    fn test_stop_without_capture_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.stop_capture(),
            Err(crate::Error::NotCapturing)
        ));
    }

    #[test]
    fn test_playback_of_empty_log_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.start_playback(None),
            Err(crate::Error::EmptyLog)
        ));
    }

    #[test]
    fn test_stop_without_playback_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.stop_playback(),
            Err(crate::Error::NoActivePlayback)
        ));
    }

    #[test]
    fn test_speed_validation() {
        let engine = engine();
        assert!(engine.set_speed(0.25).is_ok());
        assert_eq!(engine.speed(), 0.25);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine.set_speed(bad),
                Err(crate::Error::InvalidSpeed(_))
            ));
        }
        assert_eq!(engine.speed(), 0.25);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let engine = engine();
        assert!(matches!(
            engine.import_log(b"junk".to_vec()),
            Err(crate::Error::CorruptLog(_))
        ));
    }

    #[test]
    fn test_import_then_export_round_trip() {
        let engine = engine();
        let log = EventLog::from_events(vec![
            crate::Event::pointer_move(0.0, 1, 2),
            crate::Event::key_press(0.5, crate::Key::Char('q')),
        ]);
        let bytes = log.to_bytes();

        assert_eq!(engine.import_log(bytes.clone()).unwrap(), 2);
        assert_eq!(engine.export_log().unwrap(), bytes);

        let status = engine.status();
        assert!(status.has_recording);
        assert_eq!(status.event_count, 2);
        assert_eq!(status.log_size_bytes, bytes.len());
    }

    #[test]
    fn test_import_rejected_while_capturing() {
        let engine = engine();
        let bytes = EventLog::from_events(vec![crate::Event::pointer_move(0.0, 1, 1)]).to_bytes();

        engine.start_capture(CaptureConfig::default()).unwrap();
        assert!(matches!(
            engine.import_log(bytes),
            Err(crate::Error::AlreadyCapturing)
        ));
        engine.stop_capture().unwrap();
        engine.shutdown();
    }

    #[test]
    fn test_status_reflects_capture_lifecycle() {
        let engine = engine();
        assert!(!engine.status().capturing);

        engine.start_capture(CaptureConfig::default()).unwrap();
        let status = engine.status();
        assert!(status.capturing);
        assert_eq!(status.log_size_bytes, 0);

        engine.stop_capture().unwrap();
        assert!(!engine.status().capturing);
        engine.shutdown();
    }

    #[test]
    fn test_shutdown_is_safe_when_idle() {
        let engine = engine();
        engine.shutdown();
        // operations after shutdown fail cleanly rather than hang
        assert!(engine.export_log().is_err());
    }
}
