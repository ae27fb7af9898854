//! Playback scheduling and dispatch
//!
//! A player replays a coalesced event sequence on its own thread, pacing
//! each event against `start + offset / speed` on the wall clock. Real user
//! input interrupts the run through a hook watcher; the player's own
//! injections are masked out with short grace windows around each dispatch.
//! Injection failures are logged and skipped, never fatal to the run.

use crate::event::types::{Event, EventKind};
use crate::hook::{InputHook, InputInjector, RawInput};
use crate::playback::coalesce::coalesce_moves;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Watcher arm delay after playback starts; absorbs input noise from the
/// user's own "start" action
const START_GRACE: Duration = Duration::from_millis(200);

/// Watcher mask around each injected event, so self-generated input does not
/// read as an interruption
const DISPATCH_GRACE: Duration = Duration::from_millis(30);

/// Settle delay between positioning the pointer and pressing a button
const CLICK_SETTLE: Duration = Duration::from_millis(5);

/// How a playback run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every event was dispatched
    Completed,
    /// Real user input aborted the run
    Interrupted,
    /// An explicit stop request aborted the run
    Stopped,
}

/// Invoked exactly once from the playback thread when the run ends
pub type FinishCallback = Box<dyn FnOnce(PlaybackOutcome) + Send>;

/// Cancellation latch the dispatch thread sleeps on, so a stop request cuts
/// an in-progress inter-event wait short.
#[derive(Default)]
struct Cancel {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Cancel {
    fn cancel(&self) {
        *self.flag.lock() = true;
        self.cond.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        *self.flag.lock()
    }

    /// Sleep until `deadline` or cancellation. Returns true if cancelled.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut flag = self.flag.lock();
        while !*flag {
            if self.cond.wait_until(&mut flag, deadline).timed_out() {
                return *flag;
            }
        }
        true
    }
}

/// A playback run in progress
pub struct Player {
    cancel: Arc<Cancel>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Coalesce `events` and start replaying them at `speed` on a new
    /// thread. The caller has already validated speed and non-emptiness.
    pub fn spawn(
        events: Vec<Event>,
        speed: f64,
        injector: Arc<dyn InputInjector>,
        hook: Arc<dyn InputHook>,
        on_finish: FinishCallback,
    ) -> crate::Result<Self> {
        let events = coalesce_moves(&events);
        let cancel = Arc::new(Cancel::default());
        let interrupted = Arc::new(AtomicBool::new(false));
        let ignore_until = Arc::new(Mutex::new(Instant::now() + START_GRACE));

        let watcher_cancel = Arc::clone(&cancel);
        let watcher_interrupted = Arc::clone(&interrupted);
        let watcher_ignore = Arc::clone(&ignore_until);
        let watcher = hook.subscribe(Arc::new(move |raw: RawInput| {
            // keyboard and scroll activity never interrupts; only pointer
            // motion and clicks signal the user has taken over
            let pointer = matches!(raw, RawInput::Move { .. } | RawInput::Button { .. });
            if pointer && Instant::now() > *watcher_ignore.lock() {
                watcher_interrupted.store(true, Ordering::Release);
                watcher_cancel.cancel();
            }
        }))?;

        let thread_cancel = Arc::clone(&cancel);
        let thread_hook = Arc::clone(&hook);
        let handle = thread::Builder::new().name("playback".into()).spawn(move || {
            let total = events.len();
            info!(total, speed, "playback started");
            let t0 = Instant::now();

            for (index, event) in events.iter().enumerate() {
                if thread_cancel.is_cancelled() {
                    break;
                }
                let target = t0 + Duration::from_secs_f64(event.offset / speed);
                if thread_cancel.wait_until(target) {
                    break;
                }

                *ignore_until.lock() = Instant::now() + DISPATCH_GRACE;
                if let Err(err) = dispatch(injector.as_ref(), event) {
                    warn!(index, %err, "injection failed, skipping event");
                }
                *ignore_until.lock() = Instant::now() + DISPATCH_GRACE;
            }

            thread_hook.unsubscribe(watcher);
            let outcome = if interrupted.load(Ordering::Acquire) {
                PlaybackOutcome::Interrupted
            } else if thread_cancel.is_cancelled() {
                PlaybackOutcome::Stopped
            } else {
                PlaybackOutcome::Completed
            };
            info!(?outcome, "playback finished");
            on_finish(outcome);
        });
        let handle = match handle {
            Ok(handle) => handle,
            Err(err) => {
                // the watcher must not outlive a run that never started
                hook.unsubscribe(watcher);
                return Err(err.into());
            }
        };

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Whether the playback thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Request cancellation and wait for the playback thread to exit.
    pub fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("playback thread panicked");
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // a finished run has already cleaned up; a dropped live player
        // detaches rather than blocking the dropping thread
        self.cancel.cancel();
    }
}

/// Inject one event. Out-of-range coordinates skip the event quietly.
fn dispatch(
    injector: &dyn InputInjector,
    event: &Event,
) -> Result<(), crate::hook::InjectionError> {
    if !event.in_bounds() {
        debug!(offset = event.offset, "skipping out-of-bounds event");
        return Ok(());
    }
    match &event.kind {
        EventKind::PointerMove { x, y } => injector.set_pointer_position(*x, *y),
        EventKind::PointerButton {
            x,
            y,
            button,
            pressed,
        } => {
            injector.set_pointer_position(*x, *y)?;
            thread::sleep(CLICK_SETTLE);
            if *pressed {
                injector.press_button(*button)
            } else {
                injector.release_button(*button)
            }
        }
        EventKind::Scroll { x, y, dx, dy } => {
            injector.set_pointer_position(*x, *y)?;
            injector.scroll(*dx, *dy)
        }
        EventKind::KeyPress { key } => injector.press_key(key),
        EventKind::KeyRelease { key } => injector.release_key(key),
    }
}
