//! Capture-time filtering and coalescing
//!
//! A pure decision function over raw hook observations: category enables,
//! the pointer-move sample-rate throttle, and smart-capture suppression of
//! redundant samples (stationary pointer positions, auto-repeated keys).
//! Invoked synchronously on the hook callback threads, so it does nothing
//! but compare and update a little state.

use crate::app::config::CaptureConfig;
use crate::event::types::{EventKind, Key};
use crate::hook::RawInput;
use std::time::{Duration, Instant};

/// Stateful accept/reject filter for one capture session
#[derive(Debug)]
pub struct CaptureFilter {
    config: CaptureConfig,
    /// Minimum spacing between accepted moves, from the clamped sample rate
    move_interval: Duration,
    last_move_at: Option<Instant>,
    last_position: Option<(i32, i32)>,
    /// Last observed (pressed, key) pair, for auto-repeat coalescing
    last_key: Option<(bool, Key)>,
}

impl CaptureFilter {
    pub fn new(config: CaptureConfig) -> Self {
        let rate = config.clamped_sample_rate();
        Self {
            config,
            move_interval: Duration::from_secs_f64(1.0 / rate as f64),
            last_move_at: None,
            last_position: None,
            last_key: None,
        }
    }

    /// Decide whether a raw observation becomes a captured event.
    ///
    /// `now` is passed in rather than sampled so the decision is a pure
    /// function of state and inputs.
    pub fn accept(&mut self, raw: RawInput, now: Instant) -> Option<EventKind> {
        match raw {
            RawInput::Move { x, y } => {
                if !self.config.capture_move {
                    return None;
                }
                if let Some(last) = self.last_move_at {
                    if now.duration_since(last) < self.move_interval {
                        return None;
                    }
                }
                if self.config.smart_capture && self.last_position == Some((x, y)) {
                    return None;
                }
                self.last_move_at = Some(now);
                self.last_position = Some((x, y));
                Some(EventKind::PointerMove { x, y })
            }
            RawInput::Button {
                x,
                y,
                button,
                pressed,
            } => {
                if !self.config.capture_click {
                    return None;
                }
                Some(EventKind::PointerButton {
                    x,
                    y,
                    button,
                    pressed,
                })
            }
            // scroll shares the pointer-motion category
            RawInput::Scroll { x, y, dx, dy } => {
                if !self.config.capture_move {
                    return None;
                }
                Some(EventKind::Scroll { x, y, dx, dy })
            }
            RawInput::Key { key, pressed } => {
                if !self.config.capture_keyboard {
                    return None;
                }
                let pair = (pressed, key);
                if self.config.smart_capture && self.last_key.as_ref() == Some(&pair) {
                    return None;
                }
                let (pressed, key) = pair;
                self.last_key = Some((pressed, key.clone()));
                Some(if pressed {
                    EventKind::KeyPress { key }
                } else {
                    EventKind::KeyRelease { key }
                })
            }
        }
    }
}
