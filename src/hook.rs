//! Input capability traits
//!
//! The engine does not hook the OS itself. It consumes two capabilities:
//! a subscription to raw input callbacks ([`InputHook`]) and a way to
//! synthesize input ([`InputInjector`]). Real backends (Quartz event taps,
//! X11, SendInput, ...) live outside this crate; the trait seam keeps the
//! capture and playback logic testable against fakes.

use crate::event::types::{Button, Key};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// A raw input observation as delivered by an OS hook callback.
///
/// Raw inputs carry no timestamps; the capture session stamps accepted
/// events against its own session clock.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Pointer moved to an absolute screen position
    Move { x: i32, y: i32 },
    /// Pointer button pressed or released at a position
    Button {
        x: i32,
        y: i32,
        button: Button,
        pressed: bool,
    },
    /// Scroll wheel turned at a position
    Scroll { x: i32, y: i32, dx: i32, dy: i32 },
    /// Key pressed or released
    Key { key: Key, pressed: bool },
}

/// Opaque identifier for an active hook subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// Callback invoked synchronously on the hook's listener thread.
///
/// Implementations of [`InputHook`] call this from their own threads, so it
/// must be fast and non-blocking (the capture path only filters and offers
/// to a bounded queue).
pub type HookCallback = Arc<dyn Fn(RawInput) + Send + Sync>;

/// Subscription capability for raw OS input events
pub trait InputHook: Send + Sync {
    /// Install a callback that receives every raw input observation.
    /// Multiple concurrent subscriptions must be supported (capture and the
    /// playback interrupt watcher can be active at the same time).
    fn subscribe(&self, callback: HookCallback) -> crate::Result<HookHandle>;

    /// Remove a previously installed callback. Unknown handles are ignored.
    fn unsubscribe(&self, handle: HookHandle);
}

/// Per-event injection failure. Never fatal to a playback session: the
/// player logs it and moves on to the next event.
#[derive(Debug, Clone, thiserror::Error)]
#[error("injection failed: {0}")]
pub struct InjectionError(pub String);

/// Injection capability for synthesizing input events
pub trait InputInjector: Send + Sync {
    fn set_pointer_position(&self, x: i32, y: i32) -> Result<(), InjectionError>;
    fn press_button(&self, button: Button) -> Result<(), InjectionError>;
    fn release_button(&self, button: Button) -> Result<(), InjectionError>;
    fn scroll(&self, dx: i32, dy: i32) -> Result<(), InjectionError>;
    fn press_key(&self, key: &Key) -> Result<(), InjectionError>;
    fn release_key(&self, key: &Key) -> Result<(), InjectionError>;
}

/// A hook that never fires. Useful for headless playback (no interruption
/// source) and for driving the engine from environments without OS hooks.
#[derive(Debug, Default)]
pub struct NullHook {
    next_handle: AtomicU64,
}

impl NullHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputHook for NullHook {
    fn subscribe(&self, _callback: HookCallback) -> crate::Result<HookHandle> {
        Ok(HookHandle(self.next_handle.fetch_add(1, Ordering::Relaxed)))
    }

    fn unsubscribe(&self, _handle: HookHandle) {}
}

/// An injector that logs every intended action instead of performing it.
/// Backs the CLI's dry-run playback.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceInjector;

impl InputInjector for TraceInjector {
    fn set_pointer_position(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        info!(x, y, "inject: set pointer position");
        Ok(())
    }

    fn press_button(&self, button: Button) -> Result<(), InjectionError> {
        info!(?button, "inject: press button");
        Ok(())
    }

    fn release_button(&self, button: Button) -> Result<(), InjectionError> {
        info!(?button, "inject: release button");
        Ok(())
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        info!(dx, dy, "inject: scroll");
        Ok(())
    }

    fn press_key(&self, key: &Key) -> Result<(), InjectionError> {
        info!(?key, "inject: press key");
        Ok(())
    }

    fn release_key(&self, key: &Key) -> Result<(), InjectionError> {
        info!(?key, "inject: release key");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_hook_hands_out_distinct_handles() {
        let hook = NullHook::new();
        let a = hook.subscribe(Arc::new(|_| {})).unwrap();
        let b = hook.subscribe(Arc::new(|_| {})).unwrap();
        assert_ne!(a, b);
        hook.unsubscribe(a);
        hook.unsubscribe(b);
        // unsubscribing twice is harmless
        hook.unsubscribe(a);
    }

    #[test]
    fn test_trace_injector_always_succeeds() {
        let injector = TraceInjector;
        assert!(injector.set_pointer_position(10, 20).is_ok());
        assert!(injector.press_button(Button::Left).is_ok());
        assert!(injector.release_button(Button::Left).is_ok());
        assert!(injector.scroll(0, -3).is_ok());
        assert!(injector.press_key(&Key::Char('a')).is_ok());
        assert!(injector.release_key(&Key::Named("shift".into())).is_ok());
    }

    #[test]
    fn test_injection_error_display() {
        let err = InjectionError("device busy".into());
        assert_eq!(err.to_string(), "injection failed: device busy");
    }
}
