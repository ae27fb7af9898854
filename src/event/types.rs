//! Core event value types
//!
//! An [`Event`] is a captured action: a kind-specific payload plus the
//! elapsed seconds since capture start. Events are immutable once built and
//! appended to the log in arrival order, so offsets are non-decreasing
//! within a log by construction.

use serde::{Deserialize, Serialize};

/// Exclusive upper bound for valid injection coordinates.
///
/// Out-of-range events are accepted at capture time but skipped (not fatal)
/// at injection time during playback.
pub const COORD_MAX: i32 = 10_000;

/// Pointer button identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Left,
    Right,
    Middle,
}

/// Keyboard key identity.
///
/// Printable keys carry their character; everything else (modifiers,
/// function keys, navigation) carries the backend's stable name, e.g.
/// `"shift"` or `"f9"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Named(String),
}

/// Kind-specific payload of a captured action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pointer moved to an absolute position
    PointerMove { x: i32, y: i32 },
    /// Pointer button pressed or released at a position
    PointerButton {
        x: i32,
        y: i32,
        button: Button,
        pressed: bool,
    },
    /// Scroll wheel turned at a position
    Scroll { x: i32, y: i32, dx: i32, dy: i32 },
    /// Key pressed
    KeyPress { key: Key },
    /// Key released
    KeyRelease { key: Key },
}

impl EventKind {
    /// Screen position carried by this kind, if any
    pub fn coordinates(&self) -> Option<(i32, i32)> {
        match *self {
            EventKind::PointerMove { x, y } => Some((x, y)),
            EventKind::PointerButton { x, y, .. } => Some((x, y)),
            EventKind::Scroll { x, y, .. } => Some((x, y)),
            EventKind::KeyPress { .. } | EventKind::KeyRelease { .. } => None,
        }
    }
}

/// A captured action with its offset from session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Elapsed seconds since capture start; the playback scheduling key
    pub offset: f64,
    pub kind: EventKind,
}

impl Event {
    pub fn pointer_move(offset: f64, x: i32, y: i32) -> Self {
        Self {
            offset,
            kind: EventKind::PointerMove { x, y },
        }
    }

    pub fn pointer_button(offset: f64, x: i32, y: i32, button: Button, pressed: bool) -> Self {
        Self {
            offset,
            kind: EventKind::PointerButton {
                x,
                y,
                button,
                pressed,
            },
        }
    }

    pub fn scroll(offset: f64, x: i32, y: i32, dx: i32, dy: i32) -> Self {
        Self {
            offset,
            kind: EventKind::Scroll { x, y, dx, dy },
        }
    }

    pub fn key_press(offset: f64, key: Key) -> Self {
        Self {
            offset,
            kind: EventKind::KeyPress { key },
        }
    }

    pub fn key_release(offset: f64, key: Key) -> Self {
        Self {
            offset,
            kind: EventKind::KeyRelease { key },
        }
    }

    /// Check if this is a pointer-move event (the only coalescible kind)
    pub fn is_pointer_move(&self) -> bool {
        matches!(self.kind, EventKind::PointerMove { .. })
    }

    /// Check whether the carried coordinates are valid for injection.
    /// Events without coordinates are always injectable.
    pub fn in_bounds(&self) -> bool {
        match self.kind.coordinates() {
            Some((x, y)) => (0..COORD_MAX).contains(&x) && (0..COORD_MAX).contains(&y),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_carry_payload() {
        let e = Event::pointer_move(0.5, 100, 200);
        assert_eq!(e.offset, 0.5);
        assert_eq!(e.kind, EventKind::PointerMove { x: 100, y: 200 });

        let e = Event::pointer_button(1.0, 10, 20, Button::Right, true);
        assert_eq!(
            e.kind,
            EventKind::PointerButton {
                x: 10,
                y: 20,
                button: Button::Right,
                pressed: true
            }
        );

        let e = Event::scroll(2.0, 5, 6, 0, -3);
        assert_eq!(e.kind.coordinates(), Some((5, 6)));

        let e = Event::key_press(3.0, Key::Char('a'));
        assert!(e.kind.coordinates().is_none());
    }

    #[test]
    fn test_pointer_move_detection() {
        assert!(Event::pointer_move(0.0, 1, 1).is_pointer_move());
        assert!(!Event::pointer_button(0.0, 1, 1, Button::Left, true).is_pointer_move());
        assert!(!Event::key_release(0.0, Key::Named("esc".into())).is_pointer_move());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(Event::pointer_move(0.0, 0, 0).in_bounds());
        assert!(Event::pointer_move(0.0, 9999, 9999).in_bounds());
        assert!(!Event::pointer_move(0.0, 10_000, 0).in_bounds());
        assert!(!Event::pointer_move(0.0, 0, -1).in_bounds());
        assert!(!Event::scroll(0.0, -5, 0, 1, 1).in_bounds());
        // key events carry no coordinates and are always injectable
        assert!(Event::key_press(0.0, Key::Char('x')).in_bounds());
    }

    #[test]
    fn test_event_json_serialization() {
        let e = Event::pointer_button(1.25, 10, 20, Button::Left, false);
        let json = serde_json::to_string(&e).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn test_key_identity() {
        assert_eq!(Key::Char('a'), Key::Char('a'));
        assert_ne!(Key::Char('a'), Key::Named("a".into()));
        assert_eq!(Key::Named("shift".into()), Key::Named("shift".into()));
    }
}
