//! Ordered event log
//!
//! The append-only store of captured events for one session. Owned
//! exclusively by the capture session's consumer thread while recording and
//! by the player while replaying; session boundaries swap the whole log
//! (snapshot replace) rather than editing it in place.

use crate::event::codec;
use crate::event::types::Event;

/// Append-only ordered sequence of captured events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Append an event. Events arrive in order from the single consumer
    /// thread, so offsets are non-decreasing by construction.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Total duration in seconds: the maximum recorded offset.
    pub fn duration_secs(&self) -> f64 {
        self.events.iter().map(|e| e.offset).fold(0.0, f64::max)
    }

    /// Serialize into the versioned binary format.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_events(&self.events)
    }

    /// Deserialize from the versioned binary format.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(Self {
            events: codec::decode_events(bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::{Button, Key};
    use crate::Error;

    #[test]
    fn test_append_preserves_order() {
        let mut log = EventLog::new();
        log.push(Event::pointer_move(0.1, 1, 1));
        log.push(Event::pointer_move(0.2, 2, 2));
        log.push(Event::key_press(0.3, Key::Char('q')));

        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[0].offset, 0.1);
        assert_eq!(log.events()[2].offset, 0.3);
    }

    #[test]
    fn test_duration_is_max_offset() {
        let mut log = EventLog::new();
        assert_eq!(log.duration_secs(), 0.0);

        log.push(Event::pointer_move(0.5, 1, 1));
        log.push(Event::pointer_button(2.25, 1, 1, Button::Left, true));
        assert_eq!(log.duration_secs(), 2.25);
    }

    #[test]
    fn test_byte_round_trip() {
        let mut log = EventLog::new();
        log.push(Event::pointer_move(0.0, 10, 20));
        log.push(Event::scroll(1.5, 10, 20, 0, 3));
        log.push(Event::key_release(2.0, Key::Named("enter".into())));

        let restored = EventLog::from_bytes(&log.to_bytes()).unwrap();
        assert_eq!(log, restored);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = EventLog::from_bytes(b"not a log").unwrap_err();
        assert!(matches!(err, Error::CorruptLog(_)));
    }

    #[test]
    fn test_empty_log_round_trip() {
        let log = EventLog::new();
        let restored = EventLog::from_bytes(&log.to_bytes()).unwrap();
        assert!(restored.is_empty());
    }
}
