//! Versioned binary event-log codec
//!
//! Encodes an ordered event sequence into an opaque, versioned byte buffer
//! that round-trips without loss of offsets, kinds, or payload fields.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic: u32 ('RLOG')  version: u16  payload_kind: u8  count: u32
//! then per event: tag: u8  offset: f64  tag-specific fields
//! ```
//!
//! Malformed buffers decode to [`Error::CorruptLog`]; a well-formed frame
//! whose payload kind is not an event sequence decodes to
//! [`Error::TypeMismatch`]. No range validation happens at this layer.

use crate::event::types::{Button, Event, EventKind, Key};
use crate::Error;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Magic bytes 'RLOG' as a little-endian u32
pub const LOG_MAGIC: u32 = u32::from_le_bytes(*b"RLOG");

/// Current encoding version
pub const LOG_VERSION: u16 = 1;

/// Payload kind: an ordered sequence of events
pub const PAYLOAD_EVENT_SEQUENCE: u8 = 1;

// Event tags
const TAG_POINTER_MOVE: u8 = 0;
const TAG_POINTER_BUTTON: u8 = 1;
const TAG_SCROLL: u8 = 2;
const TAG_KEY_PRESS: u8 = 3;
const TAG_KEY_RELEASE: u8 = 4;

// Key tags
const KEY_CHAR: u8 = 0;
const KEY_NAMED: u8 = 1;

fn button_to_u8(button: Button) -> u8 {
    match button {
        Button::Left => 0,
        Button::Right => 1,
        Button::Middle => 2,
    }
}

fn button_from_u8(value: u8) -> Result<Button, Error> {
    match value {
        0 => Ok(Button::Left),
        1 => Ok(Button::Right),
        2 => Ok(Button::Middle),
        _ => Err(Error::CorruptLog(format!("unknown button code: {value}"))),
    }
}

fn truncated(_: std::io::Error) -> Error {
    Error::CorruptLog("buffer ended mid-record".to_string())
}

/// Encode an event sequence into the versioned binary format.
///
/// Writing to a `Vec<u8>` cannot fail, so this is infallible.
pub fn encode_events(events: &[Event]) -> Vec<u8> {
    // header (11 bytes) + a rough 24 bytes per event
    let mut buf = Vec::with_capacity(11 + events.len() * 24);
    // Writes into a Vec never error
    let _ = buf.write_u32::<LittleEndian>(LOG_MAGIC);
    let _ = buf.write_u16::<LittleEndian>(LOG_VERSION);
    let _ = buf.write_u8(PAYLOAD_EVENT_SEQUENCE);
    let _ = buf.write_u32::<LittleEndian>(events.len() as u32);
    for event in events {
        write_event(&mut buf, event);
    }
    buf
}

fn write_event(buf: &mut Vec<u8>, event: &Event) {
    match &event.kind {
        EventKind::PointerMove { x, y } => {
            let _ = buf.write_u8(TAG_POINTER_MOVE);
            let _ = buf.write_f64::<LittleEndian>(event.offset);
            let _ = buf.write_i32::<LittleEndian>(*x);
            let _ = buf.write_i32::<LittleEndian>(*y);
        }
        EventKind::PointerButton {
            x,
            y,
            button,
            pressed,
        } => {
            let _ = buf.write_u8(TAG_POINTER_BUTTON);
            let _ = buf.write_f64::<LittleEndian>(event.offset);
            let _ = buf.write_i32::<LittleEndian>(*x);
            let _ = buf.write_i32::<LittleEndian>(*y);
            let _ = buf.write_u8(button_to_u8(*button));
            let _ = buf.write_u8(u8::from(*pressed));
        }
        EventKind::Scroll { x, y, dx, dy } => {
            let _ = buf.write_u8(TAG_SCROLL);
            let _ = buf.write_f64::<LittleEndian>(event.offset);
            let _ = buf.write_i32::<LittleEndian>(*x);
            let _ = buf.write_i32::<LittleEndian>(*y);
            let _ = buf.write_i32::<LittleEndian>(*dx);
            let _ = buf.write_i32::<LittleEndian>(*dy);
        }
        EventKind::KeyPress { key } => {
            let _ = buf.write_u8(TAG_KEY_PRESS);
            let _ = buf.write_f64::<LittleEndian>(event.offset);
            write_key(buf, key);
        }
        EventKind::KeyRelease { key } => {
            let _ = buf.write_u8(TAG_KEY_RELEASE);
            let _ = buf.write_f64::<LittleEndian>(event.offset);
            write_key(buf, key);
        }
    }
}

fn write_key(buf: &mut Vec<u8>, key: &Key) {
    match key {
        Key::Char(c) => {
            let _ = buf.write_u8(KEY_CHAR);
            let _ = buf.write_u32::<LittleEndian>(*c as u32);
        }
        Key::Named(name) => {
            let _ = buf.write_u8(KEY_NAMED);
            let bytes = name.as_bytes();
            let _ = buf.write_u16::<LittleEndian>(bytes.len() as u16);
            buf.extend_from_slice(bytes);
        }
    }
}

/// Decode a versioned binary buffer back into an event sequence.
pub fn decode_events(bytes: &[u8]) -> Result<Vec<Event>, Error> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    if magic != LOG_MAGIC {
        return Err(Error::CorruptLog(format!(
            "bad magic: expected 0x{LOG_MAGIC:08X}, got 0x{magic:08X}"
        )));
    }

    let version = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
    if version == 0 || version > LOG_VERSION {
        return Err(Error::CorruptLog(format!(
            "unsupported log version: {version} (max {LOG_VERSION})"
        )));
    }

    let payload_kind = cursor.read_u8().map_err(truncated)?;
    if payload_kind != PAYLOAD_EVENT_SEQUENCE {
        return Err(Error::TypeMismatch(format!(
            "payload kind {payload_kind} is not an event sequence"
        )));
    }

    let count = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let mut events = Vec::with_capacity(count.min(u16::MAX as u32) as usize);
    for _ in 0..count {
        events.push(read_event(&mut cursor)?);
    }

    if cursor.position() != bytes.len() as u64 {
        return Err(Error::CorruptLog(format!(
            "{} trailing bytes after {count} events",
            bytes.len() as u64 - cursor.position()
        )));
    }

    Ok(events)
}

fn read_event(cursor: &mut Cursor<&[u8]>) -> Result<Event, Error> {
    let tag = cursor.read_u8().map_err(truncated)?;
    let offset = cursor.read_f64::<LittleEndian>().map_err(truncated)?;
    let kind = match tag {
        TAG_POINTER_MOVE => {
            let x = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let y = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            EventKind::PointerMove { x, y }
        }
        TAG_POINTER_BUTTON => {
            let x = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let y = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let button = button_from_u8(cursor.read_u8().map_err(truncated)?)?;
            let pressed = cursor.read_u8().map_err(truncated)? != 0;
            EventKind::PointerButton {
                x,
                y,
                button,
                pressed,
            }
        }
        TAG_SCROLL => {
            let x = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let y = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let dx = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            let dy = cursor.read_i32::<LittleEndian>().map_err(truncated)?;
            EventKind::Scroll { x, y, dx, dy }
        }
        TAG_KEY_PRESS => EventKind::KeyPress {
            key: read_key(cursor)?,
        },
        TAG_KEY_RELEASE => EventKind::KeyRelease {
            key: read_key(cursor)?,
        },
        _ => return Err(Error::CorruptLog(format!("unknown event tag: {tag}"))),
    };
    Ok(Event { offset, kind })
}

fn read_key(cursor: &mut Cursor<&[u8]>) -> Result<Key, Error> {
    match cursor.read_u8().map_err(truncated)? {
        KEY_CHAR => {
            let code = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
            let c = char::from_u32(code)
                .ok_or_else(|| Error::CorruptLog(format!("invalid char code: {code}")))?;
            Ok(Key::Char(c))
        }
        KEY_NAMED => {
            let len = cursor.read_u16::<LittleEndian>().map_err(truncated)? as usize;
            let start = cursor.position() as usize;
            let slice = cursor.get_ref();
            if start + len > slice.len() {
                return Err(Error::CorruptLog("buffer ended mid-record".to_string()));
            }
            let name = std::str::from_utf8(&slice[start..start + len])
                .map_err(|e| Error::CorruptLog(format!("invalid UTF-8 in key name: {e}")))?
                .to_string();
            cursor.set_position((start + len) as u64);
            Ok(Key::Named(name))
        }
        other => Err(Error::CorruptLog(format!("unknown key tag: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::pointer_move(0.0, 100, 200),
            Event::pointer_button(0.125, 100, 200, Button::Left, true),
            Event::pointer_button(0.25, 100, 200, Button::Left, false),
            Event::scroll(0.5, 300, 400, 0, -2),
            Event::key_press(1.0, Key::Char('a')),
            Event::key_release(1.0625, Key::Char('a')),
            Event::key_press(2.0, Key::Named("shift".into())),
            Event::key_release(2.5, Key::Named("shift".into())),
        ]
    }

    #[test]
    fn test_round_trip() {
        let events = sample_events();
        let bytes = encode_events(&events);
        let decoded = decode_events(&bytes).unwrap();
        assert_eq!(events, decoded);
    }

    #[test]
    fn test_round_trip_empty() {
        let bytes = encode_events(&[]);
        let decoded = decode_events(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_round_trip_out_of_range_coordinates() {
        // range validation is not this layer's job
        let events = vec![Event::pointer_move(0.0, -50, 99_999)];
        let decoded = decode_events(&encode_events(&events)).unwrap();
        assert_eq!(events, decoded);
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let mut bytes = encode_events(&sample_events());
        bytes[0] = b'X';
        assert!(matches!(decode_events(&bytes), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_unsupported_version_is_corrupt() {
        let mut bytes = encode_events(&[]);
        bytes[4] = 0xFF;
        bytes[5] = 0xFF;
        assert!(matches!(decode_events(&bytes), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_wrong_payload_kind_is_type_mismatch() {
        let mut bytes = encode_events(&sample_events());
        bytes[6] = 7;
        assert!(matches!(
            decode_events(&bytes),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_truncated_buffer_is_corrupt() {
        let bytes = encode_events(&sample_events());
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(decode_events(cut), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_trailing_garbage_is_corrupt() {
        let mut bytes = encode_events(&sample_events());
        bytes.extend_from_slice(b"junk");
        assert!(matches!(decode_events(&bytes), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_unknown_event_tag_is_corrupt() {
        let mut bytes = encode_events(&[Event::pointer_move(0.0, 1, 1)]);
        // first event tag sits right after the 11-byte header
        bytes[11] = 0xEE;
        assert!(matches!(decode_events(&bytes), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_empty_buffer_is_corrupt() {
        assert!(matches!(decode_events(&[]), Err(Error::CorruptLog(_))));
    }

    #[test]
    fn test_offsets_survive_exactly() {
        let events = vec![
            Event::pointer_move(0.000_1, 1, 1),
            Event::pointer_move(123.456_789, 2, 2),
        ];
        let decoded = decode_events(&encode_events(&events)).unwrap();
        assert_eq!(decoded[0].offset, 0.000_1);
        assert_eq!(decoded[1].offset, 123.456_789);
    }
}
