//! Message encoding, the emitter's side of the wire
//!
//! The bridge never encodes in production; this exists for the example
//! emitter and for tests that drive the server over a real socket.

use zonebridge_common::{FRAME_LENGTH_BYTES, MIN_PAYLOAD_BYTES, NAME_UNIT_BYTES};

use super::event::{Event, EventKind};

/// Longest name the `i32` unit count can describe
#[allow(clippy::cast_sign_loss)]
pub const MAX_NAME_UNITS: usize = i32::MAX as usize;

/// A name as UTF-16 units, cut after `max_units`
fn name_units(name: &str, max_units: usize) -> Vec<u16> {
    name.encode_utf16().take(max_units).collect()
}

/// Encode one event as a frame payload (no length prefix)
///
/// Only `Start` carries its name; every other kind sends an empty one.
/// Names longer than [`MAX_NAME_UNITS`] UTF-16 units are truncated to that
/// length, since the wire count is an `i32`.
#[must_use]
pub fn encode(event: &Event) -> Vec<u8> {
    let name: &str = match &event.kind {
        EventKind::Start { name } => name,
        _ => "",
    };
    let units = name_units(name, MAX_NAME_UNITS);

    let mut buf = Vec::with_capacity(MIN_PAYLOAD_BYTES + units.len() * NAME_UNIT_BYTES);
    buf.push(event.kind.tag());
    let count = i32::try_from(units.len()).unwrap_or(i32::MAX);
    buf.extend_from_slice(&count.to_be_bytes());
    for unit in &units {
        buf.extend_from_slice(&unit.to_be_bytes());
    }
    buf.extend_from_slice(&event.thread_key.0.to_be_bytes());
    buf
}

/// Encode one event with its big-endian length prefix, ready to write
#[must_use]
pub fn encode_frame(event: &Event) -> Vec<u8> {
    let payload = encode(event);
    let mut frame = Vec::with_capacity(FRAME_LENGTH_BYTES + payload.len());
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreadKey;
    use crate::protocol::decode;

    #[test]
    fn test_round_trip_each_kind() {
        let events = [
            Event::start(ThreadKey(1), "foo"),
            Event::end(ThreadKey(2)),
            Event::frame_mark(ThreadKey(-3)),
            Event { kind: EventKind::Unknown(7), thread_key: ThreadKey(4) },
        ];
        for event in events {
            assert_eq!(decode(&encode(&event)).unwrap(), event);
        }
    }

    #[test]
    fn test_non_ascii_name_is_narrowed() {
        let decoded = decode(&encode(&Event::start(ThreadKey(1), "größe"))).unwrap();
        assert_eq!(decoded, Event::start(ThreadKey(1), "gr??e"));
    }

    #[test]
    fn test_start_layout() {
        let payload = encode(&Event::start(ThreadKey(1), "ab"));
        assert_eq!(
            payload,
            vec![1, 0, 0, 0, 2, 0, b'a', 0, b'b', 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_frame_prefix_is_payload_length() {
        let frame = encode_frame(&Event::end(ThreadKey(1)));
        assert_eq!(&frame[..4], &13u32.to_be_bytes());
        assert_eq!(frame.len(), 4 + 13);
    }

    #[test]
    fn test_name_units_cut_at_limit() {
        assert_eq!(name_units("abcdef", 3), [u16::from(b'a'), u16::from(b'b'), u16::from(b'c')]);
        assert_eq!(name_units("ab", 3).len(), 2);
        assert_eq!(name_units("größe", MAX_NAME_UNITS).len(), 5);
    }
}
