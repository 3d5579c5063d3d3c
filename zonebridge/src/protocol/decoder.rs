//! # Message Decoding
//!
//! Turns one frame payload into one [`Event`]. Decoding is all-or-nothing:
//! every declared field must be present and the thread key must end the
//! payload exactly, otherwise the whole message is rejected.
//!
//! Names travel as UTF-16 code units. The emitter only promises ASCII, so each
//! unit below `0x80` becomes that character and anything else becomes `?`.

use zonebridge_common::{
    KIND_BYTES, NAME_LENGTH_BYTES, NAME_UNIT_BYTES, NON_ASCII_PLACEHOLDER, THREAD_KEY_BYTES,
};

use super::event::{Event, EventKind};
use crate::domain::{DecodeError, ThreadKey};

/// Bounds-checked big-endian cursor over a payload
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, field: &'static str, needed: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if available < needed {
            return Err(DecodeError::Truncated { field, needed, available });
        }
        let bytes = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take_array::<KIND_BYTES>(field)?[0])
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take_array::<NAME_LENGTH_BYTES>(field)?))
    }

    fn read_i64(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.take_array::<THREAD_KEY_BYTES>(field)?))
    }

    /// Length-prefixed UTF-16 text, narrowed to ASCII
    fn read_narrow_string(&mut self) -> Result<String, DecodeError> {
        let units = self.read_i32("name length")?;
        let units = usize::try_from(units).map_err(|_| DecodeError::NegativeLength(units))?;

        // Check the whole field up front so a huge count never allocates
        let needed = units.saturating_mul(NAME_UNIT_BYTES);
        let raw = self.take("name", needed)?;

        Ok(raw
            .chunks_exact(NAME_UNIT_BYTES)
            .map(|unit| narrow_unit(u16::from_be_bytes([unit[0], unit[1]])))
            .collect())
    }
}

fn narrow_unit(unit: u16) -> char {
    match u8::try_from(unit) {
        Ok(byte) if byte.is_ascii() => char::from(byte),
        _ => NON_ASCII_PLACEHOLDER,
    }
}

/// Decode one payload into an event
///
/// # Errors
/// Returns [`DecodeError`] if a field is truncated, the name length is
/// negative, or bytes remain after the thread key.
pub fn decode(payload: &[u8]) -> Result<Event, DecodeError> {
    let mut reader = Reader::new(payload);

    let tag = reader.read_u8("kind")?;
    let name = reader.read_narrow_string()?;
    let thread_key = ThreadKey(reader.read_i64("thread key")?);

    if reader.remaining() > 0 {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }

    Ok(Event { kind: EventKind::from_tag(tag, name), thread_key })
}
