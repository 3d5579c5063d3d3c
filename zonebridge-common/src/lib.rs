//! # Shared Wire Definitions (Emitter ↔ Bridge)
//!
//! Constants describing the zone-event wire protocol. Both the bridge and any
//! Rust-side emitter depend on this crate so the two ends can never disagree
//! about a tag value or a field width.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ length (u32) │ payload (`length` bytes)                     │
//! └──────────────┴──────────────────────────────────────────────┘
//!
//! payload:
//! ┌──────────┬──────────────────┬───────────────────────┬────────────────┐
//! │ kind: u8 │ name_units: i32  │ name: [u16; units]    │ thread_key: i64│
//! └──────────┴──────────────────┴───────────────────────┴────────────────┘
//! ```
//!
//! All integers are big-endian, matching the emitting JVM's `DataOutputStream`.

#![no_std]

// ============================================================================
// Event Kind Tags
// ============================================================================

/// **Zone End**: close the innermost open zone of the sending thread
///
/// Carries an (ignored) name field, usually empty.
pub const KIND_ZONE_END: u8 = 0;

/// **Zone Start**: open a named zone on the sending thread's timeline
///
/// The name is used both as the zone's display name and its function label.
pub const KIND_ZONE_START: u8 = 1;

/// **Frame Mark**: global frame boundary, independent of any call stack
pub const KIND_FRAME_MARK: u8 = 3;

// ============================================================================
// Field Widths
// ============================================================================

/// Width of the frame length prefix
pub const FRAME_LENGTH_BYTES: usize = 4;

/// Width of the kind tag
pub const KIND_BYTES: usize = 1;

/// Width of the name unit count
pub const NAME_LENGTH_BYTES: usize = 4;

/// Width of one name unit (a UTF-16 code unit)
pub const NAME_UNIT_BYTES: usize = 2;

/// Width of the thread key
pub const THREAD_KEY_BYTES: usize = 8;

/// Smallest well-formed payload: a kind, an empty name and a thread key
pub const MIN_PAYLOAD_BYTES: usize = KIND_BYTES + NAME_LENGTH_BYTES + THREAD_KEY_BYTES;

/// Replacement for name units outside the ASCII range
pub const NON_ASCII_PLACEHOLDER: char = '?';

// ============================================================================
// Transport Defaults
// ============================================================================

/// Port the emitter connects to unless configured otherwise
pub const DEFAULT_PORT: u16 = 9001;

/// Largest frame the bridge accepts by default (16 MiB)
///
/// A zone name would need eight million UTF-16 units to reach this; anything
/// larger is a corrupted length prefix, not a real message.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
