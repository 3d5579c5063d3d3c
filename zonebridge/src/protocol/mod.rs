//! Wire protocol
//!
//! - `framing`: length-prefixed frames over a byte stream
//! - `decoder`: frame payload → [`Event`]
//! - `encoder`: [`Event`] → frame payload, for emitters and tests
//! - `event`: the decoded event model

pub mod decoder;
pub mod encoder;
pub mod event;
pub mod framing;

pub use decoder::decode;
pub use encoder::{encode, encode_frame, MAX_NAME_UNITS};
pub use event::{Event, EventKind};
pub use framing::read_frame;
