//! Decoded zone events

use zonebridge_common::{KIND_FRAME_MARK, KIND_ZONE_END, KIND_ZONE_START};

use crate::domain::ThreadKey;

/// What an event asks the owning actor to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Open a named zone on top of the call stack
    Start { name: String },
    /// Close the innermost open zone
    End,
    /// Global frame boundary
    FrameMark,
    /// Tag this bridge does not understand yet; applied as a no-op
    Unknown(u8),
}

impl EventKind {
    /// Map a wire tag to a kind, carrying the name only where it matters
    #[must_use]
    pub fn from_tag(tag: u8, name: String) -> Self {
        match tag {
            KIND_ZONE_START => EventKind::Start { name },
            KIND_ZONE_END => EventKind::End,
            KIND_FRAME_MARK => EventKind::FrameMark,
            other => EventKind::Unknown(other),
        }
    }

    /// Wire tag for this kind
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            EventKind::Start { .. } => KIND_ZONE_START,
            EventKind::End => KIND_ZONE_END,
            EventKind::FrameMark => KIND_FRAME_MARK,
            EventKind::Unknown(tag) => *tag,
        }
    }
}

/// One zone event from one remote thread
///
/// Moved into exactly one mailbox and consumed exactly once by its actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub thread_key: ThreadKey,
}

impl Event {
    pub fn start(thread_key: ThreadKey, name: impl Into<String>) -> Self {
        Self { kind: EventKind::Start { name: name.into() }, thread_key }
    }

    pub fn end(thread_key: ThreadKey) -> Self {
        Self { kind: EventKind::End, thread_key }
    }

    pub fn frame_mark(thread_key: ThreadKey) -> Self {
        Self { kind: EventKind::FrameMark, thread_key }
    }
}
