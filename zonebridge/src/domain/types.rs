//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep remote thread identities apart from local OS
//! thread IDs and frame sizes, and make function signatures more expressive.

use std::fmt;

/// Remote thread key
///
/// The emitter's identifier for one logical thread of execution. It has no
/// relation to any thread of this process; each key gets its own actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey(pub i64);

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread#{}", self.0)
    }
}

impl From<i64> for ThreadKey {
    fn from(key: i64) -> Self {
        ThreadKey(key)
    }
}

/// A named sequence of zones attributed to one remote thread
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timeline {
    pub key: ThreadKey,
    pub label: String,
}

impl Timeline {
    /// Timeline for a remote thread, labelled `Thread#<key>`
    #[must_use]
    pub fn for_key(key: ThreadKey) -> Self {
        Self { key, label: key.to_string() }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Source location attached to a zone when it is opened
///
/// Remote zones have no file or line; the zone name doubles as the function
/// label so the backend can group zones by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSite<'a> {
    pub name: &'a str,
    pub function: &'a str,
    pub source: &'static str,
}

impl<'a> ZoneSite<'a> {
    /// Source label for every zone that arrives over the wire
    pub const REMOTE_SOURCE: &'static str = "JavaRemote";

    /// Site for a remote zone: `name` is both the display name and function
    #[must_use]
    pub fn remote(name: &'a str) -> Self {
        Self { name, function: name, source: Self::REMOTE_SOURCE }
    }
}
