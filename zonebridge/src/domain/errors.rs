//! Structured error types for zonebridge
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::ThreadKey;
use thiserror::Error;

/// A payload that does not hold exactly one well-formed event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed message: {field} needs {needed} bytes, {available} available")]
    Truncated { field: &'static str, needed: usize, available: usize },

    #[error("Malformed message: negative name length {0}")]
    NegativeLength(i32),

    #[error("Malformed message: {0} trailing bytes after thread key")]
    TrailingBytes(usize),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to spawn actor for {key}: {source}")]
    ActorSpawn {
        key: ThreadKey,
        #[source]
        source: std::io::Error,
    },

    #[error("Dispatcher is shut down")]
    ShutDown,

    /// The actor's thread died (its sink panicked); events for this key are dropped
    #[error("Actor for {key} is gone, event dropped")]
    ActorGone { key: ThreadKey },
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Connection closed mid-frame")]
    UnexpectedEof,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Any failure while turning one received frame into a dispatched event
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
