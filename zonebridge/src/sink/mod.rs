//! Instrumentation sinks
//!
//! A sink is whatever turns "begin zone", "end zone" and "frame mark" into
//! recorded profiling data. The dispatcher treats it as opaque: it never
//! inspects a return value except the zone token it must later hand back.
//!
//! - [`ChromeTraceSink`]: collects a Chrome Trace Event Format timeline
//! - [`LogSink`]: headless mode, reports zones through `log`
//! - [`MemorySink`]: records every call verbatim, for tests and embedding

pub mod chrome_trace;
pub mod log_sink;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use chrome_trace::ChromeTraceSink;
pub use log_sink::LogSink;
pub use memory::{MemorySink, SinkCall};

use crate::domain::{Timeline, ZoneSite};

/// Backend that receives replayed zones
///
/// Calls for one timeline always come from the same actor thread, in order.
/// Calls for different timelines arrive concurrently, so implementations
/// must be internally synchronized.
pub trait InstrumentationSink: Send + Sync + 'static {
    /// Token for an open zone; moved back into [`end_zone`](Self::end_zone)
    /// exactly once
    type Zone: Send + 'static;

    /// Name a timeline; called once per actor before its first zone
    fn set_timeline_label(&self, timeline: &Timeline);

    /// Open a zone on `timeline`
    fn begin_zone(&self, timeline: &Timeline, site: ZoneSite<'_>) -> Self::Zone;

    /// Close a zone previously returned by [`begin_zone`](Self::begin_zone)
    fn end_zone(&self, zone: Self::Zone);

    /// Record a global frame boundary
    fn mark_frame(&self);
}
