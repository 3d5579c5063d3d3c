//! Sinks that misbehave on purpose

use super::InstrumentationSink;
use crate::domain::{Timeline, ZoneSite};

/// Sink whose frame marks panic, standing in for a failing backend
pub(crate) struct PanicOnFrame;

impl InstrumentationSink for PanicOnFrame {
    type Zone = ();

    fn set_timeline_label(&self, _timeline: &Timeline) {}

    fn begin_zone(&self, _timeline: &Timeline, _site: ZoneSite<'_>) {}

    fn end_zone(&self, _zone: ()) {}

    fn mark_frame(&self) {
        panic!("frame sink failed");
    }
}
