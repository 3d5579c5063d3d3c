//! In-memory sink that records every call in order

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::InstrumentationSink;
use crate::domain::{ThreadKey, Timeline, ZoneSite};

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Label { key: ThreadKey, label: String },
    Begin { key: ThreadKey, zone_id: u64, name: String, function: String },
    End { key: ThreadKey, zone_id: u64, name: String },
    FrameMark,
}

/// Token for a zone opened on a [`MemorySink`]
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryZone {
    pub id: u64,
    pub key: ThreadKey,
    pub name: String,
}

/// Sink that keeps a log of every call
///
/// Zone IDs are unique across the sink, so an `End` can be matched to the
/// exact `Begin` that produced its token.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<SinkCall>>,
    next_zone_id: AtomicU64,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Every call so far, in the order the sink received them
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Calls that belong to one timeline, in order
    pub fn calls_for(&self, key: ThreadKey) -> Vec<SinkCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                SinkCall::Label { key: k, .. }
                | SinkCall::Begin { key: k, .. }
                | SinkCall::End { key: k, .. } => *k == key,
                SinkCall::FrameMark => false,
            })
            .collect()
    }

    pub fn begin_count(&self) -> usize {
        self.count(|call| matches!(call, SinkCall::Begin { .. }))
    }

    pub fn end_count(&self) -> usize {
        self.count(|call| matches!(call, SinkCall::End { .. }))
    }

    pub fn frame_count(&self) -> usize {
        self.count(|call| matches!(call, SinkCall::FrameMark))
    }

    fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).iter().filter(|c| pred(c)).count()
    }
}

impl InstrumentationSink for MemorySink {
    type Zone = MemoryZone;

    fn set_timeline_label(&self, timeline: &Timeline) {
        self.record(SinkCall::Label { key: timeline.key, label: timeline.label.clone() });
    }

    fn begin_zone(&self, timeline: &Timeline, site: ZoneSite<'_>) -> MemoryZone {
        let id = self.next_zone_id.fetch_add(1, Ordering::Relaxed);
        self.record(SinkCall::Begin {
            key: timeline.key,
            zone_id: id,
            name: site.name.to_string(),
            function: site.function.to_string(),
        });
        MemoryZone { id, key: timeline.key, name: site.name.to_string() }
    }

    fn end_zone(&self, zone: MemoryZone) {
        self.record(SinkCall::End { key: zone.key, zone_id: zone.id, name: zone.name });
    }

    fn mark_frame(&self) {
        self.record(SinkCall::FrameMark);
    }
}
