//! Dispatch counters
//!
//! Unmatched ends and unknown kinds are absorbed without logging; these
//! counters are how they stay observable. Every field is a relaxed atomic,
//! bumped once per event at most, so the hot path does no I/O.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the dispatcher and every actor
#[derive(Debug, Default)]
pub struct DispatchStats {
    events_submitted: AtomicU64,
    events_applied: AtomicU64,
    zones_begun: AtomicU64,
    zones_ended: AtomicU64,
    unmatched_ends: AtomicU64,
    unknown_kinds: AtomicU64,
    frame_marks: AtomicU64,
    actors_spawned: AtomicU64,
    zones_unwound: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub events_submitted: u64,
    pub events_applied: u64,
    pub zones_begun: u64,
    pub zones_ended: u64,
    pub unmatched_ends: u64,
    pub unknown_kinds: u64,
    pub frame_marks: u64,
    pub actors_spawned: u64,
    pub zones_unwound: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl DispatchStats {
    pub(crate) fn record_submitted(&self) {
        bump(&self.events_submitted);
    }

    /// Undo [`record_submitted`](Self::record_submitted) for a refused event
    pub(crate) fn retract_submitted(&self) {
        self.events_submitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_applied(&self) {
        bump(&self.events_applied);
    }

    pub(crate) fn record_zone_begun(&self) {
        bump(&self.zones_begun);
    }

    pub(crate) fn record_zone_ended(&self) {
        bump(&self.zones_ended);
    }

    pub(crate) fn record_unmatched_end(&self) {
        bump(&self.unmatched_ends);
    }

    pub(crate) fn record_unknown_kind(&self) {
        bump(&self.unknown_kinds);
    }

    pub(crate) fn record_frame_mark(&self) {
        bump(&self.frame_marks);
    }

    pub(crate) fn record_actor_spawned(&self) {
        bump(&self.actors_spawned);
    }

    pub(crate) fn record_zones_unwound(&self, count: u64) {
        self.zones_unwound.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_submitted: self.events_submitted.load(Ordering::Relaxed),
            events_applied: self.events_applied.load(Ordering::Relaxed),
            zones_begun: self.zones_begun.load(Ordering::Relaxed),
            zones_ended: self.zones_ended.load(Ordering::Relaxed),
            unmatched_ends: self.unmatched_ends.load(Ordering::Relaxed),
            unknown_kinds: self.unknown_kinds.load(Ordering::Relaxed),
            frame_marks: self.frame_marks.load(Ordering::Relaxed),
            actors_spawned: self.actors_spawned.load(Ordering::Relaxed),
            zones_unwound: self.zones_unwound.load(Ordering::Relaxed),
        }
    }
}
