//! Headless sink that reports zones through `log`
//!
//! Useful when no trace file is wanted: run with `RUST_LOG=zonebridge=debug`
//! to watch zones close with their durations.

use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::InstrumentationSink;
use crate::domain::{ThreadKey, Timeline, ZoneSite};

/// Open zone token
#[derive(Debug)]
pub struct LogZone {
    key: ThreadKey,
    name: String,
    opened: Instant,
}

/// Sink that logs zone completions and counts what it saw
#[derive(Debug, Default)]
pub struct LogSink {
    zones_completed: AtomicU64,
    frames_marked: AtomicU64,
}

impl LogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zones_completed(&self) -> u64 {
        self.zones_completed.load(Ordering::Relaxed)
    }

    pub fn frames_marked(&self) -> u64 {
        self.frames_marked.load(Ordering::Relaxed)
    }
}

impl InstrumentationSink for LogSink {
    type Zone = LogZone;

    fn set_timeline_label(&self, timeline: &Timeline) {
        debug!("timeline {} opened", timeline.label);
    }

    fn begin_zone(&self, timeline: &Timeline, site: ZoneSite<'_>) -> LogZone {
        trace!("[BEGIN] {} {}", timeline.label, site.name);
        LogZone { key: timeline.key, name: site.name.to_string(), opened: Instant::now() }
    }

    fn end_zone(&self, zone: LogZone) {
        self.zones_completed.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[ZONE] {} {} {:.3}ms",
            zone.key,
            zone.name,
            zone.opened.elapsed().as_secs_f64() * 1000.0
        );
    }

    fn mark_frame(&self) {
        self.frames_marked.fetch_add(1, Ordering::Relaxed);
        trace!("[FRAME]");
    }
}
