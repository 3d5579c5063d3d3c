//! Chrome Trace Event Format sink
//!
//! Collects replayed zones as `B`/`E` pairs on one track per remote thread,
//! frame marks as global instant events, and timeline labels as
//! `thread_name` metadata. [`ChromeTraceSink::export`] writes the result as
//! JSON for Perfetto, Speedscope or `chrome://tracing`.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use super::InstrumentationSink;
use crate::domain::{ExportError, Timeline, ZoneSite};

/// Chrome Trace Event format
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Event name (zone name)
    name: String,
    /// Category for filtering/coloring
    cat: String,
    /// Phase: "B" = begin, "E" = end, "i" = instant, "M" = metadata
    ph: String,
    /// Timestamp in microseconds since the sink was created
    ts: f64,
    /// Process ID (the bridge's own)
    pid: u32,
    /// Track ID (the remote thread key)
    tid: i64,
    /// Instant event scope: "g" = global
    #[serde(skip_serializing_if = "Option::is_none")]
    s: Option<String>,
    /// Optional arguments (metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace<'a> {
    #[serde(rename = "traceEvents")]
    trace_events: &'a [ChromeTraceEvent],
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
}

/// Open zone token: the track and name its `E` event needs
#[derive(Debug)]
pub struct ChromeZone {
    tid: i64,
    name: String,
}

/// Chrome trace sink for timeline visualization
pub struct ChromeTraceSink {
    /// Collected trace events, in arrival order
    events: Mutex<Vec<ChromeTraceEvent>>,
    /// Zero point for relative timestamps
    origin: Instant,
    pid: u32,
}

impl ChromeTraceSink {
    /// Create an empty sink; timestamps are relative to this call
    #[must_use]
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()), origin: Instant::now(), pid: std::process::id() }
    }

    fn now_us(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000_000.0
    }

    fn push(&self, event: ChromeTraceEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// # Example
    /// ```
    /// use zonebridge::sink::ChromeTraceSink;
    ///
    /// # fn example() -> Result<(), zonebridge::domain::ExportError> {
    /// let sink = ChromeTraceSink::new();
    /// let mut buffer = Vec::new();
    /// sink.export(&mut buffer)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying write fails.
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let trace = ChromeTrace { trace_events: &events, display_time_unit: "ms" };
        serde_json::to_writer_pretty(writer, &trace)?;
        Ok(())
    }

    /// Get the number of events collected, metadata included
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ChromeTraceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrumentationSink for ChromeTraceSink {
    type Zone = ChromeZone;

    fn set_timeline_label(&self, timeline: &Timeline) {
        let mut args = HashMap::new();
        args.insert("name".to_string(), serde_json::json!(timeline.label));

        self.push(ChromeTraceEvent {
            name: "thread_name".to_string(),
            cat: String::new(),
            ph: "M".to_string(),
            ts: 0.0,
            pid: self.pid,
            tid: timeline.key.0,
            s: None,
            args: Some(args),
        });
    }

    fn begin_zone(&self, timeline: &Timeline, site: ZoneSite<'_>) -> ChromeZone {
        let mut args = HashMap::new();
        args.insert("function".to_string(), serde_json::json!(site.function));
        args.insert("source".to_string(), serde_json::json!(site.source));

        self.push(ChromeTraceEvent {
            name: site.name.to_string(),
            cat: "zone".to_string(),
            ph: "B".to_string(),
            ts: self.now_us(),
            pid: self.pid,
            tid: timeline.key.0,
            s: None,
            args: Some(args),
        });

        ChromeZone { tid: timeline.key.0, name: site.name.to_string() }
    }

    fn end_zone(&self, zone: ChromeZone) {
        self.push(ChromeTraceEvent {
            name: zone.name,
            cat: "zone".to_string(),
            ph: "E".to_string(),
            ts: self.now_us(),
            pid: self.pid,
            tid: zone.tid,
            s: None,
            args: None,
        });
    }

    fn mark_frame(&self) {
        self.push(ChromeTraceEvent {
            name: "Frame".to_string(),
            cat: "frame".to_string(),
            ph: "i".to_string(),
            ts: self.now_us(),
            pid: self.pid,
            tid: 0,
            s: Some("g".to_string()),
            args: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreadKey;

    fn exported(sink: &ChromeTraceSink) -> serde_json::Value {
        let mut buffer = Vec::new();
        sink.export(&mut buffer).unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_empty_trace_is_valid() {
        let json = exported(&ChromeTraceSink::new());
        assert_eq!(json["traceEvents"].as_array().unwrap().len(), 0);
        assert_eq!(json["displayTimeUnit"], "ms");
    }

    #[test]
    fn test_zone_pair_on_thread_track() {
        let sink = ChromeTraceSink::new();
        let timeline = Timeline::for_key(ThreadKey(17));
        sink.set_timeline_label(&timeline);
        let zone = sink.begin_zone(&timeline, ZoneSite::remote("update"));
        sink.end_zone(zone);

        let json = exported(&sink);
        let events = json["traceEvents"].as_array().unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0]["ph"], "M");
        assert_eq!(events[0]["args"]["name"], "Thread#17");

        assert_eq!(events[1]["ph"], "B");
        assert_eq!(events[1]["name"], "update");
        assert_eq!(events[1]["tid"], 17);
        assert_eq!(events[1]["args"]["function"], "update");
        assert_eq!(events[1]["args"]["source"], "JavaRemote");

        assert_eq!(events[2]["ph"], "E");
        assert_eq!(events[2]["name"], "update");
        assert!(events[2]["ts"].as_f64().unwrap() >= events[1]["ts"].as_f64().unwrap());
    }

    #[test]
    fn test_frame_mark_is_global_instant() {
        let sink = ChromeTraceSink::new();
        sink.mark_frame();

        let json = exported(&sink);
        let frame = &json["traceEvents"][0];
        assert_eq!(frame["ph"], "i");
        assert_eq!(frame["s"], "g");
        assert_eq!(frame["name"], "Frame");
        assert!(frame.get("args").is_none());
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_write_failure_surfaces_as_json_error() {
        let sink = ChromeTraceSink::new();
        sink.mark_frame();

        let err = sink.export(BrokenWriter).unwrap_err();
        assert!(matches!(err, ExportError::Json(ref e) if e.is_io()));
    }
}
