//! # Thread Actors
//!
//! One actor per remote thread key. Each owns a dedicated OS thread, an
//! unbounded FIFO mailbox and a private call stack of open zones. Nothing
//! outside the actor's thread ever touches the call stack, so applying an
//! event needs no lock at all.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn ──▶ set_timeline_label ──▶ recv / apply ... ──▶ unwind ──▶ ActorSummary
//!                                      ▲
//!                 mailbox sender dropped (stop request) ends the loop
//!                 only once every queued event has been applied
//! ```
//!
//! Stopping is cooperative: dropping the last mailbox sender is both the stop
//! flag and the wake-up. `recv` keeps returning queued events after the
//! disconnect and only fails once the queue is empty, so a stop can never
//! overtake an event that was posted before it.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::stats::DispatchStats;
use crate::domain::{DispatchError, ThreadKey, Timeline, ZoneSite};
use crate::protocol::{Event, EventKind};
use crate::sink::InstrumentationSink;

/// What an actor reports when its thread exits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSummary {
    pub thread_key: ThreadKey,
    /// Events taken from the mailbox and applied, of any kind
    pub events_applied: u64,
    /// Zones still open at exit, closed innermost first
    pub zones_unwound: usize,
}

/// Read-only view of an actor, safe to hold across shutdown
#[derive(Debug, Clone)]
pub struct ActorRef {
    key: ThreadKey,
    running: Arc<AtomicBool>,
}

impl ActorRef {
    pub fn key(&self) -> ThreadKey {
        self.key
    }

    /// `true` until the actor's thread has drained its mailbox and exited
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Owning handle to a live actor, held by the registry
pub struct ActorHandle {
    key: ThreadKey,
    mailbox: Option<Sender<Event>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<ActorSummary>>,
}

impl ActorHandle {
    /// Start an actor thread for `key`
    ///
    /// # Errors
    /// Returns [`DispatchError::ActorSpawn`] if the OS refuses a new thread.
    pub fn spawn<S: InstrumentationSink>(
        key: ThreadKey,
        sink: Arc<S>,
        stats: Arc<DispatchStats>,
    ) -> Result<Self, DispatchError> {
        let (tx, rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = Arc::clone(&running);

        let actor = ThreadActor::new(key, sink, stats);
        let worker = thread::Builder::new()
            .name(format!("zone-{}", key.0))
            .spawn(move || {
                // Declared first so it drops last, after the mailbox
                let _exited = ClearOnExit(running_for_thread);
                let mailbox = rx;
                actor.run(&mailbox)
            })
            .map_err(|source| DispatchError::ActorSpawn { key, source })?;

        Ok(Self { key, mailbox: Some(tx), running, worker: Some(worker) })
    }

    pub fn key(&self) -> ThreadKey {
        self.key
    }

    pub fn actor_ref(&self) -> ActorRef {
        ActorRef { key: self.key, running: Arc::clone(&self.running) }
    }

    /// Append an event to the mailbox, waking the actor if it is idle
    ///
    /// # Errors
    /// Returns [`DispatchError::ShutDown`] once a stop has been requested,
    /// or [`DispatchError::ActorGone`] if the actor's thread has died.
    pub fn post(&self, event: Event) -> Result<(), DispatchError> {
        debug_assert_eq!(event.thread_key, self.key, "event routed to the wrong actor");
        let mailbox = self.mailbox.as_ref().ok_or(DispatchError::ShutDown)?;
        mailbox.send(event).map_err(|_| DispatchError::ActorGone { key: self.key })
    }

    /// Phase 1 of shutdown: ask the actor to stop once its mailbox is empty
    ///
    /// Never blocks. Calling it twice is a no-op.
    pub fn request_stop(&mut self) {
        self.mailbox = None;
    }

    /// Phase 2 of shutdown: wait for the actor's thread to exit
    ///
    /// Requests a stop first if that has not happened yet, so this can never
    /// wait on an actor that was not told to finish.
    ///
    /// # Errors
    /// Returns the panic payload if the actor's thread panicked.
    pub fn join(mut self) -> thread::Result<ActorSummary> {
        self.request_stop();
        match self.worker.take() {
            Some(worker) => worker.join(),
            None => Ok(ActorSummary { thread_key: self.key, events_applied: 0, zones_unwound: 0 }),
        }
    }
}

/// Clears the running flag when the actor thread exits, panics included
struct ClearOnExit(Arc<AtomicBool>);

impl Drop for ClearOnExit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State that lives on the actor's own thread
struct ThreadActor<S: InstrumentationSink> {
    timeline: Timeline,
    sink: Arc<S>,
    stats: Arc<DispatchStats>,
    call_stack: Vec<S::Zone>,
    events_applied: u64,
}

impl<S: InstrumentationSink> ThreadActor<S> {
    fn new(key: ThreadKey, sink: Arc<S>, stats: Arc<DispatchStats>) -> Self {
        Self {
            timeline: Timeline::for_key(key),
            sink,
            stats,
            call_stack: Vec::new(),
            events_applied: 0,
        }
    }

    fn run(mut self, mailbox: &Receiver<Event>) -> ActorSummary {
        self.sink.set_timeline_label(&self.timeline);

        while let Ok(event) = mailbox.recv() {
            self.apply(event);
        }

        let zones_unwound = self.unwind();
        ActorSummary {
            thread_key: self.timeline.key,
            events_applied: self.events_applied,
            zones_unwound,
        }
    }

    fn apply(&mut self, event: Event) {
        match event.kind {
            EventKind::Start { name } => {
                let zone = self.sink.begin_zone(&self.timeline, ZoneSite::remote(&name));
                self.call_stack.push(zone);
                self.stats.record_zone_begun();
            }
            EventKind::End => {
                // End with nothing open: ignored
                if let Some(zone) = self.call_stack.pop() {
                    self.sink.end_zone(zone);
                    self.stats.record_zone_ended();
                } else {
                    self.stats.record_unmatched_end();
                }
            }
            EventKind::FrameMark => {
                self.sink.mark_frame();
                self.stats.record_frame_mark();
            }
            EventKind::Unknown(_) => self.stats.record_unknown_kind(),
        }
        self.events_applied += 1;
        self.stats.record_applied();
    }

    /// Close every zone still open, innermost first
    fn unwind(&mut self) -> usize {
        let open = self.call_stack.len();
        while let Some(zone) = self.call_stack.pop() {
            self.sink.end_zone(zone);
        }
        self.stats.record_zones_unwound(open as u64);
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::PanicOnFrame;
    use crate::sink::{MemorySink, SinkCall};

    fn wait_for_exit(actor: &ActorRef) {
        for _ in 0..500 {
            if !actor.is_running() {
                return;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("actor for {} never exited", actor.key());
    }

    fn actor(key: i64) -> (ThreadActor<MemorySink>, Arc<MemorySink>, Arc<DispatchStats>) {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(DispatchStats::default());
        (ThreadActor::new(ThreadKey(key), Arc::clone(&sink), Arc::clone(&stats)), sink, stats)
    }

    #[test]
    fn test_nested_zones_close_innermost_first() {
        let (mut actor, sink, _) = actor(1);
        actor.apply(Event::start(ThreadKey(1), "foo"));
        actor.apply(Event::start(ThreadKey(1), "bar"));
        actor.apply(Event::end(ThreadKey(1)));
        actor.apply(Event::end(ThreadKey(1)));

        let ends: Vec<_> = sink
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::End { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(ends, ["bar", "foo"]);
        assert!(actor.call_stack.is_empty());
    }

    #[test]
    fn test_unmatched_end_is_counted_not_forwarded() {
        let (mut actor, sink, stats) = actor(1);
        actor.apply(Event::end(ThreadKey(1)));

        assert_eq!(sink.end_count(), 0);
        assert_eq!(stats.snapshot().unmatched_ends, 1);
        assert_eq!(actor.events_applied, 1);
    }

    #[test]
    fn test_frame_mark_leaves_stack_alone() {
        let (mut actor, sink, _) = actor(1);
        actor.apply(Event::start(ThreadKey(1), "outer"));
        actor.apply(Event::frame_mark(ThreadKey(1)));

        assert_eq!(sink.frame_count(), 1);
        assert_eq!(actor.call_stack.len(), 1);
    }

    #[test]
    fn test_unknown_kind_has_no_side_effect() {
        let (mut actor, sink, stats) = actor(1);
        actor.apply(Event { kind: EventKind::Unknown(42), thread_key: ThreadKey(1) });

        assert!(sink.calls().is_empty());
        assert_eq!(stats.snapshot().unknown_kinds, 1);
    }

    #[test]
    fn test_unwind_closes_open_zones_lifo() {
        let (mut actor, sink, stats) = actor(1);
        actor.apply(Event::start(ThreadKey(1), "a"));
        actor.apply(Event::start(ThreadKey(1), "b"));

        assert_eq!(actor.unwind(), 2);
        let calls = sink.calls();
        assert!(matches!(&calls[2], SinkCall::End { name, .. } if name == "b"));
        assert!(matches!(&calls[3], SinkCall::End { name, .. } if name == "a"));
        assert_eq!(stats.snapshot().zones_unwound, 2);
    }

    #[test]
    fn test_spawned_actor_drains_before_exit() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(DispatchStats::default());
        let handle = ActorHandle::spawn(ThreadKey(5), Arc::clone(&sink), stats).unwrap();
        let actor_ref = handle.actor_ref();

        for i in 0..100 {
            handle.post(Event::start(ThreadKey(5), format!("z{i}"))).unwrap();
            handle.post(Event::end(ThreadKey(5))).unwrap();
        }
        let summary = handle.join().unwrap();

        assert_eq!(summary.events_applied, 200);
        assert_eq!(summary.zones_unwound, 0);
        assert!(!actor_ref.is_running());
        // label first, then the 100 begin/end pairs
        assert_eq!(sink.calls_for(ThreadKey(5)).len(), 201);
    }

    #[test]
    fn test_post_after_stop_request_fails() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(DispatchStats::default());
        let mut handle = ActorHandle::spawn(ThreadKey(1), sink, stats).unwrap();

        handle.request_stop();
        handle.request_stop();
        assert!(matches!(handle.post(Event::end(ThreadKey(1))), Err(DispatchError::ShutDown)));
        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_panicked_actor_reports_exit_and_refuses_posts() {
        let stats = Arc::new(DispatchStats::default());
        let handle = ActorHandle::spawn(ThreadKey(1), Arc::new(PanicOnFrame), stats).unwrap();
        let actor_ref = handle.actor_ref();

        handle.post(Event::frame_mark(ThreadKey(1))).unwrap();
        wait_for_exit(&actor_ref);

        assert!(matches!(
            handle.post(Event::end(ThreadKey(1))),
            Err(DispatchError::ActorGone { key: ThreadKey(1) })
        ));
        assert!(handle.join().is_err());
        assert!(!actor_ref.is_running());
    }
}
