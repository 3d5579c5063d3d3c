//! Dispatcher façade
//!
//! The single write path into every mailbox. Ingestion hands it decoded
//! events (or raw payloads); it routes each to the actor for its thread key
//! and returns immediately. It never looks at an actor's call stack: whether
//! an End has a matching Start is the actor's business.

use std::sync::Arc;
use tokio::task::JoinError;

use super::actor::ActorRef;
use super::registry::ActorRegistry;
use super::shutdown::{join_all, ShutdownReport};
use super::stats::{DispatchStats, StatsSnapshot};
use crate::domain::{BridgeError, DispatchError, ThreadKey};
use crate::protocol::{decode, Event};
use crate::sink::InstrumentationSink;

/// Routes events to per-thread actors and coordinates their shutdown
pub struct Dispatcher<S: InstrumentationSink> {
    registry: ActorRegistry<S>,
    stats: Arc<DispatchStats>,
    sink: Arc<S>,
}

impl<S: InstrumentationSink> Dispatcher<S> {
    pub fn new(sink: Arc<S>) -> Self {
        let stats = Arc::new(DispatchStats::default());
        Self {
            registry: ActorRegistry::new(Arc::clone(&sink), Arc::clone(&stats)),
            stats,
            sink,
        }
    }

    /// Enqueue an event for its thread's actor, spawning the actor if needed
    ///
    /// Fire-and-forget: returns as soon as the event is queued.
    ///
    /// # Errors
    /// Returns [`DispatchError::ActorSpawn`] if a new actor could not be
    /// started, [`DispatchError::ActorGone`] if the key's actor has died, or
    /// [`DispatchError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub fn submit(&self, event: Event) -> Result<(), DispatchError> {
        // Counted before posting: any snapshot has submitted >= applied
        self.stats.record_submitted();
        self.registry.post(event).inspect_err(|_| self.stats.retract_submitted())
    }

    /// Decode one frame payload and submit it
    ///
    /// # Errors
    /// Returns [`BridgeError::Decode`] for a malformed payload (nothing is
    /// enqueued), or [`BridgeError::Dispatch`] as for [`submit`](Self::submit).
    pub fn submit_bytes(&self, payload: &[u8]) -> Result<(), BridgeError> {
        let event = decode(payload)?;
        self.submit(event)?;
        Ok(())
    }

    /// Drain and stop every actor, then clear the registry
    ///
    /// Every event submitted before this call is applied before its actor
    /// exits, and zones still open are closed innermost first. Safe to call
    /// more than once; later calls return an empty report.
    pub fn shutdown(&self) -> ShutdownReport {
        let actors = self.registry.close_and_take();
        join_all(actors)
    }

    /// [`shutdown`](Self::shutdown) on tokio's blocking pool
    ///
    /// Joining actor threads blocks; async callers use this so the join does
    /// not stall a runtime worker.
    ///
    /// # Errors
    /// Returns the [`JoinError`] if the blocking task itself panicked.
    pub async fn shutdown_async(self: Arc<Self>) -> Result<ShutdownReport, JoinError> {
        tokio::task::spawn_blocking(move || self.shutdown()).await
    }

    pub fn registry(&self) -> &ActorRegistry<S> {
        &self.registry
    }

    /// Read-only view of the actor for `key`, if one has been created
    pub fn actor(&self, key: ThreadKey) -> Option<ActorRef> {
        self.registry.actor(key)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }
}

impl<S: InstrumentationSink> Drop for Dispatcher<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode;
    use crate::sink::testing::PanicOnFrame;
    use crate::sink::{MemorySink, SinkCall};

    fn dispatcher() -> Dispatcher<MemorySink> {
        Dispatcher::new(Arc::new(MemorySink::new()))
    }

    #[test]
    fn test_nested_zones_replayed_in_order() {
        let dispatcher = dispatcher();
        let key = ThreadKey(1);
        dispatcher.submit(Event::start(key, "foo")).unwrap();
        dispatcher.submit(Event::start(key, "bar")).unwrap();
        dispatcher.submit(Event::end(key)).unwrap();
        dispatcher.submit(Event::end(key)).unwrap();
        let report = dispatcher.shutdown();

        let calls = dispatcher.sink().calls_for(key);
        assert_eq!(calls.len(), 5);
        assert!(matches!(&calls[0], SinkCall::Label { label, .. } if label == "Thread#1"));
        let (foo, bar) = match (&calls[1], &calls[2]) {
            (
                SinkCall::Begin { zone_id: foo, name: n1, .. },
                SinkCall::Begin { zone_id: bar, name: n2, .. },
            ) if n1 == "foo" && n2 == "bar" => (*foo, *bar),
            other => panic!("unexpected begins: {other:?}"),
        };
        assert!(matches!(&calls[3], SinkCall::End { zone_id, .. } if *zone_id == bar));
        assert!(matches!(&calls[4], SinkCall::End { zone_id, .. } if *zone_id == foo));

        assert_eq!(report.actors_joined(), 1);
        assert_eq!(report.zones_unwound(), 0);
    }

    #[test]
    fn test_submit_bytes_rejects_malformed_payload() {
        let dispatcher = dispatcher();
        let err = dispatcher.submit_bytes(&[1, 0, 0]).unwrap_err();

        assert!(matches!(err, BridgeError::Decode(_)));
        assert!(dispatcher.registry().is_empty());
        assert_eq!(dispatcher.stats().events_submitted, 0);
    }

    #[test]
    fn test_submit_bytes_routes_decoded_event() {
        let dispatcher = dispatcher();
        dispatcher.submit_bytes(&encode(&Event::start(ThreadKey(9), "tick"))).unwrap();
        dispatcher.shutdown();

        assert_eq!(dispatcher.sink().begin_count(), 1);
        assert_eq!(dispatcher.stats().events_submitted, 1);
    }

    #[test]
    fn test_submit_after_shutdown_is_refused() {
        let dispatcher = dispatcher();
        dispatcher.shutdown();
        assert!(matches!(
            dispatcher.submit(Event::start(ThreadKey(1), "late")),
            Err(DispatchError::ShutDown)
        ));
        assert_eq!(dispatcher.stats().events_submitted, 0);
    }

    #[test]
    fn test_dead_actor_does_not_affect_other_keys() {
        let dispatcher = Dispatcher::new(Arc::new(PanicOnFrame));
        dispatcher.submit(Event::frame_mark(ThreadKey(1))).unwrap();

        let dead = dispatcher.actor(ThreadKey(1)).unwrap();
        for _ in 0..500 {
            if !dead.is_running() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!dead.is_running());

        assert!(matches!(
            dispatcher.submit(Event::end(ThreadKey(1))),
            Err(DispatchError::ActorGone { key: ThreadKey(1) })
        ));
        dispatcher.submit(Event::start(ThreadKey(2), "fine")).unwrap();

        let report = dispatcher.shutdown();
        assert_eq!(report.panicked, [ThreadKey(1)]);
        assert_eq!(report.actors_joined(), 1);
        assert_eq!(report.zones_unwound(), 1);
        assert_eq!(dispatcher.stats().events_submitted, 2);
        assert!(!dead.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_async_drains_actors() {
        let dispatcher = Arc::new(dispatcher());
        dispatcher.submit(Event::start(ThreadKey(1), "open")).unwrap();
        dispatcher.submit(Event::frame_mark(ThreadKey(2))).unwrap();

        let report = Arc::clone(&dispatcher).shutdown_async().await.unwrap();

        assert_eq!(report.actors_joined(), 2);
        assert_eq!(report.zones_unwound(), 1);
        assert!(dispatcher.registry().is_closed());
    }

    #[test]
    fn test_shutdown_twice() {
        let dispatcher = dispatcher();
        dispatcher.submit(Event::start(ThreadKey(1), "a")).unwrap();

        let first = dispatcher.shutdown();
        let second = dispatcher.shutdown();

        assert_eq!(first.actors_joined(), 1);
        assert!(second.is_empty());
        assert_eq!(dispatcher.sink().end_count(), 1);
    }
}
