//! Two-phase shutdown
//!
//! Phase 1 ([`ActorRegistry::close_and_take`](super::ActorRegistry)) runs
//! under the registry lock: close the registry and request a stop from every
//! actor. Phase 2 ([`join_all`]) runs outside any lock and waits for each
//! actor to drain its mailbox, unwind its open zones and exit.

use log::error;

use super::actor::{ActorHandle, ActorSummary};
use crate::domain::ThreadKey;

/// Outcome of one shutdown call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every actor that exited normally, sorted by thread key
    pub actors: Vec<ActorSummary>,
    /// Actors whose thread panicked; their remaining events are lost
    pub panicked: Vec<ThreadKey>,
}

impl ShutdownReport {
    pub fn actors_joined(&self) -> usize {
        self.actors.len()
    }

    pub fn events_applied(&self) -> u64 {
        self.actors.iter().map(|a| a.events_applied).sum()
    }

    pub fn zones_unwound(&self) -> usize {
        self.actors.iter().map(|a| a.zones_unwound).sum()
    }

    /// `true` when the call found nothing left to stop
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.panicked.is_empty()
    }
}

/// Phase 2: wait for every stopped actor to exit
///
/// A panicked actor is logged and recorded; it does not stop the others from
/// being joined.
pub(crate) fn join_all(actors: Vec<ActorHandle>) -> ShutdownReport {
    let mut report = ShutdownReport::default();
    for actor in actors {
        let key = actor.key();
        match actor.join() {
            Ok(summary) => report.actors.push(summary),
            Err(_) => {
                error!("Actor for {key} panicked before draining its mailbox");
                report.panicked.push(key);
            }
        }
    }
    report.actors.sort_by_key(|a| a.thread_key);
    report.panicked.sort();
    report
}
