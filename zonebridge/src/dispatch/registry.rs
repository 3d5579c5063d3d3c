//! Actor registry: thread key → live actor
//!
//! The registry is the only state shared between the ingestion path and
//! shutdown. Posting to a known key takes the read lock; only the first event
//! of a new key takes the write lock, and creation re-checks the map under it
//! so two racing submits for the same key still produce a single actor.
//!
//! Events are posted while the lock is held. Posting is a non-blocking push
//! onto an unbounded queue, and holding the lock means shutdown cannot slip
//! in between resolving an actor and enqueueing to it: an event either lands
//! before the stop request and is drained, or is refused with
//! [`DispatchError::ShutDown`].

use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::actor::{ActorHandle, ActorRef};
use super::stats::DispatchStats;
use crate::domain::{DispatchError, ThreadKey};
use crate::protocol::Event;
use crate::sink::InstrumentationSink;

#[derive(Default)]
struct RegistryState {
    actors: HashMap<ThreadKey, ActorHandle>,
    /// Set by the first shutdown; no actor is created afterwards
    closed: bool,
}

/// Map from remote thread key to the actor replaying it
pub struct ActorRegistry<S: InstrumentationSink> {
    state: RwLock<RegistryState>,
    sink: Arc<S>,
    stats: Arc<DispatchStats>,
}

impl<S: InstrumentationSink> ActorRegistry<S> {
    pub fn new(sink: Arc<S>, stats: Arc<DispatchStats>) -> Self {
        Self { state: RwLock::new(RegistryState::default()), sink, stats }
    }

    /// Look up the actor for `key`, spawning it on first sight
    ///
    /// # Errors
    /// Returns [`DispatchError::ActorSpawn`] if a new actor thread cannot be
    /// started, or [`DispatchError::ShutDown`] once shutdown has begun.
    pub fn resolve_or_create(&self, key: ThreadKey) -> Result<ActorRef, DispatchError> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(actor) = state.actors.get(&key) {
                return Ok(actor.actor_ref());
            }
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Ok(self.create_locked(&mut state, key)?.actor_ref())
    }

    /// Enqueue `event` on its actor's mailbox, creating the actor if needed
    ///
    /// # Errors
    /// Same as [`resolve_or_create`](Self::resolve_or_create).
    pub fn post(&self, event: Event) -> Result<(), DispatchError> {
        let key = event.thread_key;
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(actor) = state.actors.get(&key) {
                return actor.post(event);
            }
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.create_locked(&mut state, key)?.post(event)
    }

    fn create_locked<'a>(
        &self,
        state: &'a mut RegistryState,
        key: ThreadKey,
    ) -> Result<&'a ActorHandle, DispatchError> {
        if state.closed {
            return Err(DispatchError::ShutDown);
        }
        // Another submit may have created it between our read and write locks
        match state.actors.entry(key) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let handle =
                    ActorHandle::spawn(key, Arc::clone(&self.sink), Arc::clone(&self.stats))?;
                self.stats.record_actor_spawned();
                debug!("Spawned actor for {key}");
                Ok(&*entry.insert(handle))
            }
        }
    }

    /// Read-only view of the actor for `key`, if one exists
    pub fn actor(&self, key: ThreadKey) -> Option<ActorRef> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.actors.get(&key).map(ActorHandle::actor_ref)
    }

    /// Visit every live actor under the registry lock
    pub fn for_each(&self, mut f: impl FnMut(&ActorRef)) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        for actor in state.actors.values() {
            f(&actor.actor_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).closed
    }

    /// Close the registry, request a stop from every actor and hand them over
    ///
    /// Runs entirely under the write lock but never blocks on an actor. The
    /// registry is empty afterwards; a second call returns nothing.
    pub(crate) fn close_and_take(&self) -> Vec<ActorHandle> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state
            .actors
            .drain()
            .map(|(_, mut actor)| {
                actor.request_stop();
                actor
            })
            .collect()
    }
}
