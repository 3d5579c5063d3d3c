//! # TCP Ingestion
//!
//! Accepts emitter connections and feeds every received frame to the
//! [`Dispatcher`]. Each connection runs as its own tokio task; none of them
//! ever waits on an actor, because submitting only enqueues.
//!
//! ## Failure Scope
//!
//! - Malformed message → logged and dropped, the connection keeps reading
//! - Oversized frame, truncated frame, I/O error → that connection closes
//! - Event for a key whose actor died → logged and dropped
//! - Actor spawn failure → that connection closes
//!
//! Nothing a single connection does can stop the server or another
//! connection.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zonebridge_common::{DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT};

use crate::dispatch::Dispatcher;
use crate::domain::{BridgeError, DispatchError};
use crate::protocol::read_frame;
use crate::sink::InstrumentationSink;

/// Listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Frames declaring a larger payload close their connection
    pub max_frame_bytes: usize,
    /// Concurrent connections allowed; 0 = unlimited
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_connections: 0,
        }
    }
}

/// Transport-level counters
#[derive(Debug, Default)]
pub struct IngestStats {
    connections_accepted: AtomicU64,
    connections_rejected: AtomicU64,
    frames_received: AtomicU64,
    malformed_messages: AtomicU64,
    dropped_events: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub connections_accepted: u64,
    pub connections_rejected: u64,
    pub frames_received: u64,
    pub malformed_messages: u64,
    /// Events for a key whose actor died
    pub dropped_events: u64,
}

impl IngestStats {
    #[must_use]
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
        }
    }
}

/// Read frames from one stream until it ends, submitting each
///
/// Returns `Ok(())` when the peer closes the stream between frames.
///
/// # Errors
/// Returns an error on a framing or I/O failure, or when the dispatcher
/// refuses an event (actor spawn failure, shutdown).
pub async fn serve_connection<R, S>(
    mut reader: R,
    dispatcher: &Dispatcher<S>,
    max_frame_bytes: usize,
    stats: &IngestStats,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    S: InstrumentationSink,
{
    while let Some(payload) = read_frame(&mut reader, max_frame_bytes).await? {
        stats.frames_received.fetch_add(1, Ordering::Relaxed);
        match dispatcher.submit_bytes(&payload) {
            Ok(()) => {}
            Err(BridgeError::Decode(e)) => {
                stats.malformed_messages.fetch_add(1, Ordering::Relaxed);
                warn!("Dropping message: {e}");
            }
            Err(BridgeError::Dispatch(e @ DispatchError::ActorGone { .. })) => {
                stats.dropped_events.fetch_add(1, Ordering::Relaxed);
                warn!("{e}");
            }
            Err(BridgeError::Dispatch(e)) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Bound listener plus the dispatcher it feeds
pub struct Server<S: InstrumentationSink> {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<S>>,
    config: ServerConfig,
    stats: Arc<IngestStats>,
}

impl<S: InstrumentationSink> Server<S> {
    /// Bind the listening socket
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn bind(config: ServerConfig, dispatcher: Arc<Dispatcher<S>>) -> Result<Self> {
        let listener = TcpListener::bind(config.listen)
            .await
            .with_context(|| format!("Failed to listen on {}", config.listen))?;
        Ok(Self { listener, dispatcher, config, stats: Arc::new(IngestStats::default()) })
    }

    /// Address actually bound (useful with port 0)
    ///
    /// # Errors
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Listener has no local address")
    }

    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Accept connections until `stop` resolves, then close them all
    ///
    /// Connection tasks are aborted at their next await point, which is
    /// always between two submits, so no event is half-dispatched. The
    /// dispatcher itself is left running; shutting it down is the caller's
    /// job.
    ///
    /// # Errors
    /// Returns an error if accepting fails at the listener level.
    pub async fn run_until<F>(self, stop: F) -> Result<IngestSnapshot>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);

        let limit = (self.config.max_connections > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_connections)));
        let mut connections = JoinSet::new();

        info!("Listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                () = &mut stop => break,
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.context("Failed to accept connection")?;

                    let permit = match &limit {
                        Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                            Ok(permit) => Some(permit),
                            Err(_) => {
                                self.stats.connections_rejected.fetch_add(1, Ordering::Relaxed);
                                warn!("Rejecting {peer}: connection limit reached");
                                continue;
                            }
                        },
                        None => None,
                    };

                    self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
                    info!("Emitter connected: {peer}");

                    let dispatcher = Arc::clone(&self.dispatcher);
                    let stats = Arc::clone(&self.stats);
                    let max_frame_bytes = self.config.max_frame_bytes;
                    connections.spawn(async move {
                        let _permit = permit;
                        match serve_connection(stream, &dispatcher, max_frame_bytes, &stats).await {
                            Ok(()) => info!("Emitter disconnected: {peer}"),
                            Err(e) => warn!("Closing connection from {peer}: {e:#}"),
                        }
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        debug!("Closing {} open connections", connections.len());
        connections.abort_all();
        while connections.join_next().await.is_some() {}

        Ok(self.stats.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreadKey;
    use crate::protocol::{encode_frame, Event};
    use crate::sink::testing::PanicOnFrame;
    use crate::sink::MemorySink;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn frames(events: &[Event]) -> Vec<u8> {
        events.iter().flat_map(encode_frame).collect()
    }

    #[tokio::test]
    async fn test_malformed_message_does_not_close_connection() {
        let dispatcher = Dispatcher::new(Arc::new(MemorySink::new()));
        let stats = IngestStats::default();

        let mut stream = frames(&[Event::start(ThreadKey(1), "a")]);
        stream.extend_from_slice(&[0, 0, 0, 2, 1, 0]); // 2-byte payload
        stream.extend(frames(&[Event::end(ThreadKey(1))]));

        serve_connection(stream.as_slice(), &dispatcher, 1024, &stats).await.unwrap();
        dispatcher.shutdown();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_received, 3);
        assert_eq!(snap.malformed_messages, 1);
        assert_eq!(dispatcher.sink().end_count(), 1);
        assert_eq!(dispatcher.stats().zones_unwound, 0);
    }

    #[tokio::test]
    async fn test_oversized_frame_closes_connection() {
        let dispatcher = Dispatcher::new(Arc::new(MemorySink::new()));
        let stats = IngestStats::default();

        let stream = frames(&[Event::start(ThreadKey(1), "a-rather-long-zone-name")]);
        let result = serve_connection(stream.as_slice(), &dispatcher, 8, &stats).await;

        assert!(result.is_err());
        assert_eq!(stats.snapshot().frames_received, 0);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_closes_connection() {
        let dispatcher = Dispatcher::new(Arc::new(MemorySink::new()));
        dispatcher.shutdown();
        let stats = IngestStats::default();

        let stream = frames(&[Event::frame_mark(ThreadKey(1))]);
        let result = serve_connection(stream.as_slice(), &dispatcher, 1024, &stats).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_event_for_dead_actor_keeps_connection_open() {
        let dispatcher = Dispatcher::new(Arc::new(PanicOnFrame));
        let stats = IngestStats::default();
        let (emitter, bridge_side) = tokio::io::duplex(1024);

        let feed = async {
            // Owned here so the stream closes when feeding ends
            let mut emitter = emitter;
            emitter.write_all(&encode_frame(&Event::frame_mark(ThreadKey(1)))).await.unwrap();
            for _ in 0..500 {
                if dispatcher.actor(ThreadKey(1)).is_some_and(|a| !a.is_running()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            emitter.write_all(&encode_frame(&Event::end(ThreadKey(1)))).await.unwrap();
            emitter.write_all(&encode_frame(&Event::start(ThreadKey(2), "ok"))).await.unwrap();
        };

        let (result, ()) =
            tokio::join!(serve_connection(bridge_side, &dispatcher, 1024, &stats), feed);
        result.unwrap();
        let report = dispatcher.shutdown();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_received, 3);
        assert_eq!(snap.dropped_events, 1);
        assert_eq!(report.panicked, [ThreadKey(1)]);
        assert_eq!(report.actors_joined(), 1);
    }
}
