//! Per-key dispatch core
//!
//! Events for different remote threads are applied in parallel; events for
//! the same remote thread are applied strictly in submission order.
//!
//! - `dispatcher`: façade, the only write path into mailboxes
//! - `registry`: thread key → actor, lazy creation
//! - `actor`: one OS thread, mailbox and call stack per key
//! - `shutdown`: two-phase stop-and-join
//! - `stats`: counters for events that are absorbed silently

pub mod actor;
pub mod dispatcher;
pub mod registry;
pub mod shutdown;
pub mod stats;

pub use actor::{ActorHandle, ActorRef, ActorSummary};
pub use dispatcher::Dispatcher;
pub use registry::ActorRegistry;
pub use shutdown::ShutdownReport;
pub use stats::{DispatchStats, StatsSnapshot};
