//! # zonebridge - Remote Instrumentation Bridge
//!
//! zonebridge receives zone events from instrumented processes over TCP and
//! replays them into a local instrumentation sink. Every remote thread gets a
//! dedicated local thread (an *actor*), so the sink sees each remote thread's
//! zones on a timeline of its own, begun and ended from the same OS thread.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Remote Emitters (any language)                  │
//! │        Start / End / FrameMark per remote thread key            │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ length-prefixed frames (TCP)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   zonebridge (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Server    │──▶│   Decoder    │──▶│  Dispatcher  │         │
//! │  │   (tokio)    │   │  (protocol)  │   │   (façade)   │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                                               │ key lookup      │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │   Registry   │         │
//! │                                        └──────┬───────┘         │
//! │                          ┌────────────────────┼──────────┐      │
//! │                          ▼                    ▼          ▼      │
//! │                   ┌────────────┐       ┌────────────┐           │
//! │                   │ Thread#1   │  ...  │ Thread#n   │  actors   │
//! │                   │ call stack │       │ call stack │           │
//! │                   └─────┬──────┘       └─────┬──────┘           │
//! │                         └─────────┬──────────┘                  │
//! │                                   ▼                             │
//! │                         ┌──────────────────┐                    │
//! │                         │ Instrumentation  │                    │
//! │                         │  Sink (trace /   │                    │
//! │                         │  log / memory)   │                    │
//! │                         └──────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`protocol`]: wire format
//!   - `decoder`: payload bytes → [`protocol::Event`]
//!   - `encoder`: the emitter side, used by tests and the demo client
//!   - `framing`: 4-byte length prefix over any `AsyncRead`
//!
//! - [`dispatch`]: per-key actors
//!   - `dispatcher`: submit / shutdown façade
//!   - `registry`: thread key → actor, created on first use
//!   - `actor`: mailbox, call stack and OS thread per key
//!   - `shutdown`: drain, unwind, join
//!
//! - [`sink`]: where zones end up
//!   - [`sink::ChromeTraceSink`]: Chrome Trace Event Format (Perfetto, `chrome://tracing`)
//!   - [`sink::LogSink`]: zones reported through `log`
//!   - [`sink::MemorySink`]: records every call, for tests
//!
//! - [`server`]: TCP listener feeding the dispatcher
//! - [`cli`]: command-line arguments
//! - [`domain`]: thread keys, timelines, zone sites, errors
//!
//! ## Ordering Guarantees
//!
//! - Events with the same thread key are applied in submission order
//! - Events with different thread keys are applied in parallel
//! - An End with no open zone is ignored
//! - Zones still open at shutdown are closed innermost first
//!
//! ## Typical Usage
//!
//! ```bash
//! # Bridge into a Chrome trace, written on Ctrl+C
//! ./zonebridge --listen 0.0.0.0:9001 --export trace.json
//!
//! # Log zones for ten seconds
//! RUST_LOG=zonebridge=debug ./zonebridge --duration 10
//! ```

pub mod cli;
pub mod dispatch;
pub mod domain;
pub mod protocol;
pub mod server;
pub mod sink;
