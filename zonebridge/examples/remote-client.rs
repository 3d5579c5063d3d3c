//! Remote emitter for trying out zonebridge
//!
//! Starts a few worker threads, each sending nested zones under its own
//! thread key over one shared TCP connection, plus a frame mark per round.
//!
//! ## Usage
//!
//! ```bash
//! # In one terminal: run the bridge
//! ./target/release/zonebridge --export trace.json
//!
//! # In another terminal: emit zones (address defaults to 127.0.0.1:9001)
//! cargo run --example remote-client -- 127.0.0.1:9001
//! ```

use anyhow::{Context, Result};
use std::io::Write;
use std::net::TcpStream;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use zonebridge::domain::ThreadKey;
use zonebridge::protocol::{encode_frame, Event};

const WORKERS: i64 = 4;
const ROUNDS: usize = 50;

fn send(stream: &Mutex<TcpStream>, event: &Event) -> Result<()> {
    let frame = encode_frame(event);
    stream
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .write_all(&frame)
        .context("Failed to send frame")
}

fn worker(stream: &Mutex<TcpStream>, key: ThreadKey) -> Result<()> {
    for round in 0..ROUNDS {
        send(stream, &Event::start(key, format!("round_{round}")))?;
        send(stream, &Event::start(key, "parse"))?;
        thread::sleep(Duration::from_millis(2));
        send(stream, &Event::end(key))?;
        send(stream, &Event::start(key, "compute"))?;
        thread::sleep(Duration::from_millis(5));
        send(stream, &Event::end(key))?;
        send(stream, &Event::end(key))?;
        if key.0 == 0 {
            send(stream, &Event::frame_mark(key))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:9001".to_string());
    let stream = TcpStream::connect(&addr).with_context(|| format!("Failed to connect to {addr}"))?;
    stream.set_nodelay(true)?;
    let stream = Arc::new(Mutex::new(stream));

    println!("Emitting {ROUNDS} rounds on {WORKERS} threads to {addr}");

    let workers: Vec<_> = (0..WORKERS)
        .map(|key| {
            let stream = Arc::clone(&stream);
            thread::spawn(move || worker(&stream, ThreadKey(key)))
        })
        .collect();

    for handle in workers {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => anyhow::bail!("worker thread panicked"),
        }
    }

    println!("Done");
    Ok(())
}
