//! # zonebridge - Main Entry Point
//!
//! Listens for emitter connections, replays their zones, and on Ctrl+C (or
//! `--duration`) drains every actor before exiting.
//!
//! - **Export** (`--export trace.json`): Chrome trace written at shutdown
//! - **Headless** (default): zones reported through `log`

// Time conversions lose precision for display
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use zonebridge::cli::Args;
use zonebridge::dispatch::{Dispatcher, ShutdownReport, StatsSnapshot};
use zonebridge::server::{IngestSnapshot, Server};
use zonebridge::sink::{ChromeTraceSink, InstrumentationSink, LogSink};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

/// Resolves when the bridge should stop accepting events
async fn stop_signal(duration_secs: u64) {
    let limit = async {
        if duration_secs > 0 {
            tokio::time::sleep(Duration::from_secs(duration_secs)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        () = limit => info!("Duration limit reached"),
    }
}

/// Serve until stopped, then drain every actor
async fn bridge<S: InstrumentationSink>(
    args: &Args,
    sink: Arc<S>,
) -> Result<(IngestSnapshot, ShutdownReport, StatsSnapshot)> {
    let dispatcher = Arc::new(Dispatcher::new(sink));
    let server = Server::bind(args.server_config(), Arc::clone(&dispatcher)).await?;

    if !args.quiet {
        println!("zonebridge v{}", env!("CARGO_PKG_VERSION"));
        println!("listen: {}", server.local_addr()?);
        if let Some(ref export_path) = args.export {
            println!("export: {}", export_path.display());
        }
    }

    let ingest = server.run_until(stop_signal(args.duration)).await?;

    // Connections are closed; nothing can submit any more
    let report = Arc::clone(&dispatcher)
        .shutdown_async()
        .await
        .context("Dispatcher shutdown task failed")?;
    for key in &report.panicked {
        eprintln!("warning: actor for {key} panicked, its trailing events were lost");
    }

    Ok((ingest, report, dispatcher.stats()))
}

fn print_summary(elapsed: Duration, ingest: &IngestSnapshot, report: &ShutdownReport, stats: &StatsSnapshot) {
    eprintln!(
        "\n{:.1}s, {} connections, {} frames ({} malformed, {} dropped), {} events, {} threads, {} zones ({} unmatched ends, {} unwound), {} frame marks",
        elapsed.as_secs_f64(),
        ingest.connections_accepted,
        ingest.frames_received,
        ingest.malformed_messages,
        ingest.dropped_events,
        stats.events_applied,
        report.actors_joined(),
        stats.zones_begun,
        stats.unmatched_ends,
        report.zones_unwound(),
        stats.frame_marks,
    );
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let started = Instant::now();

    if let Some(ref export_path) = args.export {
        let sink = Arc::new(ChromeTraceSink::new());
        let (ingest, report, stats) = bridge(&args, Arc::clone(&sink)).await?;

        if !args.quiet {
            print_summary(started.elapsed(), &ingest, &report, &stats);
        }

        let file = File::create(export_path).context("Failed to create trace output file")?;
        sink.export(BufWriter::new(file)).context("Failed to export trace")?;

        if !args.quiet {
            println!("saved: {} ({} events)", export_path.display(), sink.event_count());
        }
    } else {
        let sink = Arc::new(LogSink::new());
        let (ingest, report, stats) = bridge(&args, Arc::clone(&sink)).await?;
        info!("Log sink saw {} completed zones", sink.zones_completed());

        if !args.quiet {
            print_summary(started.elapsed(), &ingest, &report, &stats);
        }
    }

    Ok(())
}
