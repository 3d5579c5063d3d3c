//! CLI argument definitions

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use zonebridge_common::DEFAULT_MAX_FRAME_BYTES;

use crate::server::ServerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "zonebridge",
    about = "Replay remote zone events into a local trace, one timeline per remote thread",
    after_help = "\
EXAMPLES:
    zonebridge                                   Listen on 0.0.0.0:9001, log zones (RUST_LOG=debug)
    zonebridge --export trace.json               Write a Chrome trace on exit
    zonebridge --listen 127.0.0.1:7000 --duration 60 --export trace.json"
)]
pub struct Args {
    /// Address to accept emitter connections on
    #[arg(short, long, default_value = "0.0.0.0:9001")]
    pub listen: SocketAddr,

    /// Export trace to file on exit (Chrome Trace Event Format)
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Stop after N seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Maximum concurrent emitter connections (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_connections: usize,

    /// Largest accepted frame payload in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: usize,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen: self.listen,
            max_frame_bytes: self.max_frame_bytes,
            max_connections: self.max_connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_emitter_port() {
        let args = Args::parse_from(["zonebridge"]);
        assert_eq!(args.listen.port(), 9001);
        assert_eq!(args.duration, 0);
        assert_eq!(args.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);
        assert!(args.export.is_none());
    }

    #[test]
    fn test_server_config_from_flags() {
        let args = Args::parse_from([
            "zonebridge",
            "--listen",
            "127.0.0.1:7000",
            "--max-connections",
            "4",
            "--max-frame-bytes",
            "512",
        ]);
        let config = args.server_config();
        assert_eq!(config.listen, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.max_frame_bytes, 512);
    }

    #[test]
    fn test_rejects_bad_address() {
        assert!(Args::try_parse_from(["zonebridge", "--listen", "not-an-addr"]).is_err());
    }
}
