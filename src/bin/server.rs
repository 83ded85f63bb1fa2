//! DuraKV Server Binary
//!
//! Recovers the log and starts the TCP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use durakv::network::Server;
use durakv::{Config, Engine, FlushStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// DuraKV Server
#[derive(Parser, Debug)]
#[command(name = "durakv-server")]
#[command(about = "Durable single-node key-value store")]
#[command(version)]
struct Args {
    /// Path to the log file
    log_path: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:50051")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Number of index shards
    #[arg(long, default_value = "64")]
    shards: usize,

    /// Hand writes to the OS without fsync (faster, not power-loss safe)
    #[arg(long)]
    no_fsync: bool,
}

fn main() {
    let start = Instant::now();

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,durakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("DuraKV Server v{}", durakv::VERSION);
    tracing::info!("Log file: {}", args.log_path.display());

    let flush_strategy = if args.no_fsync {
        FlushStrategy::OsBuffer
    } else {
        FlushStrategy::SyncData
    };

    let config = match Config::builder()
        .log_path(&args.log_path)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .index_shards(args.shards)
        .flush_strategy(flush_strategy)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Recovery runs inside open, before any connection is accepted.
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let report = engine.recovery_report();
    tracing::info!(
        "Recovery: {} entries, {} keys, {} bytes discarded",
        report.entries_replayed,
        report.distinct_keys,
        report.bytes_discarded
    );

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Startup time: {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
