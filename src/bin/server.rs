//! signlog Server Binary
//!
//! Opens the store and serves sign-in commands over TCP.

use std::sync::Arc;

use clap::Parser;
use signlog::config::WalSyncStrategy;
use signlog::network::Server;
use signlog::signin::LocationRegistry;
use signlog::{Config, SigninService};
use tracing_subscriber::{fmt, EnvFilter};

/// signlog Server
#[derive(Parser, Debug)]
#[command(name = "signlog-server")]
#[command(about = "Daily sign-in log service")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./signlog_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8900")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "256")]
    max_connections: usize,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// MemTable size limit in MB before flush
    #[arg(short = 'M', long, default_value = "4")]
    memtable_mb: usize,

    /// fsync the WAL every N commits instead of every commit
    #[arg(long)]
    sync_every: Option<usize>,

    /// Location as CODE=BUCKET (repeatable; defaults to 0=test, 11=tianjin_nankai)
    #[arg(long = "location", value_name = "CODE=BUCKET")]
    locations: Vec<String>,

    /// Maximum entries returned by a key or prefix scan
    #[arg(long, default_value = "100000")]
    max_scan_entries: usize,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,signlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("signlog server v{}", signlog::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let locations = if args.locations.is_empty() {
        LocationRegistry::default()
    } else {
        match LocationRegistry::parse(&args.locations) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!("Bad --location: {}", e);
                std::process::exit(2);
            }
        }
    };
    for (code, bucket) in locations.iter() {
        tracing::info!("Location {} -> {}", code, bucket);
    }

    let sync = match args.sync_every {
        Some(count) if count > 1 => WalSyncStrategy::EveryNEntries { count },
        _ => WalSyncStrategy::EveryWrite,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .memtable_size_limit(args.memtable_mb * 1024 * 1024)
        .wal_sync_strategy(sync)
        .max_scan_entries(args.max_scan_entries)
        .locations(locations)
        .build();

    let service = match SigninService::open(config.clone()) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, Arc::clone(&service)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Runs until the process is killed; the WAL covers anything not yet
    // flushed
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
    drop(server);

    match Arc::try_unwrap(service) {
        Ok(service) => {
            if let Err(e) = service.close() {
                tracing::error!("Failed to close store: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Store still shared at exit, skipping close"),
    }
}
