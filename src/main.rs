//! `live-counter` server binary.
//!
//! Usage:
//!   live-counter
//!   live-counter --bind 127.0.0.1:8080 --static-dir ./static
//!   live-counter --queue-capacity 64 --initial-count 100 --debug
//!
//! Every flag can also be set through a `LIVE_COUNTER_*` environment
//! variable. `RUST_LOG` overrides the log filter.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use live_counter::hub::DEFAULT_QUEUE_CAPACITY;
use live_counter::server::{DEFAULT_BIND_ADDR, DEFAULT_STATIC_DIR};
use live_counter::{Result, Server, ServerConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "live-counter", version, about = "Real-time shared counter server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "LIVE_COUNTER_BIND", default_value_t = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Directory served for every path other than /ws and /changenumber.
    #[arg(long, env = "LIVE_COUNTER_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    /// Messages a WebSocket client may fall behind before it is dropped.
    #[arg(long, env = "LIVE_COUNTER_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Starting value of the shared counter.
    #[arg(
        long,
        env = "LIVE_COUNTER_INITIAL_COUNT",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    initial_count: i64,

    /// Enable debug logging.
    #[arg(long, env = "LIVE_COUNTER_DEBUG")]
    debug: bool,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        error!(error = %e, "Server failed");
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = ServerConfig::builder()
        .bind_addr(args.bind)
        .static_dir(args.static_dir)
        .queue_capacity(args.queue_capacity)
        .initial_count(args.initial_count)
        .build()?;

    Server::bind(config).await?.run().await
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "live_counter=debug,tower_http=debug"
    } else {
        "live_counter=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
