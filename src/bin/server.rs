//! CourierKV Server Binary
//!
//! Starts the TCP server hosting the in-memory key-value service.

use clap::Parser;
use courierkv::KvServer;
use tracing_subscriber::{fmt, EnvFilter};

/// CourierKV Server
#[derive(Parser, Debug)]
#[command(name = "courierkv-server")]
#[command(about = "In-memory key-value service for the CourierKV client layer")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7272")]
    listen: String,

    /// Delay every reply by this many milliseconds (for timeout testing)
    #[arg(long)]
    reply_delay_ms: Option<u64>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,courierkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("CourierKV Server v{}", courierkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let mut server = match KvServer::bind(&args.listen) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Some(ms) = args.reply_delay_ms {
        tracing::warn!("Artificially delaying every reply by {} ms", ms);
        server = server.reply_delay(std::time::Duration::from_millis(ms));
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
