//! CourierKV CLI Client
//!
//! Command-line interface for issuing calls against a CourierKV server.

use std::time::Duration;

use clap::{Parser, Subcommand};
use courierkv::{CallOptions, Endpoint, KvClient, KvPair, Transport, TransportConfig};

/// CourierKV CLI
#[derive(Parser, Debug)]
#[command(name = "courierkv-cli")]
#[command(about = "CLI for the CourierKV key-value service")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7272")]
    server: String,

    /// Call timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a value by key
    Read {
        /// The key to read
        key: String,
    },

    /// Write a key-value pair (overwrite)
    Write {
        /// The key to write
        key: String,

        /// The value to write
        value: String,
    },

    /// Append a value to a key
    Append {
        /// The key to append to
        key: String,

        /// The value to append
        value: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    let endpoint: Endpoint = match args.server.parse() {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let transport = match Transport::new(TransportConfig::default()) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Failed to start transport: {}", e);
            std::process::exit(2);
        }
    };
    let client = KvClient::bound(transport, endpoint);
    let opts = CallOptions::default().timeout(Duration::from_millis(args.timeout_ms));

    let outcome = match args.command {
        Commands::Read { key } => client.read_sync(&key, &opts),
        Commands::Write { key, value } => client
            .write_sync(&KvPair::new(key, value), &opts)
            .map(|len| format!("OK (length {})", len)),
        Commands::Append { key, value } => client
            .append_sync(&KvPair::new(key, value), &opts)
            .map(|len| format!("OK (length {})", len)),
        Commands::Ping => client.ping(&opts).map(|_| "PONG".to_string()),
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
