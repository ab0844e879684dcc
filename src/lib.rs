//! # CourierKV
//!
//! A typed RPC client call layer for a replicated key-value test service:
//! - Address-routed, timeout-bounded remote invocation
//! - Synchronous (blocking) and asynchronous (callback) call styles
//! - Thread-affinity hints for issuance and reply delivery
//! - Partition-hash routing metadata for sharded backends
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        KvClient                              │
//! │        read / write / append  ·  sync + async                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ op code + payload + CallOptions
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Transport                              │
//! │   per-endpoint connections · pending-call map · timeout      │
//! │   sweeper · reply-dispatch worker pool                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ request/reply envelopes (wire codec)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     KvServer (test)                          │
//! │              in-memory SimpleKv service                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call — either style — resolves to exactly one outcome: the typed
//! reply, a remote error, a timeout, or a transport failure.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod server;
pub mod transport;
pub mod wire;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::{KvClient, KvPair};
pub use config::TransportConfig;
pub use error::{Result, RpcError};
pub use server::{KvServer, SimpleKv};
pub use transport::{CallHandle, CallOptions, Endpoint, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CourierKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
