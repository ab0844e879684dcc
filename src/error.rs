//! Error types for CourierKV
//!
//! Provides a unified error type for all call outcomes.
//!
//! Every remote call resolves to exactly one `Result`: `Ok` carries the typed
//! reply, `Err` carries one of the failure kinds below. The same set of kinds
//! is possible on the synchronous and asynchronous paths; the only difference
//! is the delivery channel (return value vs. callback argument).

use thiserror::Error;

/// Result type alias using RpcError
pub type Result<T> = std::result::Result<T, RpcError>;

/// Unified error type for CourierKV call outcomes
#[derive(Debug, Error)]
pub enum RpcError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Call Outcomes
    // -------------------------------------------------------------------------
    /// No reply arrived within the call's deadline
    #[error("Call timed out")]
    Timeout,

    /// The caller cancelled the in-flight call through its handle
    #[error("Call cancelled")]
    Cancelled,

    /// Connection, resolution, or delivery failure below the call layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server explicitly reported an application-level error
    #[error("Remote error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration / Usage Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client is unbound and the call supplied no endpoint override
    #[error("No endpoint: client is unbound and the call supplied no override")]
    NoEndpoint,
}
