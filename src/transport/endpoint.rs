//! Endpoint definitions
//!
//! An endpoint is the opaque address of a target server instance. It is
//! immutable once bound into a client; individual calls may override it.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::RpcError;

/// Address identifying a target server instance for RPC dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    /// Create an endpoint from a socket address
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// The underlying socket address
    pub fn addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for Endpoint {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>()
            .map(Endpoint)
            .map_err(|e| RpcError::Config(format!("Invalid endpoint '{}': {}", s, e)))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
