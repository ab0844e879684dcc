//! Key-value client
//!
//! Client stub for the replicated key-value test service: read, write and
//! append, each in a synchronous and an asynchronous variant.
//!
//! The client holds no mutable state beyond its bound endpoint; it is safe
//! to share across threads issuing independent calls. No ordering between
//! distinct calls is guaranteed — callers needing read-after-write on one
//! key must wait for the first outcome before issuing the second, or pin
//! both calls to one worker via the thread-affinity hints.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcError};
use crate::transport::{CallHandle, CallOptions, Endpoint, Transport};
use crate::wire::OpCode;

// =============================================================================
// Operation Codes
// =============================================================================
// Fixed identifiers shared with the server-side service; a compatibility
// contract, never computed.

/// Health check; empty request and reply
pub const OP_PING: OpCode = OpCode(0x0001);

/// Read a value by key; request: key, reply: value
pub const OP_KV_READ: OpCode = OpCode(0x0101);

/// Overwrite a key; request: key-value pair, reply: new value length
pub const OP_KV_WRITE: OpCode = OpCode(0x0102);

/// Concatenate to a key's value; request: key-value pair, reply: new length
pub const OP_KV_APPEND: OpCode = OpCode(0x0103);

/// Request payload for write and append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    pub key: String,
    pub value: String,
}

impl KvPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client stub for the key-value service
///
/// Bound to a default endpoint at construction (or left unbound); the
/// default is fixed for the client's lifetime, but any call may target a
/// different endpoint through [`CallOptions::server`].
#[derive(Clone)]
pub struct KvClient {
    transport: Transport,
    server: Option<Endpoint>,
}

impl KvClient {
    /// Create a client bound to a default endpoint
    pub fn bound(transport: Transport, server: Endpoint) -> Self {
        Self {
            transport,
            server: Some(server),
        }
    }

    /// Create an unbound client; every call must supply an endpoint override
    pub fn unbound(transport: Transport) -> Self {
        Self {
            transport,
            server: None,
        }
    }

    /// The bound default endpoint, if any
    pub fn server(&self) -> Option<Endpoint> {
        self.server
    }

    // -------------------------------------------------------------------------
    // read
    // -------------------------------------------------------------------------

    /// Read the value stored under `key`, blocking until the outcome
    pub fn read_sync(&self, key: &str, opts: &CallOptions) -> Result<String> {
        self.call_sync_typed(OP_KV_READ, &key, opts)
    }

    /// Read asynchronously; `callback` fires exactly once with the outcome
    pub fn read<F>(&self, key: &str, callback: F, opts: &CallOptions) -> Result<CallHandle>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        self.call_typed(OP_KV_READ, &key, callback, opts)
    }

    // -------------------------------------------------------------------------
    // write
    // -------------------------------------------------------------------------

    /// Overwrite `pair.key` with `pair.value`; returns the new value length
    pub fn write_sync(&self, pair: &KvPair, opts: &CallOptions) -> Result<u32> {
        self.call_sync_typed(OP_KV_WRITE, pair, opts)
    }

    /// Overwrite asynchronously; `callback` fires exactly once
    pub fn write<F>(&self, pair: &KvPair, callback: F, opts: &CallOptions) -> Result<CallHandle>
    where
        F: FnOnce(Result<u32>) + Send + 'static,
    {
        self.call_typed(OP_KV_WRITE, pair, callback, opts)
    }

    // -------------------------------------------------------------------------
    // append
    // -------------------------------------------------------------------------

    /// Concatenate `pair.value` onto the stored value; returns the new length
    pub fn append_sync(&self, pair: &KvPair, opts: &CallOptions) -> Result<u32> {
        self.call_sync_typed(OP_KV_APPEND, pair, opts)
    }

    /// Append asynchronously; `callback` fires exactly once
    pub fn append<F>(&self, pair: &KvPair, callback: F, opts: &CallOptions) -> Result<CallHandle>
    where
        F: FnOnce(Result<u32>) + Send + 'static,
    {
        self.call_typed(OP_KV_APPEND, pair, callback, opts)
    }

    // -------------------------------------------------------------------------
    // ping
    // -------------------------------------------------------------------------

    /// Health check against the target endpoint
    pub fn ping(&self, opts: &CallOptions) -> Result<()> {
        self.call_sync_typed(OP_PING, &(), opts)
    }

    // -------------------------------------------------------------------------
    // Generic call wrappers
    // -------------------------------------------------------------------------
    // Single dispatch path for both call styles: the sync form is the async
    // form plus the transport's blocking rendezvous.

    /// Resolve the target endpoint: per-call override, else the bound default
    fn target(&self, opts: &CallOptions) -> Result<Endpoint> {
        opts.server.or(self.server).ok_or(RpcError::NoEndpoint)
    }

    fn call_sync_typed<Req, Rep>(&self, op: OpCode, request: &Req, opts: &CallOptions) -> Result<Rep>
    where
        Req: Serialize + ?Sized,
        Rep: DeserializeOwned,
    {
        let target = self.target(opts)?;
        let payload = encode(request)?;
        let reply = self.transport.call_sync(target, op, payload, opts)?;
        decode(&reply)
    }

    fn call_typed<Req, Rep, F>(
        &self,
        op: OpCode,
        request: &Req,
        callback: F,
        opts: &CallOptions,
    ) -> Result<CallHandle>
    where
        Req: Serialize + ?Sized,
        Rep: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<Rep>) + Send + 'static,
    {
        let target = self.target(opts)?;
        let payload = encode(request)?;
        self.transport.call(target, op, payload, opts, move |outcome| {
            callback(outcome.and_then(|bytes| decode(&bytes)))
        })
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    bincode::serialize(value)
        .map(Bytes::from)
        .map_err(|e| RpcError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &Bytes) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| RpcError::Serialization(e.to_string()))
}
