//! Transport Module
//!
//! The generic call primitive beneath the typed client: address-routed,
//! timeout-bounded dispatch of request envelopes by operation code, with
//! callback-based completion delivery.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Transport                             │
//! │   connection cache (endpoint → Conn) · timeout sweeper       │
//! └───────────┬──────────────────────────────────┬──────────────┘
//!             │                                  │
//! ┌───────────▼──────────────┐      ┌────────────▼──────────────┐
//! │        Conn (per         │      │        ReplyPool          │
//! │  endpoint): writer +     │─────▶│  N dispatch threads;      │
//! │  reader thread + pending │      │  affinity hints pin jobs  │
//! │  call map                │      │  to a worker              │
//! └──────────────────────────┘      └───────────────────────────┘
//! ```
//!
//! Every call resolves to exactly one outcome, delivered on a pool thread:
//! the reply, a timeout, or a transport failure — never zero, never two.

mod conn;
mod endpoint;
mod options;
mod workers;

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::TransportConfig;
use crate::error::{Result, RpcError};
use crate::wire::{check_payload_len, OpCode, RequestEnvelope};
use conn::{Conn, PendingCall};
use workers::ReplyPool;

pub use endpoint::Endpoint;
pub use options::CallOptions;

/// The RPC transport: owns connections, reply workers, and the timeout
/// sweeper. Cheap to clone; all clones share one instance.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    config: TransportConfig,
    conns: Mutex<HashMap<Endpoint, Arc<Conn>>>,
    pool: ReplyPool,
}

impl Transport {
    /// Create a transport with the given configuration
    ///
    /// Fails only if the reply workers or the sweeper thread cannot be
    /// spawned.
    pub fn new(config: TransportConfig) -> Result<Self> {
        let pool = ReplyPool::new(config.reply_workers)?;
        let sweep_interval = config.timeout_sweep_interval;

        let inner = Arc::new(TransportInner {
            config,
            conns: Mutex::new(HashMap::new()),
            pool,
        });

        // Sweeper holds only a weak reference so the transport can shut
        // down while the ticker thread is parked.
        let weak: Weak<TransportInner> = Arc::downgrade(&inner);
        thread::Builder::new()
            .name("courier-sweeper".to_string())
            .spawn(move || {
                let ticker = crossbeam::channel::tick(sweep_interval);
                while ticker.recv().is_ok() {
                    let inner = match weak.upgrade() {
                        Some(inner) => inner,
                        None => return,
                    };
                    let conns: Vec<Arc<Conn>> = inner.conns.lock().values().cloned().collect();
                    let now = Instant::now();
                    for conn in conns {
                        conn.sweep_expired(now);
                    }
                }
            })?;

        Ok(Self { inner })
    }

    /// Number of reply-dispatch worker threads
    pub fn reply_workers(&self) -> usize {
        self.inner.pool.len()
    }

    /// Get or create the connection for an endpoint
    fn conn_to(&self, endpoint: Endpoint) -> Result<Arc<Conn>> {
        let mut conns = self.inner.conns.lock();

        if let Some(conn) = conns.get(&endpoint) {
            if !conn.is_broken() {
                return Ok(Arc::clone(conn));
            }
            // Stale entry from a dead socket; reconnect below
            conns.remove(&endpoint);
        }

        let conn = Conn::connect(endpoint, &self.inner.config, self.inner.pool.clone())?;
        conns.insert(endpoint, Arc::clone(&conn));
        Ok(conn)
    }

    /// Issue an asynchronous call; never blocks
    ///
    /// `on_complete` is invoked exactly once with the outcome, on a reply
    /// worker chosen by `opts.reply_thread_hash`. A non-empty
    /// `opts.thread_hash` additionally routes the socket write itself
    /// through the hinted worker, serializing issuance.
    ///
    /// An `Err` return means the call was never issued (connect failure or
    /// bad setup); the callback will not fire — the returned error is the
    /// call's single outcome.
    pub fn call<F>(
        &self,
        endpoint: Endpoint,
        op: OpCode,
        payload: Bytes,
        opts: &CallOptions,
        on_complete: F,
    ) -> Result<CallHandle>
    where
        F: FnOnce(Result<Bytes>) + Send + 'static,
    {
        // Reject oversized payloads here, before any connection is touched;
        // shipping the frame would only get it refused by the peer, tearing
        // down a connection other calls may be pending on.
        check_payload_len(payload.len())?;

        let conn = self.conn_to(endpoint)?;
        let seq = conn.next_seq();

        let deadline = opts
            .timeout
            .or(self.inner.config.default_call_timeout)
            .map(|timeout| Instant::now() + timeout);

        conn.register(
            seq,
            PendingCall {
                deadline,
                reply_hint: opts.reply_thread_hash,
                on_complete: Box::new(on_complete),
            },
        );

        let request = RequestEnvelope {
            seq,
            op,
            partition_hash: opts.partition_hash,
            payload,
        };

        tracing::trace!("Issuing call seq={} op={} to {}", seq, op, endpoint);

        match opts.thread_hash {
            None => {
                if let Err(e) = conn.send(&request) {
                    // The call was registered; fail it through the normal
                    // outcome channel to keep delivery exactly-once.
                    conn.complete(seq, Err(RpcError::Transport(format!("send failed: {}", e))));
                }
            }
            Some(hash) => {
                let write_conn = Arc::clone(&conn);
                self.inner.pool.dispatch(
                    Some(hash),
                    Box::new(move || {
                        if let Err(e) = write_conn.send(&request) {
                            write_conn.complete(
                                seq,
                                Err(RpcError::Transport(format!("send failed: {}", e))),
                            );
                        }
                    }),
                );
            }
        }

        Ok(CallHandle {
            seq,
            conn: Arc::downgrade(&conn),
        })
    }

    /// Issue a call and block until its outcome
    ///
    /// Composition of the asynchronous path and a one-shot rendezvous; the
    /// two call styles share all dispatch logic. Must not be invoked from a
    /// reply worker thread (the completion could never be delivered).
    pub fn call_sync(
        &self,
        endpoint: Endpoint,
        op: OpCode,
        payload: Bytes,
        opts: &CallOptions,
    ) -> Result<Bytes> {
        let (tx, rx) = crossbeam::channel::bounded(1);

        let _handle = self.call(endpoint, op, payload, opts, move |outcome| {
            let _ = tx.send(outcome);
        })?;

        rx.recv()
            .map_err(|_| RpcError::Transport("completion channel closed".to_string()))?
    }

    /// Drop the cached connection for an endpoint, failing its in-flight
    /// calls. Mainly useful in tests that force reconnects.
    pub fn disconnect(&self, endpoint: Endpoint) {
        if let Some(conn) = self.inner.conns.lock().remove(&endpoint) {
            conn.close("disconnected by caller");
        }
    }
}

impl Drop for TransportInner {
    fn drop(&mut self) {
        for (_, conn) in self.conns.lock().drain() {
            conn.close("transport shut down");
        }
    }
}

/// Caller-held token for an in-flight asynchronous call
///
/// Uniquely owned; holds only a weak back-reference to the connection, so a
/// forgotten handle never keeps a connection alive. Dropping the handle does
/// not cancel the call.
pub struct CallHandle {
    seq: u64,
    conn: Weak<Conn>,
}

impl CallHandle {
    /// Sequence number of the underlying request
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// True once the call's outcome has been delivered (or handed to a
    /// reply worker for delivery)
    pub fn is_finished(&self) -> bool {
        match self.conn.upgrade() {
            Some(conn) => !conn.has_pending(self.seq),
            None => true,
        }
    }

    /// Cancel the call if it is still in flight
    ///
    /// The callback receives [`RpcError::Cancelled`] as the call's single
    /// outcome. Returns false if the call had already completed, in which
    /// case nothing is delivered.
    pub fn cancel(self) -> bool {
        match self.conn.upgrade() {
            Some(conn) => conn.complete(self.seq, Err(RpcError::Cancelled)),
            None => false,
        }
    }
}

impl std::fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandle").field("seq", &self.seq).finish()
    }
}
