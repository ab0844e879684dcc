//! Per-endpoint connection
//!
//! One TCP connection per endpoint, shared by every call targeting it.
//! A dedicated reader thread decodes replies and completes the matching
//! pending call; writes go through a buffered writer behind a mutex.
//!
//! ## Exactly-once delivery
//!
//! Every in-flight call has exactly one entry in the pending map. Three
//! completers race for it: the reply reader, the timeout sweeper, and
//! connection teardown (or an explicit cancel through the call handle).
//! Whoever removes the entry delivers the outcome; the others find the map
//! empty and do nothing. The completion closure is `FnOnce`, consumed on
//! delivery, so no call can observe zero or multiple outcomes.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;

use super::workers::ReplyPool;
use super::Endpoint;
use crate::config::TransportConfig;
use crate::error::{Result, RpcError};
use crate::wire::{read_reply, write_request, ReplyStatus, RequestEnvelope};

/// Completion closure invoked with the call's single outcome
pub(crate) type Completion = Box<dyn FnOnce(Result<Bytes>) + Send + 'static>;

/// Book-keeping for one in-flight call
pub(crate) struct PendingCall {
    /// Wall-clock deadline; `None` means no deadline
    pub deadline: Option<Instant>,

    /// Thread-affinity hint for outcome delivery
    pub reply_hint: Option<u64>,

    /// Consumed exactly once when the outcome is delivered
    pub on_complete: Completion,
}

/// A live connection to one endpoint
pub(crate) struct Conn {
    endpoint: Endpoint,

    /// Buffered write half; the mutex serializes concurrent senders
    writer: Mutex<BufWriter<TcpStream>>,

    /// Socket clone used to unblock the reader on teardown
    shutdown_handle: TcpStream,

    /// In-flight calls keyed by sequence number
    pending: Mutex<HashMap<u64, PendingCall>>,

    /// Per-connection sequence counter
    seq: AtomicU64,

    /// Set when the socket is known dead; the transport replaces the
    /// connection on the next call
    broken: AtomicBool,

    pool: ReplyPool,
}

impl Conn {
    /// Connect to an endpoint and spawn its reader thread
    pub fn connect(
        endpoint: Endpoint,
        config: &TransportConfig,
        pool: ReplyPool,
    ) -> Result<Arc<Self>> {
        let stream = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&endpoint.addr(), timeout)?,
            None => TcpStream::connect(endpoint.addr())?,
        };

        if config.nodelay {
            stream.set_nodelay(true)?;
        }

        let read_stream = stream.try_clone()?;
        let shutdown_handle = stream.try_clone()?;

        let conn = Arc::new(Self {
            endpoint,
            writer: Mutex::new(BufWriter::new(stream)),
            shutdown_handle,
            pending: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
            broken: AtomicBool::new(false),
            pool,
        });

        let reader_conn = Arc::clone(&conn);
        thread::Builder::new()
            .name(format!("courier-reader-{}", endpoint))
            .spawn(move || reader_conn.read_loop(read_stream))?;

        tracing::debug!("Connected to {}", endpoint);
        Ok(conn)
    }

    /// The endpoint this connection targets
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Allocate the next sequence number
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// True once the socket is known dead
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    /// True while the call is still awaiting its outcome
    pub fn has_pending(&self, seq: u64) -> bool {
        self.pending.lock().contains_key(&seq)
    }

    /// Register an in-flight call before its request is written
    pub fn register(&self, seq: u64, call: PendingCall) {
        self.pending.lock().insert(seq, call);
    }

    /// Encode and write a request on the shared socket
    pub fn send(&self, request: &RequestEnvelope) -> Result<()> {
        let mut writer = self.writer.lock();
        write_request(&mut *writer, request).map_err(|e| {
            self.broken.store(true, Ordering::Release);
            e
        })
    }

    /// Deliver the outcome for `seq`, if it is still in flight
    ///
    /// Removal from the pending map is the linearization point for
    /// exactly-once delivery. Returns false if the call already completed.
    pub fn complete(&self, seq: u64, outcome: Result<Bytes>) -> bool {
        let call = self.pending.lock().remove(&seq);
        match call {
            Some(call) => {
                let on_complete = call.on_complete;
                self.pool
                    .dispatch(call.reply_hint, Box::new(move || on_complete(outcome)));
                true
            }
            None => false,
        }
    }

    /// Fail every in-flight call with a transport error
    pub fn drain(&self, reason: &str) {
        let drained: Vec<PendingCall> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, call)| call).collect()
        };

        if !drained.is_empty() {
            tracing::warn!(
                "Failing {} in-flight calls to {}: {}",
                drained.len(),
                self.endpoint,
                reason
            );
        }

        for call in drained {
            let on_complete = call.on_complete;
            let error = RpcError::Transport(reason.to_string());
            self.pool
                .dispatch(call.reply_hint, Box::new(move || on_complete(Err(error))));
        }
    }

    /// Time out every in-flight call whose deadline has passed
    pub fn sweep_expired(&self, now: Instant) {
        let expired: Vec<u64> = self
            .pending
            .lock()
            .iter()
            .filter(|(_, call)| call.deadline.map_or(false, |d| d <= now))
            .map(|(seq, _)| *seq)
            .collect();

        for seq in expired {
            tracing::debug!("Call seq={} to {} timed out", seq, self.endpoint);
            self.complete(seq, Err(RpcError::Timeout));
        }
    }

    /// Tear the connection down, failing anything still in flight
    pub fn close(&self, reason: &str) {
        self.broken.store(true, Ordering::Release);
        self.drain(reason);
        let _ = self.shutdown_handle.shutdown(Shutdown::Both);
    }

    /// Reader thread body: decode replies until the socket dies
    fn read_loop(self: Arc<Self>, stream: TcpStream) {
        let mut reader = BufReader::new(stream);

        loop {
            match read_reply(&mut reader) {
                Ok(reply) => {
                    let outcome = match reply.status {
                        ReplyStatus::Ok => Ok(reply.payload),
                        ReplyStatus::Remote => Err(RpcError::Remote(
                            String::from_utf8_lossy(&reply.payload).into_owned(),
                        )),
                    };
                    if !self.complete(reply.seq, outcome) {
                        tracing::trace!(
                            "Reply for finished or unknown call seq={} from {}",
                            reply.seq,
                            self.endpoint
                        );
                    }
                }
                Err(RpcError::Io(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    tracing::debug!("Connection to {} closed by peer", self.endpoint);
                    self.close("connection closed by peer");
                    return;
                }
                Err(e) => {
                    tracing::warn!("Read error on connection to {}: {}", self.endpoint, e);
                    self.close(&format!("connection lost: {}", e));
                    return;
                }
            }
        }
    }
}
