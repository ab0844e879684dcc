//! Per-call options
//!
//! Named fields with documented defaults instead of positional parameters;
//! every field passes through the client layer to the transport untouched.

use std::time::Duration;

use super::Endpoint;

/// Options applied to a single call
///
/// The default (`CallOptions::default()`) means: transport-default timeout,
/// no thread-affinity preference for issuance or reply delivery, no
/// partition awareness, and the client's bound endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// End-to-end deadline for the call; `None` uses the transport's
    /// configured default (which may itself be "no deadline")
    pub timeout: Option<Duration>,

    /// Pins request issuance (encode + socket write) to a single worker
    /// thread, serializing sends that share the hint
    pub thread_hash: Option<u64>,

    /// Pins outcome delivery (the callback, or the sync wakeup) to a single
    /// worker thread
    pub reply_thread_hash: Option<u64>,

    /// Routes the request within a sharded/replicated backend; zero means
    /// "no partition awareness"
    pub partition_hash: u64,

    /// Overrides the client's bound endpoint for this call only
    pub server: Option<Endpoint>,
}

impl CallOptions {
    /// Set the call deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the issuance thread-affinity hint
    pub fn thread_hash(mut self, hash: u64) -> Self {
        self.thread_hash = Some(hash);
        self
    }

    /// Set the reply-delivery thread-affinity hint
    pub fn reply_thread_hash(mut self, hash: u64) -> Self {
        self.reply_thread_hash = Some(hash);
        self
    }

    /// Set the partition hash
    pub fn partition_hash(mut self, hash: u64) -> Self {
        self.partition_hash = hash;
        self
    }

    /// Target a different endpoint for this call only
    pub fn server(mut self, endpoint: Endpoint) -> Self {
        self.server = Some(endpoint);
        self
    }
}
