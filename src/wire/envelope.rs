//! Envelope definitions
//!
//! Represents requests and replies on the wire.

use bytes::Bytes;

/// Stable identifier selecting which remote procedure a request invokes.
///
/// Codes are a compatibility contract between client and server; they are
/// fixed at build time and never computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpCode(pub u16);

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// A request envelope: operation code plus routing metadata and payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    /// Per-connection sequence number; the matching reply echoes it back
    pub seq: u64,

    /// Operation code
    pub op: OpCode,

    /// Partition hash for routing within a sharded/replicated backend;
    /// zero means "no partition awareness"
    pub partition_hash: u64,

    /// Operation-specific payload, opaque to the envelope
    pub payload: Bytes,
}

/// Reply status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyStatus {
    Ok = 0x00,
    Remote = 0x01,
}

/// A reply envelope matched to a request by sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEnvelope {
    /// Sequence number of the request this reply answers
    pub seq: u64,

    /// Status code
    pub status: ReplyStatus,

    /// Reply value (OK) or UTF-8 error message (REMOTE)
    pub payload: Bytes,
}

impl ReplyEnvelope {
    /// Create an OK reply carrying a value
    pub fn ok(seq: u64, payload: Bytes) -> Self {
        Self {
            seq,
            status: ReplyStatus::Ok,
            payload,
        }
    }

    /// Create a REMOTE error reply carrying a message
    pub fn remote_error(seq: u64, message: &str) -> Self {
        Self {
            seq,
            status: ReplyStatus::Remote,
            payload: Bytes::copy_from_slice(message.as_bytes()),
        }
    }
}
