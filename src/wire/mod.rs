//! Wire Module
//!
//! Defines the request/reply envelope exchanged between the call layer and a
//! service endpoint.
//!
//! ## Wire Format (V1 - Simple Binary)
//!
//! ### Request Envelope
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬───────────────────┐
//! │ Op (2)   │ Seq (8)  │ Part (8) │ Len (4)  │      Payload      │
//! └──────────┴──────────┴──────────┴──────────┴───────────────────┘
//! ```
//! - Op: operation code selecting the remote procedure
//! - Seq: per-connection sequence number matching replies to requests
//! - Part: partition hash routing the request within a sharded backend
//!
//! ### Reply Envelope
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┐
//! │Status(1) │ Seq (8)  │ Len (4)  │      Payload      │
//! └──────────┴──────────┴──────────┴───────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK      - payload is the operation's reply value
//! - 0x01: REMOTE  - payload is a UTF-8 error message from the service

mod codec;
mod envelope;

pub(crate) use codec::check_payload_len;
pub use codec::{
    decode_reply, decode_request, encode_reply, encode_request, read_reply, read_request,
    write_reply, write_request, MAX_PAYLOAD_SIZE, REPLY_HEADER_SIZE, REQUEST_HEADER_SIZE,
};
pub use envelope::{OpCode, ReplyEnvelope, ReplyStatus, RequestEnvelope};
