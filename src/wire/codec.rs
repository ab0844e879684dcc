//! Wire codec
//!
//! Encoding and decoding functions for request/reply envelopes.
//!
//! All multi-byte fields are big-endian. Slice-based functions exist for
//! tests and in-memory use; stream-based helpers do framed I/O on sockets.

use std::io::{Read, Write};

use bytes::Bytes;

use super::{OpCode, ReplyEnvelope, ReplyStatus, RequestEnvelope};
use crate::error::{Result, RpcError};

/// Request header size: op (2) + seq (8) + partition hash (8) + length (4)
pub const REQUEST_HEADER_SIZE: usize = 22;

/// Reply header size: status (1) + seq (8) + length (4)
pub const REPLY_HEADER_SIZE: usize = 13;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Reject payloads above the cap; applied on both the encode and decode side
/// so an oversized payload fails its own call instead of poisoning the
/// connection when the peer rejects the frame
pub(crate) fn check_payload_len(payload_len: usize) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(RpcError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request envelope to bytes
///
/// Format: op (2) + seq (8) + partition_hash (8) + payload_len (4) + payload
pub fn encode_request(request: &RequestEnvelope) -> Vec<u8> {
    let mut message = Vec::with_capacity(REQUEST_HEADER_SIZE + request.payload.len());
    message.extend_from_slice(&request.op.0.to_be_bytes());
    message.extend_from_slice(&request.seq.to_be_bytes());
    message.extend_from_slice(&request.partition_hash.to_be_bytes());
    message.extend_from_slice(&(request.payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&request.payload);
    message
}

/// Decode a request envelope from bytes
pub fn decode_request(bytes: &[u8]) -> Result<RequestEnvelope> {
    if bytes.len() < REQUEST_HEADER_SIZE {
        return Err(RpcError::Protocol(format!(
            "Incomplete request header: expected {} bytes, got {}",
            REQUEST_HEADER_SIZE,
            bytes.len()
        )));
    }

    let op = u16::from_be_bytes([bytes[0], bytes[1]]);
    let seq = u64::from_be_bytes(bytes[2..10].try_into().unwrap());
    let partition_hash = u64::from_be_bytes(bytes[10..18].try_into().unwrap());
    let payload_len = u32::from_be_bytes(bytes[18..22].try_into().unwrap()) as usize;

    check_payload_len(payload_len)?;

    let total_len = REQUEST_HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(RpcError::Protocol(format!(
            "Incomplete request payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(RequestEnvelope {
        seq,
        op: OpCode(op),
        partition_hash,
        payload: Bytes::copy_from_slice(&bytes[REQUEST_HEADER_SIZE..total_len]),
    })
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply envelope to bytes
///
/// Format: status (1) + seq (8) + payload_len (4) + payload
pub fn encode_reply(reply: &ReplyEnvelope) -> Vec<u8> {
    let mut message = Vec::with_capacity(REPLY_HEADER_SIZE + reply.payload.len());
    message.push(reply.status as u8);
    message.extend_from_slice(&reply.seq.to_be_bytes());
    message.extend_from_slice(&(reply.payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&reply.payload);
    message
}

/// Decode a reply envelope from bytes
pub fn decode_reply(bytes: &[u8]) -> Result<ReplyEnvelope> {
    if bytes.len() < REPLY_HEADER_SIZE {
        return Err(RpcError::Protocol(format!(
            "Incomplete reply header: expected {} bytes, got {}",
            REPLY_HEADER_SIZE,
            bytes.len()
        )));
    }

    let status = match bytes[0] {
        0x00 => ReplyStatus::Ok,
        0x01 => ReplyStatus::Remote,
        other => {
            return Err(RpcError::Protocol(format!(
                "Unknown reply status: 0x{:02x}",
                other
            )))
        }
    };
    let seq = u64::from_be_bytes(bytes[1..9].try_into().unwrap());
    let payload_len = u32::from_be_bytes(bytes[9..13].try_into().unwrap()) as usize;

    check_payload_len(payload_len)?;

    let total_len = REPLY_HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(RpcError::Protocol(format!(
            "Incomplete reply payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok(ReplyEnvelope {
        seq,
        status,
        payload: Bytes::copy_from_slice(&bytes[REPLY_HEADER_SIZE..total_len]),
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request envelope from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<RequestEnvelope> {
    let mut header = [0u8; REQUEST_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes(header[18..22].try_into().unwrap()) as usize;
    check_payload_len(payload_len)?;

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    let mut full_message = Vec::with_capacity(REQUEST_HEADER_SIZE + payload_len);
    full_message.extend_from_slice(&header);
    full_message.extend_from_slice(&payload);

    decode_request(&full_message)
}

/// Write a request envelope to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &RequestEnvelope) -> Result<()> {
    check_payload_len(request.payload.len())?;
    let bytes = encode_request(request);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete reply envelope from a stream
pub fn read_reply<R: Read>(reader: &mut R) -> Result<ReplyEnvelope> {
    let mut header = [0u8; REPLY_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes(header[9..13].try_into().unwrap()) as usize;
    check_payload_len(payload_len)?;

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    let mut full_message = Vec::with_capacity(REPLY_HEADER_SIZE + payload_len);
    full_message.extend_from_slice(&header);
    full_message.extend_from_slice(&payload);

    decode_reply(&full_message)
}

/// Write a reply envelope to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &ReplyEnvelope) -> Result<()> {
    check_payload_len(reply.payload.len())?;
    let bytes = encode_reply(reply);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
