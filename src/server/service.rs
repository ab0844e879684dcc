//! In-memory key-value service
//!
//! The service half of the test pair: a plain map behind a RwLock. This is
//! deliberately not a storage engine — no durability, no replication — just
//! enough semantics for the client's operations to be exercised end to end.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::client::{KvPair, OP_KV_APPEND, OP_KV_READ, OP_KV_WRITE, OP_PING};
use crate::wire::{ReplyEnvelope, RequestEnvelope};

/// In-memory key-value store with read, write and append
#[derive(Default)]
pub struct SimpleKv {
    store: RwLock<HashMap<String, String>>,
}

impl SimpleKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Apply one request and produce its reply
    ///
    /// Malformed payloads and unknown operation codes become remote-error
    /// replies; this function never fails the connection.
    pub fn apply(&self, request: &RequestEnvelope) -> ReplyEnvelope {
        match request.op {
            OP_PING => ReplyEnvelope::ok(request.seq, Bytes::new()),

            OP_KV_READ => match bincode::deserialize::<String>(&request.payload) {
                Ok(key) => match self.store.read().get(&key) {
                    Some(value) => ok_reply(request.seq, value),
                    None => ReplyEnvelope::remote_error(request.seq, "key not found"),
                },
                Err(e) => bad_request(request.seq, &e.to_string()),
            },

            OP_KV_WRITE => match bincode::deserialize::<KvPair>(&request.payload) {
                Ok(pair) => {
                    let len = pair.value.len() as u32;
                    self.store.write().insert(pair.key, pair.value);
                    ok_reply(request.seq, &len)
                }
                Err(e) => bad_request(request.seq, &e.to_string()),
            },

            OP_KV_APPEND => match bincode::deserialize::<KvPair>(&request.payload) {
                Ok(pair) => {
                    let mut store = self.store.write();
                    let entry = store.entry(pair.key).or_default();
                    entry.push_str(&pair.value);
                    let len = entry.len() as u32;
                    drop(store);
                    ok_reply(request.seq, &len)
                }
                Err(e) => bad_request(request.seq, &e.to_string()),
            },

            other => {
                ReplyEnvelope::remote_error(request.seq, &format!("unknown operation {}", other))
            }
        }
    }
}

fn ok_reply<T: serde::Serialize>(seq: u64, value: &T) -> ReplyEnvelope {
    match bincode::serialize(value) {
        Ok(bytes) => ReplyEnvelope::ok(seq, Bytes::from(bytes)),
        Err(e) => ReplyEnvelope::remote_error(seq, &format!("reply encoding failed: {}", e)),
    }
}

fn bad_request(seq: u64, detail: &str) -> ReplyEnvelope {
    ReplyEnvelope::remote_error(seq, &format!("bad request: {}", detail))
}
