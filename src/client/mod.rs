//! Client Module
//!
//! Typed, operation-specific facade over the generic transport call
//! primitive. Each exposed method packages its parameters, selects the
//! operation code, and delegates dispatch; no decision-making lives here.

mod kv;

pub use kv::{KvClient, KvPair, OP_KV_APPEND, OP_KV_READ, OP_KV_WRITE, OP_PING};
