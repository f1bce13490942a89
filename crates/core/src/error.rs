//! Library-level error types for the netcode core. Application binaries
//! (`server`, `client`) wrap these in `anyhow::Result` at their boundary;
//! within the core, callers match on these variants to decide policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    ProtocolMismatch { expected: u8, got: u8 },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("join timed out waiting for game-config")]
    ConnectTimeout,

    #[error("pending snapshot list overflowed capacity")]
    SnapshotOverflow,
}

pub use crate::protocol::PacketError;
