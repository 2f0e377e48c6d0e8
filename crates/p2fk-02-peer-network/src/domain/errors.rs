//! Peer network error types.

use shared_types::TxId;
use thiserror::Error;

/// Errors from decoding or encoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Ran out of bytes while reading a field.
    #[error("unexpected end of data reading {field}")]
    UnexpectedEof { field: &'static str },

    /// Message header carried another network's magic.
    #[error("invalid network magic {0:02x?}")]
    BadMagic([u8; 4]),

    /// Declared payload larger than the protocol cap.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Payload checksum did not match the header.
    #[error("payload checksum mismatch for {command}")]
    BadChecksum { command: String },

    /// A count or length field is not plausible for the remaining data.
    #[error("implausible {field}: {value}")]
    Implausible { field: &'static str, value: u64 },

    /// Command longer than 12 bytes.
    #[error("command too long: {0}")]
    CommandTooLong(String),

    /// Bytes left over after a complete structure.
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),

    /// Underlying stream failure.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Errors surfaced by a peer network client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerNetworkError {
    /// No connected peer to ask.
    #[error("no connected peers")]
    NoPeers,

    /// The transaction is neither cached nor delivered within the timeout.
    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    /// Dialing a peer failed.
    #[error("connection to {addr} failed: {reason}")]
    ConnectFailed { addr: String, reason: String },

    /// The operation exceeded its time budget.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// The peer spoke malformed protocol.
    #[error("protocol error: {0}")]
    Wire(#[from] WireError),

    /// JSON-RPC backend failure.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The client was disposed.
    #[error("client disposed")]
    Disposed,
}
