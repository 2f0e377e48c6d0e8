//! # Error Types
//!
//! Errors raised while parsing shared identifiers.

use thiserror::Error;

/// Errors from parsing a textual transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxIdParseError {
    /// The text was not 64 hexadecimal characters.
    #[error("Invalid transaction id length: expected 64 hex chars, got {0}")]
    InvalidLength(usize),

    /// The text contained a non-hexadecimal character.
    #[error("Invalid transaction id hex: {0}")]
    InvalidHex(String),
}
