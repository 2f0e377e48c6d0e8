//! Codec error types.

use thiserror::Error;

/// Why an address could not be turned into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A character outside the base-58 alphabet.
    #[error("invalid base58 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    /// Fewer bytes than a version byte plus checksum.
    #[error("decoded data too short: {0} bytes")]
    TooShort(usize),

    /// The trailing four bytes do not match the double-SHA-256 of the body.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Version byte present but no payload bytes after it.
    #[error("payload too short: {0} bytes including version")]
    PayloadTooShort(usize),
}

/// Errors raised while building carrier outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The requested amount is not a carrier denomination.
    #[error("amount {0} is not a carrier denomination")]
    NotCarrierAmount(String),

    /// A file stub name would not be recognised as a filename by the decoder.
    #[error("invalid file name {0:?}: must be longer than 2 chars and contain '.'")]
    InvalidFileName(String),

    /// A header or body contains a reserved framing character that would
    /// terminate decoding early.
    #[error("header {0:?} contains a reserved framing character")]
    ReservedCharacter(String),

    /// Messages shorter than two bytes are not recognised by the decoder.
    #[error("message must be at least 2 bytes, got {0}")]
    MessageTooShort(usize),

    /// Nothing was queued for encoding.
    #[error("nothing to encode")]
    Empty,
}
