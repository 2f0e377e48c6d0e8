//! Decoded record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{BlockMetadata, TxId};

/// One transaction output as seen by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierOutput {
    /// Rendered address.
    pub address: String,
    /// Amount, 8-decimal fixed point.
    pub amount: String,
}

impl CarrierOutput {
    /// Build an output.
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            amount: amount.into(),
        }
    }
}

/// A file announced by name and size only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStub {
    /// File name from the frame header.
    pub name: String,
    /// Length declared in the frame.
    pub declared_len: u64,
    /// Bytes actually present after the header; short when truncated.
    pub available_len: u64,
}

/// Frames recovered from one payload buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrames {
    /// Messages in frame order.
    pub messages: Vec<String>,
    /// File stubs in first-seen order; a repeated name replaces the earlier stub.
    pub files: Vec<FileStub>,
}

impl DecodedFrames {
    /// True when no message and no file stub was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.files.is_empty()
    }

    pub(crate) fn upsert_file(&mut self, stub: FileStub) {
        match self.files.iter_mut().find(|f| f.name == stub.name) {
            Some(existing) => *existing = stub,
            None => self.files.push(stub),
        }
    }
}

/// The reconstructed payload of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Source transaction.
    pub tx_id: TxId,
    /// Messages in frame order.
    pub messages: Vec<String>,
    /// File stubs.
    pub files: Vec<FileStub>,
    /// Signer address, if one could be derived.
    pub signed_by: Option<String>,
    /// All outputs of the transaction, carrier or not.
    pub outputs: Vec<CarrierOutput>,
    /// Chain position.
    pub block: BlockMetadata,
    /// Serialized transaction size in bytes.
    pub total_byte_size: u64,
    /// When this record was built.
    pub built_at: DateTime<Utc>,
}
