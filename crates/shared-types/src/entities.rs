//! # Core Entities
//!
//! Transaction identifiers, indexed records and blocklist entries.

use crate::errors::TxIdParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A 32-byte transaction hash.
///
/// Bytes are kept in the order produced by double SHA-256 (the order used on
/// the wire). `Display` and `FromStr` use the byte-reversed hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxId([u8; 32]);

impl TxId {
    /// Wrap raw hash bytes in wire order.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes in wire order.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Bytes in display order (reversed).
    #[must_use]
    pub fn to_display_bytes(&self) -> [u8; 32] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_display_bytes()))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({self})")
    }
}

impl FromStr for TxId {
    type Err = TxIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(TxIdParseError::InvalidLength(s.len()));
        }
        let decoded = hex::decode(s).map_err(|e| TxIdParseError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of an indexed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    /// A plain text message.
    Message,
    /// A file stub: name and declared size only.
    File,
    /// A message that referenced content-network data which was downloaded.
    ContentRef,
}

impl ItemKind {
    /// Stable lowercase label, used in events, logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::File => "file",
            Self::ContentRef => "content-ref",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain position of a transaction, when known.
///
/// Mempool transactions have zero confirmations and no height; their block
/// time is the moment they were first observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Block (or observation) time.
    pub block_time: Option<DateTime<Utc>>,
    /// Block height, if confirmed.
    pub block_height: Option<u32>,
    /// Number of confirmations.
    pub confirmations: u32,
}

/// A persisted record derived from one decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Source transaction.
    pub tx_id: TxId,
    /// Record kind.
    pub kind: ItemKind,
    /// Message text (message and content-ref kinds).
    pub content: Option<String>,
    /// File name (file and content-ref kinds).
    pub file_name: Option<String>,
    /// Byte size: declared length for file stubs, downloaded size for content refs.
    pub file_size: Option<u64>,
    /// Content-network hash, if the message referenced one.
    pub content_hash: Option<String>,
    /// Address that signed the transaction.
    pub signed_by: Option<String>,
    /// Whether the referenced content was downloaded.
    pub is_downloaded: bool,
    /// Where downloaded content was written.
    pub local_path: Option<PathBuf>,
    /// When the record was created.
    pub indexed_at: DateTime<Utc>,
    /// Chain position of the source transaction.
    pub block: BlockMetadata,
}

impl IndexedItem {
    fn base(tx_id: TxId, kind: ItemKind) -> Self {
        Self {
            tx_id,
            kind,
            content: None,
            file_name: None,
            file_size: None,
            content_hash: None,
            signed_by: None,
            is_downloaded: false,
            local_path: None,
            indexed_at: Utc::now(),
            block: BlockMetadata::default(),
        }
    }

    /// A text message record.
    #[must_use]
    pub fn message(tx_id: TxId, text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::base(tx_id, ItemKind::Message)
        }
    }

    /// A file stub record.
    #[must_use]
    pub fn file(tx_id: TxId, file_name: impl Into<String>, declared_size: u64) -> Self {
        Self {
            file_name: Some(file_name.into()),
            file_size: Some(declared_size),
            ..Self::base(tx_id, ItemKind::File)
        }
    }

    /// A downloaded content-network reference.
    #[must_use]
    pub fn content_ref(
        tx_id: TxId,
        message: impl Into<String>,
        content_hash: impl Into<String>,
        file_name: impl Into<String>,
        size: u64,
        local_path: PathBuf,
    ) -> Self {
        Self {
            content: Some(message.into()),
            content_hash: Some(content_hash.into()),
            file_name: Some(file_name.into()),
            file_size: Some(size),
            is_downloaded: true,
            local_path: Some(local_path),
            ..Self::base(tx_id, ItemKind::ContentRef)
        }
    }

    /// Attach the signer address.
    #[must_use]
    pub fn signed_by(mut self, signer: Option<String>) -> Self {
        self.signed_by = signer;
        self
    }

    /// Attach chain position.
    #[must_use]
    pub fn with_block(mut self, block: BlockMetadata) -> Self {
        self.block = block;
        self
    }
}

/// A signer whose records are suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedAddress {
    /// Signer address (unique).
    pub address: String,
    /// Free-form reason supplied by the policy surface.
    pub reason: String,
    /// When the block was added.
    pub blocked_at: DateTime<Utc>,
}
