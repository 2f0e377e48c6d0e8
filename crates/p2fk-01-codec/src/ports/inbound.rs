//! Inbound port: what the monitor calls to decode a transaction.

use crate::domain::{CarrierOutput, DecodedRecord};
use shared_types::{BlockMetadata, TxId};

/// Everything the codec needs to know about one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierTransaction {
    /// Transaction id.
    pub tx_id: TxId,
    /// Outputs in index order.
    pub outputs: Vec<CarrierOutput>,
    /// Signer address, if derivable.
    pub signed_by: Option<String>,
    /// Chain position.
    pub block: BlockMetadata,
    /// Serialized size in bytes.
    pub total_byte_size: u64,
}

/// Decodes transactions into P2FK records.
pub trait RecordDecoder: Send + Sync {
    /// Decode one transaction.
    ///
    /// Returns `None` when the transaction carries no P2FK record. This is
    /// the normal outcome for most transactions and is not an error.
    fn decode(&self, tx: &CarrierTransaction) -> Option<DecodedRecord>;
}
