//! Inbound port: the peer network contract.

use crate::domain::{CachedTransaction, ChainParams, ConnectionState, PeerNetworkError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use p2fk_01_codec::{CarrierOutput, CarrierTransaction};
use shared_types::{BlockMetadata, TxId};
use tokio_util::sync::CancellationToken;

/// Lazy sequence of transaction ids not yet delivered to this consumer.
///
/// Ends only when its cancellation token fires or the client is disposed.
pub type TransactionFeed = BoxStream<'static, TxId>;

/// What the monitor needs to know about one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    /// Transaction id.
    pub tx_id: TxId,
    /// Outputs with a base58 address, amounts 8-decimal fixed point.
    pub outputs: Vec<CarrierOutput>,
    /// Signer address, if derivable.
    pub signed_by: Option<String>,
    /// Chain position; zero confirmations for mempool entries.
    pub block: BlockMetadata,
    /// Serialized size in bytes.
    pub size: u64,
}

impl TransactionDetails {
    /// Details of a cached mempool transaction.
    #[must_use]
    pub fn from_cached(cached: &CachedTransaction, params: &ChainParams) -> Self {
        Self {
            tx_id: cached.tx.txid,
            outputs: cached.tx.carrier_outputs(params),
            signed_by: cached.tx.signer_address(params),
            block: BlockMetadata {
                block_time: Some(cached.first_seen),
                block_height: None,
                confirmations: 0,
            },
            size: cached.tx.size as u64,
        }
    }

    /// Codec input for this transaction.
    #[must_use]
    pub fn to_carrier_transaction(&self) -> CarrierTransaction {
        CarrierTransaction {
            tx_id: self.tx_id,
            outputs: self.outputs.clone(),
            signed_by: self.signed_by.clone(),
            block: self.block.clone(),
            total_byte_size: self.size,
        }
    }
}

/// A source of pending transactions.
///
/// Implemented by the direct P2P client and by the JSON-RPC client; the
/// composition root picks one.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// True iff at least one peer (or the RPC node) is reachable.
    async fn is_connected(&self) -> bool;

    /// Snapshot of every transaction id seen so far.
    fn list_pending_ids(&self) -> Vec<TxId>;

    /// Look up a transaction, asking the network if it is not cached.
    ///
    /// # Errors
    ///
    /// `PeerNetworkError::TransactionNotFound` when no peer delivers it
    /// within the fetch timeout, `PeerNetworkError::NoPeers` when nobody
    /// can be asked.
    async fn get_transaction(&self, id: &TxId) -> Result<TransactionDetails, PeerNetworkError>;

    /// Address/amount pairs of a transaction's outputs.
    ///
    /// # Errors
    ///
    /// Same as `get_transaction`.
    async fn outputs_for(&self, id: &TxId) -> Result<Vec<CarrierOutput>, PeerNetworkError> {
        Ok(self.get_transaction(id).await?.outputs)
    }

    /// Start a new feed with its own delivery cursor.
    fn new_transaction_feed(&self, cancel: CancellationToken) -> TransactionFeed;
}
