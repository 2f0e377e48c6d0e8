//! Testing Utilities
//!
//! Hand-written doubles for every port the monitor consumes. Available with
//! the `test-utils` feature flag.

use crate::domain::{SkipReason, StoreError};
use crate::ports::{ContentStore, MonitorMetrics};
use async_trait::async_trait;
use futures::StreamExt;
use p2fk_01_codec::{CarrierOutput, EncodeError, P2fkEncoder};
use p2fk_02_peer_network::{
    ConnectionState, PeerNetwork, PeerNetworkError, TransactionDetails, TransactionFeed,
};
use p2fk_03_content_resolver::{ContentError, ContentResolve};
use parking_lot::Mutex;
use shared_types::{BlockMetadata, ItemKind, TxId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Details of a mempool transaction with the given outputs.
#[must_use]
pub fn transaction(n: u8, outputs: Vec<CarrierOutput>, signer: Option<&str>) -> TransactionDetails {
    TransactionDetails {
        tx_id: TxId::from_bytes([n; 32]),
        outputs,
        signed_by: signer.map(str::to_string),
        block: BlockMetadata::default(),
        size: 250,
    }
}

/// Carrier outputs encoding one message.
///
/// # Errors
///
/// Messages shorter than two bytes.
pub fn message_outputs(text: &str) -> Result<Vec<CarrierOutput>, EncodeError> {
    P2fkEncoder::new().message(text)?.build()
}

// =============================================================================
// PEER NETWORK
// =============================================================================

#[derive(Default)]
struct NetworkState {
    transactions: Mutex<HashMap<TxId, TransactionDetails>>,
    announced: Mutex<Vec<TxId>>,
    closed: AtomicBool,
    arrivals: Notify,
    /// `is_connected` answers false this many more times.
    offline_checks: AtomicUsize,
    checks: AtomicUsize,
}

/// Peer network whose feed and lookups are driven by the test.
///
/// Every feed replays all announced ids from the start, each with its own
/// cursor.
#[derive(Clone, Default)]
pub struct MockPeerNetwork {
    state: Arc<NetworkState>,
}

impl MockPeerNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report "not connected" for the next `checks` connectivity checks.
    pub fn offline_for(&self, checks: usize) {
        self.state.offline_checks.store(checks, Ordering::SeqCst);
    }

    /// Connectivity checks made so far.
    pub fn connection_checks(&self) -> usize {
        self.state.checks.load(Ordering::SeqCst)
    }

    /// Make a transaction resolvable without announcing it.
    pub fn insert(&self, tx: TransactionDetails) {
        self.state.transactions.lock().insert(tx.tx_id, tx);
    }

    /// Make a transaction resolvable and push its id to every feed.
    pub fn announce(&self, tx: TransactionDetails) {
        let id = tx.tx_id;
        self.insert(tx);
        self.announce_id(id);
    }

    /// Push an id, resolvable or not, to every feed.
    pub fn announce_id(&self, id: TxId) {
        self.state.announced.lock().push(id);
        self.state.arrivals.notify_waiters();
    }

    /// End every feed as if the network went away.
    pub fn close_feeds(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.arrivals.notify_waiters();
    }

    /// Let feeds created from now on run again.
    pub fn reopen_feeds(&self) {
        self.state.closed.store(false, Ordering::SeqCst);
    }
}

struct MockFeed {
    state: Arc<NetworkState>,
    cursor: usize,
    cancel: CancellationToken,
}

#[async_trait]
impl PeerNetwork for MockPeerNetwork {
    fn state(&self) -> ConnectionState {
        if self.state.offline_checks.load(Ordering::SeqCst) > 0 {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }

    async fn is_connected(&self) -> bool {
        self.state.checks.fetch_add(1, Ordering::SeqCst);
        self.state
            .offline_checks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }

    fn list_pending_ids(&self) -> Vec<TxId> {
        self.state.announced.lock().clone()
    }

    async fn get_transaction(&self, id: &TxId) -> Result<TransactionDetails, PeerNetworkError> {
        self.state
            .transactions
            .lock()
            .get(id)
            .cloned()
            .ok_or(PeerNetworkError::TransactionNotFound(*id))
    }

    fn new_transaction_feed(&self, cancel: CancellationToken) -> TransactionFeed {
        let feed = MockFeed {
            state: Arc::clone(&self.state),
            cursor: 0,
            cancel,
        };
        futures::stream::unfold(feed, |mut feed| async move {
            loop {
                let state = Arc::clone(&feed.state);
                let arrived = state.arrivals.notified();
                if feed.cancel.is_cancelled() {
                    return None;
                }
                let next = state.announced.lock().get(feed.cursor).copied();
                if let Some(id) = next {
                    feed.cursor += 1;
                    return Some((id, feed));
                }
                if state.closed.load(Ordering::SeqCst) {
                    return None;
                }
                tokio::select! {
                    _ = feed.cancel.cancelled() => return None,
                    _ = arrived => {}
                }
            }
        })
        .boxed()
    }
}

// =============================================================================
// CONTENT
// =============================================================================

/// Resolver serving fixed bytes per hash; unknown hashes are exhausted.
#[derive(Default)]
pub struct ScriptedResolver {
    content: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
    stall: AtomicBool,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `hash`.
    #[must_use]
    pub fn with(self, hash: &str, bytes: &[u8]) -> Self {
        self.content.lock().insert(hash.to_string(), bytes.to_vec());
        self
    }

    /// Never answer; downloads end only on cancellation.
    #[must_use]
    pub fn stalled(self) -> Self {
        self.stall.store(true, Ordering::SeqCst);
        self
    }

    /// Hashes requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContentResolve for ScriptedResolver {
    async fn download(
        &self,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ContentError> {
        self.requests.lock().push(hash.to_string());
        if self.stall.load(Ordering::SeqCst) {
            cancel.cancelled().await;
            return Err(ContentError::Cancelled {
                hash: hash.to_string(),
            });
        }
        let found = self.content.lock().get(hash).cloned();
        found.ok_or_else(|| ContentError::Exhausted {
            hash: hash.to_string(),
            attempts: 3,
            last: Box::new(ContentError::NoEndpoints),
        })
    }
}

/// Content store keeping files in memory under `/mem`.
#[derive(Default)]
pub struct MemoryContentStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes saved under `file_name`.
    pub fn file(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        self.files
            .lock()
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(PathBuf::from("/mem").join(file_name))
    }
}

// =============================================================================
// METRICS
// =============================================================================

/// Counts every metrics call.
#[derive(Default)]
pub struct RecordingMetrics {
    processed: AtomicU64,
    content_failures: AtomicU64,
    indexed: Mutex<HashMap<ItemKind, u64>>,
    skipped: Mutex<HashMap<SkipReason, u64>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn content_failures(&self) -> u64 {
        self.content_failures.load(Ordering::SeqCst)
    }

    pub fn indexed(&self, kind: ItemKind) -> u64 {
        self.indexed.lock().get(&kind).copied().unwrap_or(0)
    }

    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped.lock().get(&reason).copied().unwrap_or(0)
    }
}

impl MonitorMetrics for RecordingMetrics {
    fn transaction_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    fn item_indexed(&self, kind: ItemKind) {
        *self.indexed.lock().entry(kind).or_default() += 1;
    }

    fn transaction_skipped(&self, reason: SkipReason) {
        *self.skipped.lock().entry(reason).or_default() += 1;
    }

    fn content_failed(&self) {
        self.content_failures.fetch_add(1, Ordering::SeqCst);
    }
}
