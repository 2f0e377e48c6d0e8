//! # P2P Client Service
//!
//! `P2pPeerNetwork` owns three kinds of task:
//!
//! ```text
//!  supervisor ──spawns──→ session × N ──PeerEvent──→ event loop
//!      ↑                                                 │
//!      └──────────── reconnect (0 peers) ────────────────┘
//! ```
//!
//! Sessions never touch shared state directly; the event loop is the only
//! writer of the peer table and the cache. Lookups and feeds take the cache
//! lock only for the duration of a read.

mod events;
mod session;
mod supervisor;

use crate::adapters::TcpDialer;
use crate::domain::wire::{build_getdata_tx_payload, Command, WireMessage};
use crate::domain::{
    CachedTransaction, ChainParams, ConnectionState, FeedCursorMode, PeerNetworkConfig,
    PeerNetworkError, PendingTxCache,
};
use crate::feed::cache_feed;
use crate::ports::{Dialer, PeerNetwork, TransactionDetails, TransactionFeed};
use async_trait::async_trait;
use events::{process_events, PeerEvent};
use parking_lot::Mutex;
use shared_types::TxId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A connected peer as seen by the event loop.
#[derive(Debug)]
pub(crate) struct PeerHandle {
    pub addr: String,
    pub commands: mpsc::Sender<WireMessage>,
}

/// State shared by all tasks of one client.
pub(crate) struct Shared<D> {
    pub config: PeerNetworkConfig,
    pub params: ChainParams,
    pub dialer: D,
    pub cache: Arc<Mutex<PendingTxCache>>,
    pub peers: Mutex<HashMap<u64, PeerHandle>>,
    /// Targets with a session still dialing or handshaking.
    pub dialing: Mutex<HashSet<String>>,
    pub state: watch::Sender<ConnectionState>,
    pub events: mpsc::Sender<PeerEvent>,
    /// Wakes the supervisor for a new connect cycle.
    pub reconnect: Notify,
    /// Fired whenever a new transaction lands in the cache.
    pub arrivals: Notify,
    pub shutdown: CancellationToken,
    pub next_peer_id: AtomicU64,
}

impl<D> Shared<D> {
    pub(crate) fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    /// Apply a state change if the state machine allows it.
    pub(crate) fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|state| {
            if *state == next || !state.can_transition_to(next) {
                return false;
            }
            info!(from = %state, to = %next, "[p2fk-02] Connection state changed");
            *state = next;
            true
        });
    }

    fn cached(&self, id: &TxId) -> Option<Arc<CachedTransaction>> {
        self.cache.lock().get(id)
    }
}

/// Direct P2P client.
///
/// Dropping the client shuts down all of its tasks.
pub struct P2pPeerNetwork<D: Dialer = TcpDialer> {
    shared: Arc<Shared<D>>,
}

impl P2pPeerNetwork<TcpDialer> {
    /// Connect over TCP.
    #[must_use]
    pub fn connect(config: PeerNetworkConfig) -> Self {
        Self::spawn(config, TcpDialer)
    }
}

impl<D: Dialer> P2pPeerNetwork<D> {
    /// Start the supervisor and event loop. Must be called inside a Tokio
    /// runtime; the first connect cycle begins immediately.
    #[must_use]
    pub fn spawn(config: PeerNetworkConfig, dialer: D) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let cache = PendingTxCache::new(
            config.max_mempool_transactions,
            config.mempool_cleanup_threshold,
        );
        info!(
            chain = %config.chain,
            target_peers = config.target_peers,
            "[p2fk-02] Starting peer network client"
        );
        let shared = Arc::new(Shared {
            params: config.chain.params(),
            config,
            dialer,
            cache: Arc::new(Mutex::new(cache)),
            peers: Mutex::new(HashMap::new()),
            dialing: Mutex::new(HashSet::new()),
            state,
            events: events_tx,
            reconnect: Notify::new(),
            arrivals: Notify::new(),
            shutdown: CancellationToken::new(),
            next_peer_id: AtomicU64::new(1),
        });
        tokio::spawn(process_events(Arc::clone(&shared), events_rx));
        tokio::spawn(supervisor::supervise(Arc::clone(&shared)));
        Self { shared }
    }

    /// Connected peers right now.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.shared.peer_count()
    }

    /// Transactions currently held in the cache.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.shared.cache.lock().len()
    }

    /// Watch connection state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Ask the supervisor for a connect cycle now.
    pub fn request_reconnect(&self) {
        self.shared.reconnect.notify_one();
    }

    /// Stop every task and end every feed. Idempotent.
    pub fn dispose(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        self.shared.set_state(ConnectionState::Disposed);
        self.shared.shutdown.cancel();
        self.shared.peers.lock().clear();
        info!("[p2fk-02] Peer network client disposed");
    }
}

impl<D: Dialer> Drop for P2pPeerNetwork<D> {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl<D: Dialer> std::fmt::Debug for P2pPeerNetwork<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P2pPeerNetwork")
            .field("state", &*self.shared.state.borrow())
            .field("peers", &self.peer_count())
            .field("cached", &self.cached_count())
            .finish()
    }
}

#[async_trait]
impl<D: Dialer> PeerNetwork for P2pPeerNetwork<D> {
    fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    async fn is_connected(&self) -> bool {
        !self.shared.shutdown.is_cancelled() && self.peer_count() > 0
    }

    fn list_pending_ids(&self) -> Vec<TxId> {
        self.shared.cache.lock().seen_ids()
    }

    async fn get_transaction(&self, id: &TxId) -> Result<TransactionDetails, PeerNetworkError> {
        if self.shared.shutdown.is_cancelled() {
            return Err(PeerNetworkError::Disposed);
        }
        if let Some(cached) = self.shared.cached(id) {
            return Ok(TransactionDetails::from_cached(&cached, &self.shared.params));
        }

        let commands = {
            let peers = self.shared.peers.lock();
            peers
                .iter()
                .min_by_key(|(peer_id, _)| **peer_id)
                .map(|(_, peer)| peer.commands.clone())
        };
        let commands = commands.ok_or(PeerNetworkError::NoPeers)?;
        let getdata = WireMessage::new(Command::GetData, build_getdata_tx_payload(&[*id]));
        commands
            .send(getdata)
            .await
            .map_err(|_| PeerNetworkError::NoPeers)?;

        let arrival = async {
            loop {
                let notified = self.shared.arrivals.notified();
                if let Some(cached) = self.shared.cached(id) {
                    return cached;
                }
                notified.await;
            }
        };
        match tokio::time::timeout(self.shared.config.fetch_timeout(), arrival).await {
            Ok(cached) => Ok(TransactionDetails::from_cached(&cached, &self.shared.params)),
            Err(_) => Err(PeerNetworkError::TransactionNotFound(*id)),
        }
    }

    fn new_transaction_feed(&self, cancel: CancellationToken) -> TransactionFeed {
        let sequenced = self.shared.config.feed_cursor == FeedCursorMode::Sequenced;
        let cursor = self.shared.cache.lock().start_cursor(sequenced);
        cache_feed(
            Arc::clone(&self.shared.cache),
            cursor,
            self.shared.config.feed_poll_interval(),
            cancel,
            self.shared.shutdown.clone(),
        )
    }
}

#[cfg(test)]
mod tests;
