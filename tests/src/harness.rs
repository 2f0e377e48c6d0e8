//! # Scenario Harness
//!
//! A `P2pPeerNetwork` dialing in-process peers, feeding a monitor built from
//! the real codec, index store, retrying resolver and telemetry metrics.
//! Only the content endpoint and the content store are doubles.
//!
//! Everything here runs under `tokio::time::pause()`; backoff and feed
//! polling advance instantly.

use async_trait::async_trait;
use p2fk_01_codec::{CarrierOutput, P2fkCodec};
use p2fk_02_peer_network::domain::wire::Command;
use p2fk_02_peer_network::testing::{
    raw_carrier_transaction, scripted_network, txid_of, RemotePeer, ScriptedDialer,
};
use p2fk_02_peer_network::{
    Chain, ConnectionState, P2pPeerNetwork, PeerNetworkConfig, RetryPolicy,
};
use p2fk_03_content_resolver::{ContentError, ContentFetcher, ResolverConfig, RetryingResolver};
use p2fk_04_tx_monitor::testing::MemoryContentStore;
use p2fk_04_tx_monitor::{InMemoryIndexStore, MonitorConfig, TransactionMonitor};
use p2fk_telemetry::Metrics;
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, Subscription};
use shared_types::{ItemIndexed, MonitorEvent, TxId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Carrier amount used by every scenario transaction (0.00005500).
pub const CARRIER_SATS: u64 = 5_500;

const EVENT_TIMEOUT: Duration = Duration::from_secs(120);

pub type ScenarioMonitor = TransactionMonitor<
    P2pPeerNetwork<ScriptedDialer>,
    P2fkCodec,
    InMemoryIndexStore,
    RetryingResolver,
    MemoryContentStore,
>;

/// Regtest client with one seed, short settle and backoff.
pub fn network_config() -> PeerNetworkConfig {
    PeerNetworkConfig {
        chain: Chain::Regtest,
        seeds: vec!["peer-a:18444".into()],
        target_peers: 1,
        connect_timeout_secs: 5,
        settle_delay_secs: 1,
        fetch_timeout_ms: 2_000,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay_secs: 1,
            multiplier: 2,
        },
        ..Default::default()
    }
}

// =============================================================================
// CONTENT ENDPOINT
// =============================================================================

/// Content endpoint serving fixed bytes; unknown hashes answer 404.
pub struct FixtureFetcher {
    endpoint: String,
    content: Mutex<HashMap<String, Vec<u8>>>,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            content: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(self, hash: &str, bytes: &[u8]) -> Self {
        self.content.lock().insert(hash.to_string(), bytes.to_vec());
        self
    }

    /// Requests answered so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for FixtureFetcher {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.content
            .lock()
            .get(hash)
            .cloned()
            .ok_or_else(|| ContentError::Http {
                endpoint: self.endpoint.clone(),
                status: 404,
            })
    }
}

// =============================================================================
// SCENARIO
// =============================================================================

/// One wired node and the test's end of its network.
pub struct Scenario {
    pub network: Arc<P2pPeerNetwork<ScriptedDialer>>,
    pub dialer: ScriptedDialer,
    pub remotes: UnboundedReceiver<RemotePeer>,
    pub monitor: ScenarioMonitor,
    pub store: Arc<InMemoryIndexStore>,
    pub content: Arc<MemoryContentStore>,
    pub fetcher: Arc<FixtureFetcher>,
    pub metrics: Metrics,
    pub events: Subscription,
    _bus: Arc<InMemoryEventBus>,
}

impl Scenario {
    /// Spawn the client and build the monitor. Must run inside a runtime.
    pub fn new(fetcher: FixtureFetcher) -> Self {
        let (dialer, remotes) = scripted_network(Chain::Regtest);
        let network = Arc::new(P2pPeerNetwork::spawn(network_config(), dialer.clone()));

        let fetcher = Arc::new(fetcher);
        let resolver = RetryingResolver::new(
            vec![Arc::clone(&fetcher) as Arc<dyn ContentFetcher>],
            ResolverConfig::default(),
        );
        let store = Arc::new(InMemoryIndexStore::new());
        let content = Arc::new(MemoryContentStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe(EventFilter::all());
        let metrics = Metrics::new().unwrap();

        let monitor = ScenarioMonitor::new(
            MonitorConfig::default(),
            Arc::clone(&network),
            Arc::new(P2fkCodec::new()),
            Arc::clone(&store),
            Arc::new(resolver),
            Arc::clone(&content),
            Arc::clone(&bus) as Arc<dyn EventPublisher>,
        )
        .with_metrics(Arc::new(metrics.clone()));

        Self {
            network,
            dialer,
            remotes,
            monitor,
            store,
            content,
            fetcher,
            metrics,
            events,
            _bus: bus,
        }
    }

    /// Accept the next dial: handshake plus the client's `mempool` request.
    pub async fn next_peer(&mut self) -> RemotePeer {
        let mut peer = self.remotes.recv().await.expect("client dials");
        peer.accept_handshake().await.unwrap();
        peer.expect(Command::Mempool).await.unwrap();
        peer
    }

    pub async fn wait_for_state<F>(&self, accept: F) -> ConnectionState
    where
        F: Fn(&ConnectionState) -> bool,
    {
        let mut state = self.network.subscribe_state();
        let reached = tokio::time::timeout(EVENT_TIMEOUT, state.wait_for(|s| accept(s)))
            .await
            .expect("state reached in time")
            .expect("state channel open");
        *reached
    }

    pub async fn next_event(&mut self) -> MonitorEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("event in time")
            .expect("bus open")
    }

    /// Next item-indexed event; status events are skipped.
    pub async fn next_item(&mut self) -> ItemIndexed {
        loop {
            if let MonitorEvent::ItemIndexed(item) = self.next_event().await {
                return item;
            }
        }
    }

    /// Skip events until a status with `message`.
    pub async fn wait_status(&mut self, message: &str) {
        loop {
            if let MonitorEvent::StatusChanged(status) = self.next_event().await {
                if status.message == message {
                    return;
                }
            }
        }
    }

    /// Poll `check` until it holds.
    pub async fn wait_until<F>(&self, check: F)
    where
        F: Fn(&Self) -> bool,
    {
        tokio::time::timeout(EVENT_TIMEOUT, async {
            while !check(self) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await
        .expect("condition reached in time");
    }
}

/// Raw transaction carrying `outputs` at the scenario carrier amount.
pub fn carrier_transaction(outputs: &[CarrierOutput]) -> Vec<u8> {
    raw_carrier_transaction(outputs, CARRIER_SATS)
}

/// Announce `raw` from `peer` and answer the client's `getdata`.
pub async fn deliver(peer: &mut RemotePeer, raw: &[u8]) -> TxId {
    let id = txid_of(raw);
    peer.announce(&[id]).await.unwrap();
    let requested = peer.serve_getdata(&[raw.to_vec()]).await.unwrap();
    assert_eq!(requested, vec![id]);
    id
}
