//! # P2FK Node
//!
//! Composition root: builds one instance of every subsystem from a
//! `NodeConfig` and owns them for the life of the process.
//!
//! ## Wiring
//!
//! ```text
//!  P2pPeerNetwork ─┐
//!                  ├─ Arc<dyn PeerNetwork> ──→ TransactionMonitor ──→ InMemoryIndexStore
//!  RpcPeerNetwork ─┘                             │    │    │
//!                                    P2fkCodec ──┘    │    └──→ InMemoryEventBus ──→ event log
//!                         RetryingResolver ──→ FsContentStore
//! ```

use super::config::{Backend, NodeConfig};
use anyhow::{Context, Result};
use p2fk_01_codec::P2fkCodec;
use p2fk_02_peer_network::{ConnectionState, P2pPeerNetwork, PeerNetwork, RpcPeerNetwork};
use p2fk_03_content_resolver::RetryingResolver;
use p2fk_04_tx_monitor::{
    FsContentStore, IndexStore, InMemoryIndexStore, MonitorApi, MonitorError, TransactionMonitor,
};
use p2fk_telemetry::Metrics;
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::{ItemKind, MonitorEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The monitor as the node instantiates it.
pub type NodeMonitor = TransactionMonitor<
    dyn PeerNetwork,
    P2fkCodec,
    InMemoryIndexStore,
    RetryingResolver,
    FsContentStore,
>;

/// The concrete backend behind the `PeerNetwork` trait object.
#[derive(Clone)]
enum NetworkBackend {
    P2p(Arc<P2pPeerNetwork>),
    Rpc(Arc<RpcPeerNetwork>),
}

impl NetworkBackend {
    fn build(config: &NodeConfig) -> Result<Self> {
        Ok(match config.network.backend {
            Backend::P2p => {
                let network = P2pPeerNetwork::connect(config.network.peer_network());
                Self::P2p(Arc::new(network))
            }
            Backend::Rpc => {
                let network = RpcPeerNetwork::new(config.network.rpc())
                    .context("Failed to create RPC peer network")?;
                Self::Rpc(Arc::new(network))
            }
        })
    }

    fn peer_network(&self) -> Arc<dyn PeerNetwork> {
        match self {
            Self::P2p(network) => Arc::clone(network) as Arc<dyn PeerNetwork>,
            Self::Rpc(network) => Arc::clone(network) as Arc<dyn PeerNetwork>,
        }
    }

    /// Peers for the gauge; a reachable RPC node counts as one.
    fn peer_count(&self) -> usize {
        match self {
            Self::P2p(network) => network.peer_count(),
            Self::Rpc(network) => usize::from(network.state() == ConnectionState::Connected),
        }
    }

    /// Kick off a new connect cycle. The RPC node keeps its own peers.
    fn request_reconnect(&self) {
        match self {
            Self::P2p(network) => network.request_reconnect(),
            Self::Rpc(_) => {}
        }
    }

    fn dispose(&self) {
        match self {
            Self::P2p(network) => network.dispose(),
            Self::Rpc(network) => network.dispose(),
        }
    }
}

/// A running P2FK node.
pub struct P2fkNode {
    config: NodeConfig,
    backend: NetworkBackend,
    monitor: NodeMonitor,
    store: Arc<InMemoryIndexStore>,
    bus: Arc<InMemoryEventBus>,
    metrics: Metrics,
    shutdown: CancellationToken,
}

impl P2fkNode {
    /// Build every subsystem. The P2P backend starts dialing right away,
    /// so this must run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Metrics registration, the RPC client or the HTTP client for the
    /// content resolver could not be created.
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!(
            backend = ?config.network.backend,
            chain = %config.network.chain,
            "Creating P2FK node"
        );

        let metrics = Metrics::new().context("Failed to register metrics")?;
        let backend = NetworkBackend::build(&config)?;
        let resolver = RetryingResolver::from_config(config.content.clone())
            .context("Failed to create content resolver")?;
        let content = FsContentStore::new(config.storage.content_dir());
        let store = Arc::new(InMemoryIndexStore::new());
        let bus = Arc::new(InMemoryEventBus::new());

        let monitor = NodeMonitor::new(
            config.monitor.clone(),
            backend.peer_network(),
            Arc::new(P2fkCodec::new()),
            Arc::clone(&store),
            Arc::new(resolver),
            Arc::new(content),
            Arc::clone(&bus) as Arc<dyn shared_bus::EventPublisher>,
        )
        .with_metrics(Arc::new(metrics.clone()));

        Ok(Self {
            config,
            backend,
            monitor,
            store,
            bus,
            metrics,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn monitor(&self) -> &NodeMonitor {
        &self.monitor
    }

    pub fn store(&self) -> &Arc<InMemoryIndexStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Start background tasks and the monitor.
    ///
    /// Keeps retrying while no peer is reachable, asking the peer network
    /// for a fresh connect cycle before each wait; returns once the monitor
    /// is running or the node is shut down.
    ///
    /// # Errors
    ///
    /// The configured blocklist could not be stored.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  P2FK Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.apply_blocklist().await?;
        self.spawn_event_log();
        self.spawn_metrics_reporter();

        loop {
            match self.monitor.start(self.shutdown.child_token()).await {
                Ok(()) => break,
                Err(MonitorError::Cancelled) => return Ok(()),
                Err(e) => {
                    let retry = self.config.runtime.start_retry();
                    warn!(
                        error = %e,
                        retry_in_secs = retry.as_secs(),
                        "Monitor could not start"
                    );
                    // An exhausted connect cycle waits for an explicit request
                    self.backend.request_reconnect();
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(retry) => {}
                    }
                }
            }
        }

        info!(
            data_dir = %self.config.storage.data_dir.display(),
            "Node running"
        );
        Ok(())
    }

    /// Block every address listed under `storage.blocked_addresses`.
    ///
    /// # Errors
    ///
    /// The index store rejected an entry.
    pub async fn apply_blocklist(&self) -> Result<()> {
        for address in &self.config.storage.blocked_addresses {
            let added = self
                .store
                .block_address(address, "configured")
                .await
                .with_context(|| format!("Failed to block {address}"))?;
            if added {
                info!(address = %address, "Signer blocked");
            }
        }
        Ok(())
    }

    fn spawn_event_log(&self) {
        let subscription = self.bus.subscribe(EventFilter::all());
        tokio::spawn(log_events(subscription, self.shutdown.clone()));
    }

    fn spawn_metrics_reporter(&self) {
        let backend = self.backend.clone();
        let metrics = self.metrics.clone();
        let interval = self.config.runtime.metrics_interval();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let peers = backend.peer_count();
                        let pending = backend.peer_network().list_pending_ids().len();
                        metrics.set_connected_peers(peers);
                        metrics.set_pending_transactions(pending);
                        debug!(peers, pending, "Gauges refreshed");
                        log_snapshot(&metrics);
                    }
                }
            }
        });
    }

    /// Stop the monitor, end background tasks and release the network.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        self.monitor.stop().await;
        self.shutdown.cancel();
        self.backend.dispose();

        info!(
            processed = self.metrics.transactions_processed(),
            messages = self.metrics.items_indexed(ItemKind::Message),
            files = self.metrics.items_indexed(ItemKind::File),
            content_refs = self.metrics.items_indexed(ItemKind::ContentRef),
            indexed_items = self.store.len(),
            "Shutdown complete"
        );
        log_snapshot(&self.metrics);
    }
}

fn log_snapshot(metrics: &Metrics) {
    match metrics.encode() {
        Ok(snapshot) => debug!("Metrics snapshot\n{}", snapshot),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
}

impl std::fmt::Debug for P2fkNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P2fkNode")
            .field("backend", &self.config.network.backend)
            .field("monitor", &self.monitor)
            .finish()
    }
}

async fn log_events(mut subscription: Subscription, shutdown: CancellationToken) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = subscription.recv() => match event {
                Some(event) => event,
                None => {
                    error!("Event bus closed");
                    break;
                }
            },
        };
        match event {
            MonitorEvent::ItemIndexed(item) => {
                info!(
                    tx_id = %item.tx_id,
                    kind = %item.kind,
                    summary = %item.summary,
                    "Item indexed"
                );
            }
            MonitorEvent::StatusChanged(status) => {
                info!(active = status.active, "{}", status.message);
            }
        }
    }
}
