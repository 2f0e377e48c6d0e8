//! # Transaction Monitor Service
//!
//! ```text
//!  start() ──check──→ spawn loop ──feed.next()──→ process(id) ──→ IndexStore
//!     │                   ↑                           │
//!     └── 5s, recheck     └── cancel / stop()         └──→ EventPublisher
//! ```
//!
//! The control block (state, cancel token, loop handle) sits behind one
//! `parking_lot::Mutex` that is never held across an await.

mod pipeline;

use crate::domain::{
    status_error, MonitorConfig, MonitorError, MonitorState, ProcessOutcome, STATUS_CONNECTION_FAILED,
    STATUS_NOT_CONNECTED, STATUS_RUNNING, STATUS_STARTED, STATUS_STOPPED,
};
use crate::ports::{ContentStore, IndexStore, MonitorApi, MonitorMetrics, NoopMetrics};
use async_trait::async_trait;
use futures::StreamExt;
use p2fk_01_codec::RecordDecoder;
use p2fk_02_peer_network::{PeerNetwork, TransactionFeed};
use p2fk_03_content_resolver::{ContentResolve, ReferenceExtractor};
use parking_lot::Mutex;
use shared_bus::EventPublisher;
use shared_types::{MonitorEvent, TxId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct Control {
    state: MonitorState,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Everything the loop and the public handle share.
pub(crate) struct MonitorCore<N: ?Sized, D, S, R, C> {
    config: MonitorConfig,
    network: Arc<N>,
    decoder: Arc<D>,
    store: Arc<S>,
    resolver: Arc<R>,
    content: Arc<C>,
    events: Arc<dyn EventPublisher>,
    metrics: Arc<dyn MonitorMetrics>,
    extractor: ReferenceExtractor,
    control: Mutex<Control>,
}

/// Watches the peer network for P2FK transactions and indexes them.
///
/// `N` may be unsized so the composition root can pass an
/// `Arc<dyn PeerNetwork>` picked at runtime.
pub struct TransactionMonitor<N: ?Sized, D, S, R, C> {
    core: Arc<MonitorCore<N, D, S, R, C>>,
}

impl<N, D, S, R, C> TransactionMonitor<N, D, S, R, C>
where
    N: PeerNetwork + ?Sized + 'static,
    D: RecordDecoder + 'static,
    S: IndexStore + 'static,
    R: ContentResolve + 'static,
    C: ContentStore + 'static,
{
    pub fn new(
        config: MonitorConfig,
        network: Arc<N>,
        decoder: Arc<D>,
        store: Arc<S>,
        resolver: Arc<R>,
        content: Arc<C>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            core: Arc::new(MonitorCore {
                config,
                network,
                decoder,
                store,
                resolver,
                content,
                events,
                metrics: Arc::new(NoopMetrics),
                extractor: ReferenceExtractor::new(),
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Report counters to `metrics`. Call before `start()`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MonitorMetrics>) -> Self {
        match Arc::get_mut(&mut self.core) {
            Some(core) => core.metrics = metrics,
            None => warn!("[p2fk-04] Monitor already running, metrics sink not replaced"),
        }
        self
    }

    /// The index store this monitor writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.core.store
    }

    /// Run one transaction through the pipeline outside the feed loop.
    ///
    /// # Errors
    ///
    /// Lookup, blocklist or cancellation failures. Failures of single
    /// items are counted in the outcome instead.
    pub async fn process_transaction(
        &self,
        id: &TxId,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, MonitorError> {
        self.core.process(id, cancel).await
    }
}

impl<N: ?Sized, D, S, R, C> Drop for TransactionMonitor<N, D, S, R, C> {
    fn drop(&mut self) {
        if let Some(cancel) = &self.core.control.lock().cancel {
            cancel.cancel();
        }
    }
}

impl<N: ?Sized, D, S, R, C> std::fmt::Debug for TransactionMonitor<N, D, S, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionMonitor")
            .field("state", &self.core.control.lock().state)
            .field("config", &self.core.config)
            .finish()
    }
}

impl<N, D, S, R, C> MonitorCore<N, D, S, R, C>
where
    N: PeerNetwork + ?Sized + 'static,
    D: RecordDecoder + 'static,
    S: IndexStore + 'static,
    R: ContentResolve + 'static,
    C: ContentStore + 'static,
{
    fn state(&self) -> MonitorState {
        self.control.lock().state
    }

    /// Move `from → to`; false if the monitor is not in `from`.
    fn transition(&self, from: MonitorState, to: MonitorState) -> bool {
        let mut control = self.control.lock();
        if control.state != from || !from.can_transition_to(to) {
            return false;
        }
        info!(%from, %to, "[p2fk-04] Monitor state changed");
        control.state = to;
        if to == MonitorState::Idle {
            control.cancel = None;
            control.task = None;
        }
        true
    }

    async fn publish_status(&self, active: bool, message: &str) {
        self.events
            .publish(MonitorEvent::status(active, message))
            .await;
    }

    /// Undo a start that was cancelled from outside. A `stop()` in
    /// progress owns the transition instead.
    async fn abandon_start(&self) -> MonitorError {
        if self.transition(MonitorState::Starting, MonitorState::Idle) {
            self.publish_status(false, STATUS_STOPPED).await;
        }
        MonitorError::Cancelled
    }

    async fn run(self: Arc<Self>, mut feed: TransactionFeed, cancel: CancellationToken) {
        self.publish_status(true, STATUS_RUNNING).await;
        info!("[p2fk-04] Monitoring transactions");

        let feed_lost = loop {
            let id = tokio::select! {
                biased;
                _ = cancel.cancelled() => break false,
                next = feed.next() => match next {
                    Some(id) => id,
                    None => break !cancel.is_cancelled(),
                },
            };
            match self.process(&id, &cancel).await {
                Ok(outcome) => debug!(tx_id = %id, ?outcome, "[p2fk-04] Transaction processed"),
                Err(MonitorError::Cancelled) => break false,
                Err(e) => warn!(tx_id = %id, error = %e, "[p2fk-04] Transaction skipped"),
            }
        };

        if feed_lost {
            error!("[p2fk-04] Transaction feed ended unexpectedly");
            if self.transition(MonitorState::Running, MonitorState::Faulted)
                && self.transition(MonitorState::Faulted, MonitorState::Idle)
            {
                self.publish_status(false, &status_error("transaction feed ended"))
                    .await;
            }
        } else if self.transition(MonitorState::Running, MonitorState::Idle) {
            // Cancelled through the caller's token rather than stop()
            self.publish_status(false, STATUS_STOPPED).await;
        }
        debug!("[p2fk-04] Monitor loop finished");
    }
}

#[async_trait]
impl<N, D, S, R, C> MonitorApi for TransactionMonitor<N, D, S, R, C>
where
    N: PeerNetwork + ?Sized + 'static,
    D: RecordDecoder + 'static,
    S: IndexStore + 'static,
    R: ContentResolve + 'static,
    C: ContentStore + 'static,
{
    async fn start(&self, cancel: CancellationToken) -> Result<(), MonitorError> {
        let core = &self.core;
        let token = {
            let mut control = core.control.lock();
            if control.state != MonitorState::Idle {
                debug!(state = %control.state, "[p2fk-04] Start ignored");
                return Ok(());
            }
            control.state = MonitorState::Starting;
            let token = cancel.child_token();
            control.cancel = Some(token.clone());
            token
        };
        info!("[p2fk-04] Monitoring started");
        core.publish_status(true, STATUS_STARTED).await;

        if !core.network.is_connected().await {
            let delay = core.config.connection_check_delay();
            warn!(
                retry_in_secs = delay.as_secs(),
                "[p2fk-04] Peer network not connected"
            );
            core.publish_status(false, STATUS_NOT_CONNECTED).await;
            tokio::select! {
                _ = token.cancelled() => return Err(core.abandon_start().await),
                _ = tokio::time::sleep(delay) => {}
            }
            if !core.network.is_connected().await {
                if !core.transition(MonitorState::Starting, MonitorState::Idle) {
                    return Err(MonitorError::Cancelled);
                }
                error!("[p2fk-04] Peer network connection failed");
                core.publish_status(false, STATUS_CONNECTION_FAILED).await;
                return Err(MonitorError::NotConnected);
            }
        }
        if token.is_cancelled() {
            return Err(core.abandon_start().await);
        }

        {
            let mut control = core.control.lock();
            if control.state != MonitorState::Starting {
                return Err(MonitorError::Cancelled);
            }
            info!(
                from = %MonitorState::Starting,
                to = %MonitorState::Running,
                "[p2fk-04] Monitor state changed"
            );
            control.state = MonitorState::Running;
            let feed = core.network.new_transaction_feed(token.clone());
            control.task = Some(tokio::spawn(Arc::clone(core).run(feed, token)));
        }
        Ok(())
    }

    async fn stop(&self) {
        let (cancel, task) = {
            let mut control = self.core.control.lock();
            if !control.state.can_transition_to(MonitorState::Stopping) {
                return;
            }
            info!(
                from = %control.state,
                to = %MonitorState::Stopping,
                "[p2fk-04] Monitor state changed"
            );
            control.state = MonitorState::Stopping;
            (control.cancel.take(), control.task.take())
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "[p2fk-04] Monitor loop did not finish cleanly");
            }
        }
        self.core
            .transition(MonitorState::Stopping, MonitorState::Idle);
        info!("[p2fk-04] Monitoring stopped");
        self.core.publish_status(false, STATUS_STOPPED).await;
    }

    fn is_monitoring(&self) -> bool {
        self.core.state().is_active()
    }

    fn state(&self) -> MonitorState {
        self.core.state()
    }
}
