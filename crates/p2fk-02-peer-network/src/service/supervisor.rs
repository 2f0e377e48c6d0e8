//! Connect cycles.
//!
//! A cycle makes up to `retry.max_attempts` attempts. Each attempt resolves
//! the seeds, dials up to the peer target, then waits the settle delay and
//! counts peers. Between failed attempts it backs off `base × mult^attempt`.
//! An exhausted cycle leaves the client `Disconnected` until the next
//! reconnect request.

use super::session::run_session;
use super::Shared;
use crate::domain::ConnectionState;
use crate::ports::Dialer;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Run connect cycles whenever the client has no peers.
pub(crate) async fn supervise<D: Dialer>(shared: Arc<Shared<D>>) {
    loop {
        if shared.peer_count() == 0 {
            connect_cycle(&shared).await;
        }
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = shared.reconnect.notified() => {}
        }
    }
    debug!("[p2fk-02] Supervisor stopped");
}

/// Sleep unless shut down first. Returns `false` on shutdown.
async fn pause<D: Dialer>(shared: &Shared<D>, delay: Duration) -> bool {
    tokio::select! {
        _ = shared.shutdown.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn connect_cycle<D: Dialer>(shared: &Arc<Shared<D>>) {
    let policy = shared.config.retry.clone();
    for attempt in 1..=policy.max_attempts {
        if shared.shutdown.is_cancelled() {
            return;
        }
        shared.set_state(ConnectionState::Connecting);
        info!(attempt, max_attempts = policy.max_attempts, "[p2fk-02] Connecting to peer network");

        let dialed = dial_round(shared).await;
        if !pause(shared, shared.config.settle_delay()).await {
            return;
        }

        let peers = shared.peer_count();
        if peers > 0 {
            info!(peers, dialed, "[p2fk-02] Peer network connected");
            shared.set_state(ConnectionState::Connected);
            return;
        }
        if attempt == policy.max_attempts {
            break;
        }
        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            dialed,
            retry_in_secs = delay.as_secs(),
            "[p2fk-02] No peers connected, backing off"
        );
        if !pause(shared, delay).await {
            return;
        }
    }
    error!(
        attempts = policy.max_attempts,
        "[p2fk-02] Could not connect to any peer, waiting for reconnect request"
    );
    shared.set_state(ConnectionState::Disconnected);
}

/// Start sessions toward fresh targets. Returns how many were started.
async fn dial_round<D: Dialer>(shared: &Arc<Shared<D>>) -> usize {
    let busy: HashSet<String> = {
        let peers = shared.peers.lock();
        let dialing = shared.dialing.lock();
        peers
            .values()
            .map(|p| p.addr.clone())
            .chain(dialing.iter().cloned())
            .collect()
    };
    let wanted = shared
        .config
        .target_peers
        .saturating_sub(shared.peer_count() + shared.dialing.lock().len());
    if wanted == 0 {
        return 0;
    }

    let mut candidates: Vec<String> = Vec::new();
    for seed in shared.config.dial_targets() {
        match timeout(shared.config.connect_timeout(), shared.dialer.resolve(&seed)).await {
            Ok(Ok(addrs)) => candidates.extend(addrs),
            Ok(Err(e)) => debug!(%seed, error = %e, "[p2fk-02] Seed lookup failed"),
            Err(_) => debug!(%seed, "[p2fk-02] Seed lookup timed out"),
        }
    }
    candidates.sort();
    candidates.dedup();
    candidates.retain(|addr| !busy.contains(addr));
    candidates.shuffle(&mut rand::thread_rng());
    candidates.truncate(wanted);

    for addr in &candidates {
        shared.dialing.lock().insert(addr.clone());
        tokio::spawn(run_session(Arc::clone(shared), addr.clone()));
    }
    debug!(started = candidates.len(), "[p2fk-02] Dial round finished");
    candidates.len()
}
