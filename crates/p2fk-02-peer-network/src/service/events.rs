//! Peer event processing.
//!
//! Sessions report what they see through one bounded channel; a single
//! consumer task applies it to the shared peer table and cache.

use super::{PeerHandle, Shared};
use crate::domain::wire::{build_getdata_tx_payload, Command, VersionInfo, WireMessage};
use crate::domain::{ConnectionState, Transaction};
use crate::ports::Dialer;
use chrono::Utc;
use shared_types::TxId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Something a peer session observed.
#[derive(Debug)]
pub(crate) enum PeerEvent {
    /// Handshake completed.
    Connected {
        id: u64,
        addr: String,
        version: VersionInfo,
        commands: mpsc::Sender<WireMessage>,
    },
    /// Session ended.
    Disconnected { id: u64, reason: String },
    /// Peer announced transaction ids.
    Inventory { id: u64, ids: Vec<TxId> },
    /// Peer delivered a transaction body.
    Transaction { id: u64, tx: Transaction },
}

/// Consume peer events until shutdown.
pub(crate) async fn process_events<D: Dialer>(
    shared: Arc<Shared<D>>,
    mut events: mpsc::Receiver<PeerEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        apply(&shared, event);
    }
    debug!("[p2fk-02] Peer event loop stopped");
}

fn apply<D: Dialer>(shared: &Shared<D>, event: PeerEvent) {
    match event {
        PeerEvent::Connected {
            id,
            addr,
            version,
            commands,
        } => {
            if commands
                .try_send(WireMessage::empty(Command::Mempool))
                .is_err()
            {
                debug!(peer = %addr, "[p2fk-02] Could not request mempool");
            }
            let peers = {
                let mut peers = shared.peers.lock();
                peers.insert(
                    id,
                    PeerHandle {
                        addr: addr.clone(),
                        commands,
                    },
                );
                peers.len()
            };
            info!(
                peer = %addr,
                user_agent = %version.user_agent,
                start_height = version.start_height,
                peers,
                "[p2fk-02] Peer connected"
            );
            shared.set_state(ConnectionState::Connected);
        }
        PeerEvent::Disconnected { id, reason } => {
            let (removed, remaining) = {
                let mut peers = shared.peers.lock();
                let removed = peers.remove(&id);
                (removed, peers.len())
            };
            let Some(peer) = removed else {
                return;
            };
            info!(peer = %peer.addr, %reason, remaining, "[p2fk-02] Peer disconnected");
            if remaining == 0 && !shared.shutdown.is_cancelled() {
                warn!("[p2fk-02] Lost all peers, requesting reconnect");
                shared.set_state(ConnectionState::Degraded);
                shared.reconnect.notify_one();
            }
        }
        PeerEvent::Inventory { id, ids } => {
            let unseen = shared.cache.lock().filter_unseen(&ids);
            if unseen.is_empty() {
                return;
            }
            let commands = shared.peers.lock().get(&id).map(|p| p.commands.clone());
            let Some(commands) = commands else {
                return;
            };
            trace!(peer = id, requested = unseen.len(), "[p2fk-02] Requesting transactions");
            let getdata = WireMessage::new(Command::GetData, build_getdata_tx_payload(&unseen));
            if commands.try_send(getdata).is_err() {
                debug!(peer = id, "[p2fk-02] Peer command queue full, getdata dropped");
            }
        }
        PeerEvent::Transaction { id, tx } => {
            let txid = tx.txid;
            let inserted = shared.cache.lock().insert(tx, Utc::now());
            if inserted {
                trace!(peer = id, %txid, "[p2fk-02] Transaction cached");
                shared.arrivals.notify_waiters();
            }
        }
    }
}
