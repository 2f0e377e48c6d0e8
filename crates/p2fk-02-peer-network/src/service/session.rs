//! One connection to one peer.
//!
//! ```text
//! dial ─→ handshake ─→ Connected event ─┬─ writer task: drain command queue
//!                                       └─ reader loop:  ping → pong
//!                                                        inv  → Inventory event
//!                                                        tx   → Transaction event
//! ```

use super::events::PeerEvent;
use super::Shared;
use crate::adapters::framing::{handshake, read_message, write_message};
use crate::domain::wire::{announced_tx_ids, parse_inventory, Command, WireMessage};
use crate::domain::{PeerNetworkError, Transaction};
use crate::ports::Dialer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Outgoing messages queued per peer.
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Dial, handshake and serve one peer until it goes away or we shut down.
pub(crate) async fn run_session<D: Dialer>(shared: Arc<Shared<D>>, addr: String) {
    let id = shared.next_peer_id.fetch_add(1, Ordering::Relaxed);
    let magic = shared.params.magic;

    let connect = async {
        let mut stream = shared.dialer.dial(&addr).await?;
        let version = handshake(&mut stream, magic).await?;
        Ok::<_, PeerNetworkError>((stream, version))
    };
    let connected = tokio::select! {
        _ = shared.shutdown.cancelled() => None,
        result = timeout(shared.config.connect_timeout(), connect) => match result {
            Ok(Ok(connected)) => Some(connected),
            Ok(Err(e)) => {
                debug!(peer = %addr, error = %e, "[p2fk-02] Connect failed");
                None
            }
            Err(_) => {
                debug!(peer = %addr, "[p2fk-02] Connect timed out");
                None
            }
        },
    };
    shared.dialing.lock().remove(&addr);
    let Some((stream, version)) = connected else {
        return;
    };

    let token = shared.shutdown.child_token();
    let (commands, mut queue) = mpsc::channel::<WireMessage>(COMMAND_QUEUE_CAPACITY);
    let event = PeerEvent::Connected {
        id,
        addr: addr.clone(),
        version,
        commands: commands.clone(),
    };
    if shared.events.send(event).await.is_err() {
        return;
    }

    let (mut reader, mut writer) = tokio::io::split(stream);

    let writer_token = token.clone();
    let writer_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                _ = writer_token.cancelled() => break,
                message = queue.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            if let Err(e) = write_message(&mut writer, magic, &message).await {
                debug!(error = %e, "[p2fk-02] Peer write failed");
                break;
            }
        }
        writer_token.cancel();
    });

    let reason = loop {
        let message = tokio::select! {
            _ = token.cancelled() => break "closed".to_string(),
            message = read_message(&mut reader, magic) => message,
        };
        let message = match message {
            Ok(message) => message,
            Err(e) => break e.to_string(),
        };
        let event = match message.command {
            Command::Ping => {
                let _ = commands.try_send(WireMessage::new(Command::Pong, message.payload));
                None
            }
            Command::Inv => match parse_inventory(&message.payload) {
                Ok(items) => {
                    let ids = announced_tx_ids(&items);
                    (!ids.is_empty()).then_some(PeerEvent::Inventory { id, ids })
                }
                Err(e) => {
                    debug!(peer = %addr, error = %e, "[p2fk-02] Bad inventory");
                    None
                }
            },
            Command::Tx => match Transaction::parse(&message.payload) {
                Ok(tx) => Some(PeerEvent::Transaction { id, tx }),
                Err(e) => {
                    debug!(peer = %addr, error = %e, "[p2fk-02] Unparseable transaction");
                    None
                }
            },
            other => {
                trace!(peer = %addr, command = other.as_str(), "[p2fk-02] Ignored message");
                None
            }
        };
        if let Some(event) = event {
            if shared.events.send(event).await.is_err() {
                break "event loop closed".to_string();
            }
        }
    };

    token.cancel();
    let _ = writer_task.await;
    let _ = shared
        .events
        .send(PeerEvent::Disconnected { id, reason })
        .await;
}
