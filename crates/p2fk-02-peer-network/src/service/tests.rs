use super::*;
use crate::domain::{hash160, Chain, RetryPolicy};
use crate::testing::{
    p2pkh_script, raw_transaction, scripted_network, txid_of, RemotePeer, SIGNER_PUBKEY,
};
use futures::StreamExt;
use p2fk_01_codec::encode_address_payload;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn config() -> PeerNetworkConfig {
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

async fn next_peer(remotes: &mut UnboundedReceiver<RemotePeer>) -> RemotePeer {
    let mut peer = remotes.recv().await.unwrap();
    peer.accept_handshake().await.unwrap();
    peer.expect(Command::Mempool).await.unwrap();
    peer
}

// =============================================================================
// CONNECT AND CACHE
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_announced_transaction_is_fetched_and_fed() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let network = P2pPeerNetwork::spawn(config(), dialer);
    let mut peer = next_peer(&mut remotes).await;

    let raw = raw_transaction(&[(5_500, p2pkh_script(&[1; 20]))]);
    let id = txid_of(&raw);
    peer.announce(&[id]).await.unwrap();
    assert_eq!(peer.serve_getdata(&[raw.clone()]).await.unwrap(), vec![id]);

    let mut feed = network.new_transaction_feed(CancellationToken::new());
    assert_eq!(feed.next().await, Some(id));

    let details = network.get_transaction(&id).await.unwrap();
    assert_eq!(details.size, raw.len() as u64);
    assert_eq!(details.block.confirmations, 0);
    assert_eq!(
        details.signed_by,
        Some(encode_address_payload(0x6f, &hash160(&SIGNER_PUBKEY)))
    );
    assert_eq!(network.outputs_for(&id).await.unwrap().len(), 1);
    assert!(network.list_pending_ids().contains(&id));
    assert!(network.is_connected().await);
    assert_eq!(network.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_get_transaction_requests_unknown_id() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let network = Arc::new(P2pPeerNetwork::spawn(config(), dialer));
    let mut peer = next_peer(&mut remotes).await;
    let mut state = network.subscribe_state();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();

    let raw = raw_transaction(&[(5_500, p2pkh_script(&[2; 20]))]);
    let id = txid_of(&raw);
    let lookup = {
        let network = Arc::clone(&network);
        tokio::spawn(async move { network.get_transaction(&id).await })
    };
    assert_eq!(peer.serve_getdata(&[raw]).await.unwrap(), vec![id]);
    let details = lookup.await.unwrap().unwrap();
    assert_eq!(details.tx_id, id);
}

#[tokio::test(start_paused = true)]
async fn test_get_transaction_times_out() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let network = P2pPeerNetwork::spawn(config(), dialer);
    let mut peer = next_peer(&mut remotes).await;
    let mut state = network.subscribe_state();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();

    let missing = txid_of(&raw_transaction(&[(1, p2pkh_script(&[3; 20]))]));
    let server = tokio::spawn(async move {
        // Never answered
        let _ = peer.expect(Command::GetData).await;
        peer
    });
    assert_eq!(
        network.get_transaction(&missing).await,
        Err(PeerNetworkError::TransactionNotFound(missing))
    );
    drop(server);
}

#[tokio::test(start_paused = true)]
async fn test_ping_is_answered() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let _network = P2pPeerNetwork::spawn(config(), dialer);
    let mut peer = next_peer(&mut remotes).await;
    peer.send(WireMessage::new(Command::Ping, vec![5; 8]))
        .await
        .unwrap();
    let pong = peer.expect(Command::Pong).await.unwrap();
    assert_eq!(pong.payload, vec![5; 8]);
}

// =============================================================================
// RECONNECT
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_losing_all_peers_triggers_reconnect() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let network = P2pPeerNetwork::spawn(config(), dialer.clone());
    let peer = next_peer(&mut remotes).await;
    let mut state = network.subscribe_state();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();

    drop(peer);
    state
        .wait_for(|s| *s != ConnectionState::Connected)
        .await
        .unwrap();
    assert!(!network.is_connected().await);

    // Same seed dialed again without outside help
    let _second = next_peer(&mut remotes).await;
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();
    assert_eq!(dialer.dial_count(), 2);
    assert_eq!(network.peer_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_cycle_waits_for_request() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    dialer.set_online(false);
    let network = P2pPeerNetwork::spawn(config(), dialer.clone());

    // Three attempts: 1s settle each plus 2s and 4s backoff
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(dialer.dial_count(), 3);
    assert_eq!(network.state(), ConnectionState::Disconnected);
    assert_eq!(
        network.get_transaction(&txid_of(&raw_transaction(&[]))).await,
        Err(PeerNetworkError::NoPeers)
    );

    dialer.set_online(true);
    network.request_reconnect();
    let _peer = next_peer(&mut remotes).await;
    let mut state = network.subscribe_state();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();
}

// =============================================================================
// DISPOSE
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_dispose_ends_feeds_and_lookups() {
    let (dialer, mut remotes) = scripted_network(Chain::Regtest);
    let network = P2pPeerNetwork::spawn(config(), dialer);
    let _peer = next_peer(&mut remotes).await;

    let mut feed = network.new_transaction_feed(CancellationToken::new());
    let waiter = tokio::spawn(async move { feed.next().await });
    tokio::task::yield_now().await;

    network.dispose();
    network.dispose();
    assert_eq!(network.state(), ConnectionState::Disposed);
    assert_eq!(waiter.await.unwrap(), None);
    assert!(!network.is_connected().await);
    let id = txid_of(&raw_transaction(&[]));
    assert_eq!(
        network.get_transaction(&id).await,
        Err(PeerNetworkError::Disposed)
    );
}
