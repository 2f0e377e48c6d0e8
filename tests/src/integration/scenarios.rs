//! # End-to-End Scenarios
//!
//! Transactions travel the whole path: a scripted peer announces them over
//! the Bitcoin wire protocol, the P2P client fetches and caches them, the
//! feed hands their ids to the monitor, and the monitor decodes, resolves
//! and indexes them.
//!
//! ```text
//! RemotePeer ──inv/tx──→ P2pPeerNetwork ──feed──→ TransactionMonitor ──→ InMemoryIndexStore
//!                                                        │
//!                                        RetryingResolver ──→ FixtureFetcher
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::{carrier_transaction, deliver, FixtureFetcher, Scenario};
    use p2fk_01_codec::{encode_address_payload, P2fkEncoder};
    use p2fk_02_peer_network::testing::SIGNER_PUBKEY;
    use p2fk_02_peer_network::{hash160, ConnectionState};
    use p2fk_04_tx_monitor::{IndexStore, MonitorApi, MonitorState, STATUS_RUNNING, STATUS_STOPPED};
    use shared_types::ItemKind;
    use std::path::PathBuf;
    use tokio_util::sync::CancellationToken;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn signer() -> String {
        encode_address_payload(0x6f, &hash160(&SIGNER_PUBKEY))
    }

    /// Connect one peer and bring the monitor to Running.
    async fn running(fetcher: FixtureFetcher) -> (Scenario, p2fk_02_peer_network::testing::RemotePeer) {
        let mut scenario = Scenario::new(fetcher);
        let peer = scenario.next_peer().await;
        scenario
            .wait_for_state(|s| *s == ConnectionState::Connected)
            .await;
        scenario
            .monitor
            .start(CancellationToken::new())
            .await
            .unwrap();
        scenario.wait_status(STATUS_RUNNING).await;
        (scenario, peer)
    }

    // =========================================================================
    // MESSAGES AND FILE STUBS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_hello_world_message_is_indexed() {
        let (mut scenario, mut peer) = running(FixtureFetcher::new("https://gw.test")).await;

        let mut encoder = P2fkEncoder::new();
        encoder.message("Hello world!").unwrap();
        assert_eq!(encoder.stream(), b"\\12\\Hello world!");
        let outputs = encoder.build().unwrap();
        assert!(outputs.iter().all(|o| o.amount == "0.00005500"));

        let id = deliver(&mut peer, &carrier_transaction(&outputs)).await;

        let event = scenario.next_item().await;
        assert_eq!(event.tx_id, id);
        assert_eq!(event.kind, ItemKind::Message);
        assert_eq!(event.summary, "Hello world!");

        let items = scenario.store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content.as_deref(), Some("Hello world!"));
        assert_eq!(items[0].signed_by, Some(signer()));
        assert_eq!(items[0].block.confirmations, 0);
        assert_eq!(scenario.metrics.items_indexed(ItemKind::Message), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_stub_is_indexed_by_name() {
        let (mut scenario, mut peer) = running(FixtureFetcher::new("https://gw.test")).await;

        let outputs = P2fkEncoder::new()
            .file("song.mp3", b"ID3\x04\0\0\0\0\x01")
            .unwrap()
            .build()
            .unwrap();
        let id = deliver(&mut peer, &carrier_transaction(&outputs)).await;

        let event = scenario.next_item().await;
        assert_eq!(event.tx_id, id);
        assert_eq!(event.kind, ItemKind::File);
        assert_eq!(event.summary, "song.mp3");

        let items = scenario.store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].file_name.as_deref(), Some("song.mp3"));
        assert_eq!(items[0].file_size, Some(9));
        assert!(!items[0].is_downloaded);
        assert!(scenario.content.is_empty());
    }

    // =========================================================================
    // CONTENT REFERENCES
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_content_reference_is_downloaded() {
        let wav = b"RIFF\x24\0\0\0WAVEfmt ";
        let (mut scenario, mut peer) =
            running(FixtureFetcher::new("https://gw.test").with(CID, wav)).await;

        let message = format!("listen <<CONTENT:{CID}\\track.wav>>");
        let outputs = P2fkEncoder::new().message(&message).unwrap().build().unwrap();
        assert!(outputs.len() > 1);
        let id = deliver(&mut peer, &carrier_transaction(&outputs)).await;

        let event = scenario.next_item().await;
        assert_eq!(event.tx_id, id);
        assert_eq!(event.kind, ItemKind::ContentRef);
        assert_eq!(event.summary, "Downloaded: track.wav");

        let items = scenario.store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_hash.as_deref(), Some(CID));
        assert_eq!(items[0].content.as_deref(), Some(message.as_str()));
        assert_eq!(items[0].file_size, Some(wav.len() as u64));
        assert_eq!(items[0].local_path, Some(PathBuf::from("/mem/track.wav")));
        assert!(items[0].is_downloaded);
        assert_eq!(scenario.content.file("track.wav"), Some(wav.to_vec()));
        assert_eq!(scenario.fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_content_is_skipped_and_loop_continues() {
        let (mut scenario, mut peer) = running(FixtureFetcher::new("https://gw.test")).await;

        let missing = P2fkEncoder::new()
            .message(&format!("<<CONTENT:{CID}>>"))
            .unwrap()
            .build()
            .unwrap();
        let first = deliver(&mut peer, &carrier_transaction(&missing)).await;

        let plain = P2fkEncoder::new()
            .message("after the failure")
            .unwrap()
            .build()
            .unwrap();
        let second = deliver(&mut peer, &carrier_transaction(&plain)).await;
        assert_ne!(first, second);

        let event = scenario.next_item().await;
        assert_eq!(event.tx_id, second);
        assert_eq!(event.summary, "after the failure");

        // Every attempt of the default policy hit the endpoint
        assert_eq!(scenario.fetcher.calls(), 3);
        assert_eq!(scenario.store.len(), 1);
        assert!(scenario.content.is_empty());
        assert_eq!(scenario.metrics.transactions_processed(), 2);
        let text = scenario.metrics.encode().unwrap();
        assert!(text.contains("p2fk_content_failures_total 1"));
        assert!(scenario.monitor.is_monitoring());
    }

    // =========================================================================
    // POLICY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_blocked_signer_is_never_indexed() {
        let (mut scenario, mut peer) = running(FixtureFetcher::new("https://gw.test")).await;
        assert!(scenario
            .store
            .block_address(&signer(), "spam")
            .await
            .unwrap());

        let outputs = P2fkEncoder::new().message("buy now").unwrap().build().unwrap();
        deliver(&mut peer, &carrier_transaction(&outputs)).await;
        scenario
            .wait_until(|s| {
                s.metrics
                    .encode()
                    .unwrap()
                    .contains("p2fk_transactions_skipped_total{reason=\"blocked_signer\"} 1")
            })
            .await;
        assert!(scenario.store.is_empty());

        assert!(scenario.store.unblock_address(&signer()).await.unwrap());
        let outputs = P2fkEncoder::new().message("sorry").unwrap().build().unwrap();
        let id = deliver(&mut peer, &carrier_transaction(&outputs)).await;
        assert_eq!(scenario.next_item().await.tx_id, id);
        assert_eq!(scenario.store.items_by_signer(&signer()).len(), 1);
    }

    // =========================================================================
    // CONNECTIVITY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_lost_peers_stall_feed_until_reconnect() {
        let (mut scenario, peer) = running(FixtureFetcher::new("https://gw.test")).await;

        drop(peer);
        let state = scenario
            .wait_for_state(|s| *s != ConnectionState::Connected)
            .await;
        assert_ne!(state, ConnectionState::Disposed);
        assert!(scenario.monitor.is_monitoring());
        assert_eq!(scenario.monitor.state(), MonitorState::Running);

        // Redialed by the supervisor without outside help
        let mut peer = scenario.next_peer().await;
        scenario
            .wait_for_state(|s| *s == ConnectionState::Connected)
            .await;
        assert_eq!(scenario.dialer.dial_count(), 2);

        let outputs = P2fkEncoder::new()
            .message("back online")
            .unwrap()
            .build()
            .unwrap();
        let id = deliver(&mut peer, &carrier_transaction(&outputs)).await;
        let event = scenario.next_item().await;
        assert_eq!(event.tx_id, id);
        assert_eq!(event.summary, "back online");

        scenario.monitor.stop().await;
        scenario.wait_status(STATUS_STOPPED).await;
        scenario.network.dispose();
        assert_eq!(scenario.monitor.state(), MonitorState::Idle);
    }
}
