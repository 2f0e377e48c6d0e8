//! # Properties
//!
//! | Property | Holds for |
//! |----------|-----------|
//! | Decoding is deterministic | any carrier byte stream |
//! | Encode then decode returns the messages | any non-trivial UTF-8 text |
//! | A trim leaves `max + 1 - cleanup` entries | any bounds with `cleanup <= max` |
//! | A sequenced feed never skips a cached id | any insert/read interleaving |
//! | Blocked signers are never indexed | any blocklist |
//! | Replaying a transaction adds nothing | any repeat count |

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use p2fk_01_codec::{
        encode_address_payload, CarrierOutput, CarrierTransaction, P2fkCodec, P2fkEncoder,
        RecordDecoder, TESTNET_P2PKH_VERSION,
    };
    use p2fk_02_peer_network::{PendingTxCache, Transaction};
    use p2fk_04_tx_monitor::testing::{
        message_outputs, transaction, MemoryContentStore, MockPeerNetwork, ScriptedResolver,
    };
    use p2fk_04_tx_monitor::{InMemoryIndexStore, IndexStore, MonitorConfig, TransactionMonitor};
    use proptest::prelude::*;
    use shared_bus::{EventPublisher, InMemoryEventBus};
    use shared_types::{BlockMetadata, TxId};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    type PropertyMonitor = TransactionMonitor<
        MockPeerNetwork,
        P2fkCodec,
        InMemoryIndexStore,
        ScriptedResolver,
        MemoryContentStore,
    >;

    fn carrier_tx(stream: &[u8]) -> CarrierTransaction {
        let outputs = stream
            .chunks(20)
            .map(|chunk| {
                CarrierOutput::new(
                    encode_address_payload(TESTNET_P2PKH_VERSION, chunk),
                    "0.00005500",
                )
            })
            .collect();
        CarrierTransaction {
            tx_id: TxId::from_bytes([9; 32]),
            outputs,
            signed_by: None,
            block: BlockMetadata::default(),
            total_byte_size: 250,
        }
    }

    fn cache_tx(n: u32) -> Transaction {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&n.to_le_bytes());
        Transaction {
            txid: TxId::from_bytes(bytes),
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            size: 10,
        }
    }

    fn monitor(network: &MockPeerNetwork) -> PropertyMonitor {
        let bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());
        PropertyMonitor::new(
            MonitorConfig::default(),
            Arc::new(network.clone()),
            Arc::new(P2fkCodec::new()),
            Arc::new(InMemoryIndexStore::new()),
            Arc::new(ScriptedResolver::new()),
            Arc::new(MemoryContentStore::new()),
            bus,
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    // =========================================================================
    // CODEC
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_decoding_is_deterministic(stream in proptest::collection::vec(any::<u8>(), 0..200)) {
            let codec = P2fkCodec::new();
            let tx = carrier_tx(&stream);
            let first = codec.decode(&tx).map(|r| (r.messages, r.files));
            let second = codec.decode(&tx).map(|r| (r.messages, r.files));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_messages_survive_encoding(texts in proptest::collection::vec("\\PC{2,60}", 1..4)) {
            let mut encoder = P2fkEncoder::new();
            for text in &texts {
                encoder.message(text).unwrap();
            }
            let record = P2fkCodec::new()
                .decode(&CarrierTransaction {
                    outputs: encoder.build().unwrap(),
                    ..carrier_tx(&[])
                })
                .unwrap();
            prop_assert_eq!(record.messages, texts);
            prop_assert!(record.files.is_empty());
        }
    }

    // =========================================================================
    // CACHE
    // =========================================================================

    proptest! {
        #[test]
        fn prop_trim_leaves_expected_size((max, cleanup) in (1usize..64).prop_flat_map(|max| (Just(max), 1..=max))) {
            let mut cache = PendingTxCache::new(max, cleanup);
            for n in 0..=max {
                prop_assert!(cache.insert(cache_tx(n as u32), Utc::now()));
            }
            prop_assert_eq!(cache.len(), max + 1 - cleanup);
        }

        #[test]
        fn prop_sequenced_feed_never_skips(
            max in 2usize..32,
            batches in proptest::collection::vec(1u32..20, 1..12),
        ) {
            let mut cache = PendingTxCache::new(max, max / 2 + 1);
            let mut cursor = cache.start_cursor(true);
            let mut delivered: Vec<TxId> = Vec::new();
            let mut next = 0u32;

            for batch in batches {
                for _ in 0..batch {
                    cache.insert(cache_tx(next), Utc::now());
                    next += 1;
                }
                let (ids, advanced) = cache.read_from(cursor);
                cursor = advanced;
                delivered.extend(ids);
                for id in cache.cached_ids() {
                    prop_assert!(delivered.contains(&id));
                }
            }
        }
    }

    // =========================================================================
    // MONITOR
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_blocked_signers_never_indexed(blocked in proptest::collection::vec(any::<bool>(), 1..6)) {
            let network = MockPeerNetwork::new();
            let monitor = monitor(&network);
            let cancel = CancellationToken::new();

            runtime().block_on(async {
                for (i, is_blocked) in blocked.iter().enumerate() {
                    let signer = format!("mSigner{i}");
                    let outputs = message_outputs(&format!("hello from {i}")).unwrap();
                    network.insert(transaction(i as u8, outputs, Some(&signer)));
                    if *is_blocked {
                        monitor.store().block_address(&signer, "property").await.unwrap();
                    }
                }
                for i in 0..blocked.len() {
                    let id = TxId::from_bytes([i as u8; 32]);
                    monitor.process_transaction(&id, &cancel).await.unwrap();
                }
            });

            for (i, is_blocked) in blocked.iter().enumerate() {
                let indexed = monitor.store().items_by_signer(&format!("mSigner{i}")).len();
                prop_assert_eq!(indexed, usize::from(!is_blocked));
            }
        }

        #[test]
        fn prop_replay_adds_nothing(text in "[a-z ,.!]{2,40}", repeats in 1usize..5) {
            let network = MockPeerNetwork::new();
            let monitor = monitor(&network);
            let cancel = CancellationToken::new();
            network.insert(transaction(1, message_outputs(&text).unwrap(), None));
            let id = TxId::from_bytes([1; 32]);

            runtime().block_on(async {
                for _ in 0..repeats {
                    monitor.process_transaction(&id, &cancel).await.unwrap();
                }
            });

            let items = monitor.store().items();
            prop_assert_eq!(items.len(), 1);
            prop_assert_eq!(items[0].content.as_deref(), Some(text.as_str()));
        }
    }
}
