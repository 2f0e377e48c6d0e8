//! # P2FK Benchmarks
//!
//! | Path | Work per iteration |
//! |------|--------------------|
//! | p2fk-01 decode | base58check per output, frame scan |
//! | p2fk-01 encode | frame, split, base58check per output |
//! | p2fk-02 cache insert | insert with periodic bulk trim |

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use p2fk_01_codec::{CarrierTransaction, P2fkCodec, P2fkEncoder, RecordDecoder};
use p2fk_02_peer_network::{PendingTxCache, Transaction};
use shared_types::{BlockMetadata, TxId};
use std::time::Duration;

fn carrier_transaction(message_len: usize) -> CarrierTransaction {
    let text = "p2fk ".repeat(message_len / 5 + 1);
    let mut encoder = P2fkEncoder::new();
    encoder
        .message(&text[..message_len])
        .expect("benchmark message is long enough");
    CarrierTransaction {
        tx_id: TxId::from_bytes([7; 32]),
        outputs: encoder.build().expect("encoder has frames"),
        signed_by: None,
        block: BlockMetadata::default(),
        total_byte_size: 250,
    }
}

// ============================================================================
// P2FK-01: Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("p2fk-01-codec");
    group.measurement_time(Duration::from_secs(5));
    let codec = P2fkCodec::new();

    for len in [16usize, 256, 4_096] {
        let tx = carrier_transaction(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("decode", len), &tx, |b, tx| {
            b.iter(|| black_box(codec.decode(tx)))
        });

        let text = "x".repeat(len);
        group.bench_with_input(BenchmarkId::new("encode", len), &text, |b, text| {
            b.iter(|| {
                let mut encoder = P2fkEncoder::new();
                encoder.message(text).expect("long enough");
                black_box(encoder.build())
            })
        });
    }
    group.finish();
}

// ============================================================================
// P2FK-02: Pending transaction cache
// ============================================================================

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

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("p2fk-02-cache");
    let count = 20_000u32;
    group.throughput(Throughput::Elements(u64::from(count)));
    group.bench_function("insert_with_trims", |b| {
        b.iter(|| {
            let mut cache = PendingTxCache::default();
            let now = Utc::now();
            for n in 0..count {
                cache.insert(cache_tx(n), now);
            }
            black_box(cache.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_codec, bench_cache);
criterion_main!(benches);
