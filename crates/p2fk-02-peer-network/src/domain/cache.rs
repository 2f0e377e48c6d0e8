//! # Pending Transaction Cache
//!
//! Seen-set plus an insertion-ordered list of full transactions.
//!
//! The list is bounded by a periodic bulk trim: once it holds more than
//! `max_transactions` entries, the oldest `cleanup_batch` are dropped in one
//! pass. The seen-set is never trimmed, so a transaction evicted from the
//! list is not fetched again.
//!
//! The owner wraps the cache in a single mutex; every method here assumes
//! exclusive access for its duration.

use super::transaction::Transaction;
use chrono::{DateTime, Utc};
use shared_types::TxId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default high-water mark.
pub const MAX_MEMPOOL_TRANSACTIONS: usize = 10_000;

/// Default number of entries dropped per trim.
pub const MEMPOOL_CLEANUP_THRESHOLD: usize = 5_000;

/// A cached transaction with the time it was first observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTransaction {
    pub tx: Transaction,
    pub first_seen: DateTime<Utc>,
}

/// How a feed tracks what it has already delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCursor {
    /// Index into the current list. After a trim the index overshoots and
    /// entries that slid under it are never delivered.
    Position(usize),
    /// Absolute insertion sequence; survives trims.
    Sequence(u64),
}

/// The shared cache.
#[derive(Debug)]
pub struct PendingTxCache {
    seen: HashSet<TxId>,
    order: Vec<TxId>,
    entries: HashMap<TxId, Arc<CachedTransaction>>,
    /// Entries dropped by trims since creation.
    evicted: u64,
    max_transactions: usize,
    cleanup_batch: usize,
}

impl Default for PendingTxCache {
    fn default() -> Self {
        Self::new(MAX_MEMPOOL_TRANSACTIONS, MEMPOOL_CLEANUP_THRESHOLD)
    }
}

impl PendingTxCache {
    /// Cache with explicit bounds.
    #[must_use]
    pub fn new(max_transactions: usize, cleanup_batch: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: Vec::new(),
            entries: HashMap::new(),
            evicted: 0,
            max_transactions,
            cleanup_batch: cleanup_batch.max(1),
        }
    }

    /// Insert a transaction. Returns `false` if its id was already seen.
    pub fn insert(&mut self, tx: Transaction, now: DateTime<Utc>) -> bool {
        let id = tx.txid;
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push(id);
        self.entries.insert(
            id,
            Arc::new(CachedTransaction {
                tx,
                first_seen: now,
            }),
        );
        if self.order.len() > self.max_transactions {
            self.trim();
        }
        true
    }

    fn trim(&mut self) {
        let n = self.cleanup_batch.min(self.order.len());
        for id in self.order.drain(..n) {
            self.entries.remove(&id);
        }
        self.evicted += n as u64;
    }

    /// Ids from `ids` that have never been seen.
    #[must_use]
    pub fn filter_unseen(&self, ids: &[TxId]) -> Vec<TxId> {
        let mut out: Vec<TxId> = Vec::new();
        for id in ids {
            if !self.seen.contains(id) && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// Whether an id has ever been seen.
    #[must_use]
    pub fn has_seen(&self, id: &TxId) -> bool {
        self.seen.contains(id)
    }

    /// Cached transaction by id.
    #[must_use]
    pub fn get(&self, id: &TxId) -> Option<Arc<CachedTransaction>> {
        self.entries.get(id).cloned()
    }

    /// Number of cached transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshot of every id ever seen.
    #[must_use]
    pub fn seen_ids(&self) -> Vec<TxId> {
        self.seen.iter().copied().collect()
    }

    /// Cached ids in insertion order.
    #[must_use]
    pub fn cached_ids(&self) -> Vec<TxId> {
        self.order.clone()
    }

    /// A cursor that will deliver everything currently cached.
    #[must_use]
    pub fn start_cursor(&self, sequenced: bool) -> FeedCursor {
        if sequenced {
            FeedCursor::Sequence(self.evicted)
        } else {
            FeedCursor::Position(0)
        }
    }

    /// Ids not yet delivered through `cursor`, and the advanced cursor.
    #[must_use]
    pub fn read_from(&self, cursor: FeedCursor) -> (Vec<TxId>, FeedCursor) {
        match cursor {
            FeedCursor::Position(pos) => {
                let ids = self.order.get(pos..).map(<[TxId]>::to_vec).unwrap_or_default();
                (ids, FeedCursor::Position(self.order.len()))
            }
            FeedCursor::Sequence(seq) => {
                let start = seq.saturating_sub(self.evicted) as usize;
                let ids = self.order.get(start..).map(<[TxId]>::to_vec).unwrap_or_default();
                (
                    ids,
                    FeedCursor::Sequence(self.evicted + self.order.len() as u64),
                )
            }
        }
    }
}
