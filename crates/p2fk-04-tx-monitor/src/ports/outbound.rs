//! Outbound ports: persistence and metrics.

use crate::domain::{SkipReason, StoreError};
use async_trait::async_trait;
use shared_types::{BlockedAddress, IndexedItem, ItemKind};
use std::path::PathBuf;

/// Where indexed items and the blocklist live.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Persist an item; returns its id.
    async fn save_indexed_item(&self, item: IndexedItem) -> Result<u64, StoreError>;

    /// Whether records signed by `address` are suppressed.
    async fn is_address_blocked(&self, address: &str) -> Result<bool, StoreError>;

    /// Add `address` to the blocklist. Returns `false` if already present.
    async fn block_address(&self, address: &str, reason: &str) -> Result<bool, StoreError>;

    /// Remove `address` from the blocklist. Returns `false` if absent.
    async fn unblock_address(&self, address: &str) -> Result<bool, StoreError>;

    /// The whole blocklist.
    async fn blocked_addresses(&self) -> Result<Vec<BlockedAddress>, StoreError>;
}

/// Where downloaded content is written.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write `bytes` under an already sanitised `file_name`; returns the
    /// local path.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError>;
}

/// Counters the monitor reports.
pub trait MonitorMetrics: Send + Sync {
    /// A transaction id went through the pipeline.
    fn transaction_processed(&self);

    /// An item was persisted.
    fn item_indexed(&self, kind: ItemKind);

    /// A transaction produced nothing.
    fn transaction_skipped(&self, reason: SkipReason);

    /// A content download was abandoned.
    fn content_failed(&self);
}

/// Metrics sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MonitorMetrics for NoopMetrics {
    fn transaction_processed(&self) {}
    fn item_indexed(&self, _kind: ItemKind) {}
    fn transaction_skipped(&self, _reason: SkipReason) {}
    fn content_failed(&self) {}
}
