//! # Monitor Events
//!
//! Events published by the transaction monitor for the service/UI layer.

use crate::entities::{ItemKind, TxId};
use serde::{Deserialize, Serialize};

/// Emitted once per persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemIndexed {
    /// Source transaction.
    pub tx_id: TxId,
    /// Record kind.
    pub kind: ItemKind,
    /// Short human-readable summary.
    pub summary: String,
}

/// Emitted on monitor lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    /// Whether the monitor is consuming the feed.
    pub active: bool,
    /// Status text.
    pub message: String,
}

/// All events carried on the shared bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A record was persisted.
    ItemIndexed(ItemIndexed),
    /// The monitor changed state.
    StatusChanged(StatusChanged),
}

impl MonitorEvent {
    /// Build an item-indexed event.
    #[must_use]
    pub fn item_indexed(tx_id: TxId, kind: ItemKind, summary: impl Into<String>) -> Self {
        Self::ItemIndexed(ItemIndexed {
            tx_id,
            kind,
            summary: summary.into(),
        })
    }

    /// Build a status event.
    #[must_use]
    pub fn status(active: bool, message: impl Into<String>) -> Self {
        Self::StatusChanged(StatusChanged {
            active,
            message: message.into(),
        })
    }
}
