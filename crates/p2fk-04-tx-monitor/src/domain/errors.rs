//! Monitor error types.

use p2fk_02_peer_network::PeerNetworkError;
use p2fk_03_content_resolver::ContentError;
use thiserror::Error;

/// Errors from the index or content store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("i/o error at {path}: {reason}")]
    Io { path: String, reason: String },

    /// Any other backend failure.
    #[error("store backend: {0}")]
    Backend(String),
}

/// Errors surfaced by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// Still not connected after the retry.
    #[error("peer network not connected")]
    NotConnected,

    /// Transaction lookup failed.
    #[error(transparent)]
    Network(#[from] PeerNetworkError),

    /// Persisting failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Content download failed.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Monitoring was cancelled.
    #[error("monitoring cancelled")]
    Cancelled,
}
