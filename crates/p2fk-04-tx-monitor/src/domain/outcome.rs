//! Per-transaction outcomes.

use std::fmt;

/// Why a transaction produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// No P2FK record in the outputs.
    NotP2fk,
    /// Signed by a blocked address.
    BlockedSigner,
    /// The transaction could not be fetched.
    FetchFailed,
    /// Policy lookup failed.
    StoreFailed,
}

impl SkipReason {
    /// Metric label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotP2fk => "not_p2fk",
            Self::BlockedSigner => "blocked_signer",
            Self::FetchFailed => "fetch_failed",
            Self::StoreFailed => "store_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing persisted, for the given reason.
    Skipped(SkipReason),
    /// Record decoded; counts of items persisted and items that failed.
    Indexed { items: usize, failed: usize },
}
