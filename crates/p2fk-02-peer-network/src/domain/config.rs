//! Peer network configuration.

use super::cache::{MAX_MEMPOOL_TRANSACTIONS, MEMPOOL_CLEANUP_THRESHOLD};
use super::chain::Chain;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capped exponential backoff for connect cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per connect cycle.
    pub max_attempts: u32,
    /// Base delay in seconds.
    pub base_delay_secs: u64,
    /// Growth factor per attempt.
    pub multiplier: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 2,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `base × multiplier^attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        Duration::from_secs(self.base_delay_secs.saturating_mul(factor))
    }
}

/// Which feed cursor to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCursorMode {
    /// Position counter into the trimmed list; may skip ids after a trim.
    #[default]
    Positional,
    /// Absolute sequence numbers; never skips ids that are still cached.
    Sequenced,
}

/// Configuration for the direct P2P client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerNetworkConfig {
    /// Network to join.
    pub chain: Chain,
    /// Explicit `host:port` targets; the chain's DNS seeds when empty.
    pub seeds: Vec<String>,
    /// Outbound peers to aim for.
    pub target_peers: usize,
    /// Per-peer connect and handshake timeout, seconds.
    pub connect_timeout_secs: u64,
    /// Wait after dialing before counting peers, seconds.
    pub settle_delay_secs: u64,
    /// Wait for a requested transaction, milliseconds.
    pub fetch_timeout_ms: u64,
    /// Feed polling interval, milliseconds.
    pub feed_poll_interval_ms: u64,
    /// Cache high-water mark.
    pub max_mempool_transactions: usize,
    /// Entries dropped per trim.
    pub mempool_cleanup_threshold: usize,
    /// Feed cursor behaviour.
    pub feed_cursor: FeedCursorMode,
    /// Capacity of the peer event channel.
    pub event_channel_capacity: usize,
    /// Connect retry policy.
    pub retry: RetryPolicy,
}

impl Default for PeerNetworkConfig {
    fn default() -> Self {
        Self {
            chain: Chain::Testnet,
            seeds: Vec::new(),
            target_peers: 8,
            connect_timeout_secs: 30,
            settle_delay_secs: 5,
            fetch_timeout_ms: 2_000,
            feed_poll_interval_ms: 5_000,
            max_mempool_transactions: MAX_MEMPOOL_TRANSACTIONS,
            mempool_cleanup_threshold: MEMPOOL_CLEANUP_THRESHOLD,
            feed_cursor: FeedCursorMode::Positional,
            event_channel_capacity: 1_024,
            retry: RetryPolicy::default(),
        }
    }
}

impl PeerNetworkConfig {
    /// Dial targets: explicit seeds, else the chain's DNS seeds.
    #[must_use]
    pub fn dial_targets(&self) -> Vec<String> {
        if self.seeds.is_empty() {
            self.chain.params().seed_targets()
        } else {
            self.seeds.clone()
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    #[must_use]
    pub fn feed_poll_interval(&self) -> Duration {
        Duration::from_millis(self.feed_poll_interval_ms)
    }
}
