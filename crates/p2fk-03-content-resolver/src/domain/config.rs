//! Resolver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public HTTP gateway used when nothing else is configured.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

/// Endpoints and retry policy for content downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// HTTP gateways, queried as `GET {base}/ipfs/{hash}`.
    pub gateways: Vec<String>,
    /// Node HTTP APIs, queried as `POST {base}/api/v0/cat?arg={hash}`.
    pub node_apis: Vec<String>,
    /// Attempts per download.
    pub max_attempts: u32,
    /// Delay after the first failed attempt, seconds. Doubles each time.
    pub base_delay_secs: u64,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gateways: vec![DEFAULT_GATEWAY.to_string()],
            node_apis: Vec::new(),
            max_attempts: 3,
            base_delay_secs: 2,
            request_timeout_secs: 60,
        }
    }
}

impl ResolverConfig {
    /// Wait after failed attempt `attempt` (0-based): `base × 2^attempt`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_secs(self.base_delay_secs.saturating_mul(factor))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
