//! # Retrying Resolver
//!
//! Rotates through the configured endpoints, one request per attempt:
//!
//! ```text
//! attempt i → endpoint[i mod N] ──ok──→ bytes
//!                    │
//!                  fail → wait base × 2^i (unless last) → attempt i+1
//! ```

use crate::adapters::{build_http_client, HttpGatewayFetcher, NodeApiFetcher};
use crate::domain::{ContentError, ResolverConfig};
use crate::ports::{ContentFetcher, ContentResolve};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// `ContentResolve` with endpoint rotation and exponential backoff.
pub struct RetryingResolver {
    fetchers: Vec<Arc<dyn ContentFetcher>>,
    config: ResolverConfig,
}

impl RetryingResolver {
    /// Resolver over explicit fetchers. Only the retry fields of `config`
    /// are used.
    #[must_use]
    pub fn new(fetchers: Vec<Arc<dyn ContentFetcher>>, config: ResolverConfig) -> Self {
        Self { fetchers, config }
    }

    /// HTTP fetchers for every configured gateway, then every node API.
    ///
    /// # Errors
    ///
    /// `ContentError::Client` if the HTTP client cannot be built.
    pub fn from_config(config: ResolverConfig) -> Result<Self, ContentError> {
        let client = build_http_client(config.request_timeout())?;
        let mut fetchers: Vec<Arc<dyn ContentFetcher>> = Vec::new();
        for base in &config.gateways {
            fetchers.push(Arc::new(HttpGatewayFetcher::new(client.clone(), base)));
        }
        for base in &config.node_apis {
            fetchers.push(Arc::new(NodeApiFetcher::new(client.clone(), base)));
        }
        info!(
            endpoints = fetchers.len(),
            max_attempts = config.max_attempts,
            "[p2fk-03] Content resolver configured"
        );
        Ok(Self::new(fetchers, config))
    }

    /// Endpoints in rotation order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&str> {
        self.fetchers.iter().map(|f| f.endpoint()).collect()
    }
}

impl std::fmt::Debug for RetryingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingResolver")
            .field("endpoints", &self.endpoints())
            .field("max_attempts", &self.config.max_attempts)
            .finish()
    }
}

#[async_trait]
impl ContentResolve for RetryingResolver {
    async fn download(
        &self,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ContentError> {
        if self.fetchers.is_empty() {
            return Err(ContentError::NoEndpoints);
        }
        let cancelled = || ContentError::Cancelled {
            hash: hash.to_string(),
        };
        let attempts = self.config.max_attempts.max(1);
        let mut last = ContentError::NoEndpoints;

        for attempt in 0..attempts {
            let fetcher = &self.fetchers[attempt as usize % self.fetchers.len()];
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                result = fetcher.fetch(hash) => result,
            };
            match result {
                Ok(bytes) => {
                    info!(
                        hash,
                        endpoint = fetcher.endpoint(),
                        bytes = bytes.len(),
                        attempt = attempt + 1,
                        "[p2fk-03] Content downloaded"
                    );
                    return Ok(bytes);
                }
                Err(e) => {
                    warn!(
                        hash,
                        endpoint = fetcher.endpoint(),
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        error = %e,
                        "[p2fk-03] Content download attempt failed"
                    );
                    last = e;
                }
            }

            if attempt + 1 < attempts {
                let delay = self.config.delay_after(attempt);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(ContentError::Exhausted {
            hash: hash.to_string(),
            attempts,
            last: Box::new(last),
        })
    }
}
