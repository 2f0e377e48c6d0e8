//! HTTP content fetchers.
//!
//! | Fetcher | Request |
//! |---------|---------|
//! | `HttpGatewayFetcher` | `GET {base}/ipfs/{hash}` |
//! | `NodeApiFetcher` | `POST {base}/api/v0/cat?arg={hash}` |

use crate::domain::ContentError;
use crate::ports::ContentFetcher;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Shared client with the per-request timeout applied.
///
/// # Errors
///
/// `ContentError::Client` if TLS setup fails.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ContentError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ContentError::Client(e.to_string()))
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Turn a response into bytes, rejecting failures and empty bodies.
async fn read_body(endpoint: &str, response: reqwest::Response) -> Result<Vec<u8>, ContentError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ContentError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| ContentError::Transport {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    if body.is_empty() {
        return Err(ContentError::EmptyBody {
            endpoint: endpoint.to_string(),
        });
    }
    debug!(endpoint, bytes = body.len(), "[p2fk-03] Content fetched");
    Ok(body.to_vec())
}

fn transport(endpoint: &str, e: &reqwest::Error) -> ContentError {
    ContentError::Transport {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

/// Public or private HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpGatewayFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpGatewayFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: trim_base(base),
        }
    }

    /// URL for `hash`.
    #[must_use]
    pub fn url_for(&self, hash: &str) -> String {
        format!("{}/ipfs/{hash}", self.base)
    }
}

#[async_trait]
impl ContentFetcher for HttpGatewayFetcher {
    fn endpoint(&self) -> &str {
        &self.base
    }

    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        let response = self
            .client
            .get(self.url_for(hash))
            .send()
            .await
            .map_err(|e| transport(&self.base, &e))?;
        read_body(&self.base, response).await
    }
}

/// A content node's HTTP API.
#[derive(Debug, Clone)]
pub struct NodeApiFetcher {
    client: reqwest::Client,
    base: String,
}

impl NodeApiFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base: trim_base(base),
        }
    }

    /// URL for `hash`.
    #[must_use]
    pub fn url_for(&self, hash: &str) -> String {
        format!("{}/api/v0/cat?arg={hash}", self.base)
    }
}

#[async_trait]
impl ContentFetcher for NodeApiFetcher {
    fn endpoint(&self) -> &str {
        &self.base
    }

    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        let response = self
            .client
            .post(self.url_for(hash))
            .send()
            .await
            .map_err(|e| transport(&self.base, &e))?;
        read_body(&self.base, response).await
    }
}
