//! Ports for the content resolver.
//!
//! - `ContentFetcher` (outbound): one endpoint, one attempt
//! - `ContentResolve` (inbound): what the monitor calls, retries included

use crate::domain::ContentError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A single content endpoint.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Where requests go; used in logs and errors.
    fn endpoint(&self) -> &str;

    /// Fetch the bytes behind `hash` with one request.
    async fn fetch(&self, hash: &str) -> Result<Vec<u8>, ContentError>;
}

/// Resolve a content id to bytes.
#[async_trait]
pub trait ContentResolve: Send + Sync {
    /// Download `hash`, giving up early if `cancel` fires.
    ///
    /// # Errors
    ///
    /// `ContentError::Exhausted` after the last failed attempt,
    /// `ContentError::Cancelled` on cancellation.
    async fn download(&self, hash: &str, cancel: &CancellationToken)
        -> Result<Vec<u8>, ContentError>;
}
