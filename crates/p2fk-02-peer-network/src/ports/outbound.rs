//! Outbound port: opening connections to peers.

use crate::domain::PeerNetworkError;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream to one peer.
pub trait PeerStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + 'static> PeerStream for T {}

/// Boxed peer stream.
pub type BoxedPeerStream = Box<dyn PeerStream>;

/// Resolves seeds and opens streams.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Expand a seed (`host:port`) into concrete dial targets.
    async fn resolve(&self, seed: &str) -> Result<Vec<String>, PeerNetworkError>;

    /// Open a stream to one target.
    async fn dial(&self, addr: &str) -> Result<BoxedPeerStream, PeerNetworkError>;
}
