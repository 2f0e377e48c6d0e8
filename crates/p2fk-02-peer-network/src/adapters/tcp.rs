//! TCP dialer with DNS seed resolution.

use crate::domain::PeerNetworkError;
use crate::ports::{BoxedPeerStream, Dialer};
use async_trait::async_trait;
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

/// Dials peers over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn resolve(&self, seed: &str) -> Result<Vec<String>, PeerNetworkError> {
        let addrs: Vec<String> = lookup_host(seed)
            .await
            .map_err(|e| PeerNetworkError::ConnectFailed {
                addr: seed.to_string(),
                reason: e.to_string(),
            })?
            .map(|a| a.to_string())
            .collect();
        debug!(seed, resolved = addrs.len(), "[p2fk-02] Seed resolved");
        Ok(addrs)
    }

    async fn dial(&self, addr: &str) -> Result<BoxedPeerStream, PeerNetworkError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| PeerNetworkError::ConnectFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;
        // Small control messages; don't batch them
        let _ = stream.set_nodelay(true);
        Ok(Box::new(stream))
    }
}
