//! Inbound port: controlling the monitor.

use crate::domain::{MonitorError, MonitorState};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Start/stop surface exposed to the service layer.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// Check connectivity and begin consuming the feed.
    ///
    /// A no-op while already starting or running. Monitoring ends when
    /// `cancel` fires or `stop()` is called.
    ///
    /// # Errors
    ///
    /// `MonitorError::NotConnected` when the peer network is still down
    /// after the retry; `MonitorError::Cancelled` when stopped while
    /// starting.
    async fn start(&self, cancel: CancellationToken) -> Result<(), MonitorError>;

    /// Stop monitoring and wait for the loop to finish. Idempotent.
    async fn stop(&self);

    /// True while starting or running.
    fn is_monitoring(&self) -> bool;

    /// Current lifecycle state.
    fn state(&self) -> MonitorState;
}
