//! Monitor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Wait before the second connectivity check, seconds.
    pub connection_check_delay_secs: u64,
    /// Characters of a message kept in its event summary.
    pub summary_chars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            connection_check_delay_secs: 5,
            summary_chars: 50,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn connection_check_delay(&self) -> Duration {
        Duration::from_secs(self.connection_check_delay_secs)
    }
}
