//! Monitor lifecycle.
//!
//! ```text
//! Idle ──start──→ Starting ──connected──→ Running ──stop──→ Stopping ──→ Idle
//!                    │                       │
//!                    └──not connected──→ Idle└──feed lost──→ Faulted ──→ Idle
//! ```

use std::fmt;

/// Where the monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonitorState {
    #[default]
    Idle,
    /// Checking connectivity.
    Starting,
    /// Consuming the feed.
    Running,
    /// `stop()` in progress.
    Stopping,
    /// The feed ended on its own.
    Faulted,
}

impl MonitorState {
    /// Whether a transition to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use MonitorState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Running | Stopping | Idle)
                | (Running, Stopping | Faulted | Idle)
                | (Stopping, Idle)
                | (Faulted, Idle)
        )
    }

    /// Starting or running.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}
