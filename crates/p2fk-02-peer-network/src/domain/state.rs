//! Connection state machine.
//!
//! ```text
//! Disconnected ──→ Connecting ──→ Connected ⇄ Degraded (0 peers)
//!      ↑               │                          │
//!      └── retries ────┘            Connecting ←──┘
//!
//! any state ──dispose──→ Disposed
//! ```

use std::fmt;

/// Where the client is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No peers and no connect cycle running.
    Disconnected,
    /// A connect cycle is dialing peers.
    Connecting,
    /// At least one peer is connected.
    Connected,
    /// All peers dropped; a reconnect cycle has been requested.
    Degraded,
    /// Shut down for good.
    Disposed,
}

impl ConnectionState {
    /// Whether a transition to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Disposed, _) => false,
            (_, Disposed) => true,
            (a, b) if a == b => true,
            (Disconnected | Degraded, Connecting) => true,
            (Connecting, Connected | Disconnected) => true,
            // Peers that finish their handshake late still count
            (Disconnected | Degraded, Connected) => true,
            (Connected, Degraded) => true,
            (Connecting, Degraded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
            Self::Disposed => "disposed",
        };
        f.write_str(s)
    }
}
