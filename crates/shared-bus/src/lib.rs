//! # Shared Bus - Monitor Event Distribution
//!
//! Carries `MonitorEvent`s from the transaction monitor to any number of
//! in-process consumers (the node runtime's log sink, a UI layer, tests).
//!
//! ```text
//! ┌────────────────────┐   publish()   ┌──────────────┐  subscribe()  ┌────────────┐
//! │ Transaction Monitor│ ────────────→ │  Event Bus   │ ────────────→ │ Consumers  │
//! └────────────────────┘               └──────────────┘               └────────────┘
//! ```
//!
//! Delivery is best-effort: a subscriber that falls more than the channel
//! capacity behind loses the oldest events and is told how many it skipped
//! through a debug log.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
