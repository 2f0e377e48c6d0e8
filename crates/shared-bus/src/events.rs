//! # Event Topics and Filters

use shared_types::MonitorEvent;

/// Event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Item-indexed events.
    Items,
    /// Monitor status changes.
    Status,
    /// All events (no filtering).
    All,
}

/// Topic of an event.
#[must_use]
pub fn topic_of(event: &MonitorEvent) -> EventTopic {
    match event {
        MonitorEvent::ItemIndexed(_) => EventTopic::Items,
        MonitorEvent::StatusChanged(_) => EventTopic::Status,
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &MonitorEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&topic_of(event))
    }
}
