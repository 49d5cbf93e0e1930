//! Named events - payloads that carry their own event name
//!
//! Dispatching a [`NamedEvent`] routes it by the name it reports, so callers
//! do not repeat the name next to the payload.

use serde::{Deserialize, Serialize};

/// A payload that knows which event name it is dispatched under
pub trait NamedEvent {
    /// The event name listeners are registered under
    fn event_name(&self) -> &str;
}

/// Basic event value: a name plus an optional target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<T = ()> {
    /// Event name
    pub name: String,
    /// Object the event is about, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<T>,
}

impl<T> Event<T> {
    /// Create an event without a target
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }

    /// Attach a target
    #[must_use]
    pub fn with_target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }
}

impl<T> NamedEvent for Event<T> {
    fn event_name(&self) -> &str {
        &self.name
    }
}

impl NamedEvent for String {
    fn event_name(&self) -> &str {
        self
    }
}

impl NamedEvent for &str {
    fn event_name(&self) -> &str {
        self
    }
}
