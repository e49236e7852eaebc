//! Domain event model.
//!
//! # Responsibility
//! - Define the event record appended by every store mutation.
//! - Define the caller-side input shape used to append events.
//!
//! # Invariants
//! - `id` is assigned by the event log and never reused.
//! - Only `read` may change after an event is stored.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one stored event.
pub type EventId = Uuid;

/// Event type used by resume slice mutations.
pub const RESUME_EVENT: &str = "resume";
/// Event type used by job slice mutations.
pub const JOB_EVENT: &str = "job";
/// Event type used by application slice mutations.
pub const APPLICATION_EVENT: &str = "application";
/// Event type used by user slice mutations.
pub const USER_EVENT: &str = "user";
/// Event type used by everything else (score cache, diagnostics).
pub const SYSTEM_EVENT: &str = "system";

/// Event types that get a preference row by default.
pub const DEFAULT_EVENT_TYPES: &[&str] = &[
    RESUME_EVENT,
    JOB_EVENT,
    APPLICATION_EVENT,
    USER_EVENT,
    SYSTEM_EVENT,
];

/// Free-form event category, e.g. `job` or `job_added`.
///
/// Preferences and grouping match on exact equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Caller-provided part of an event; the log fills in id, timestamp and read.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub kind: EventType,
    pub title: String,
    pub description: String,
    pub data: Option<serde_json::Value>,
}

impl EventInput {
    pub fn new(kind: impl Into<EventType>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            description: String::new(),
            data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Stored domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Serialized as `type` to match the persisted snapshot layout.
    #[serde(rename = "type")]
    pub kind: EventType,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub read: bool,
}

impl Event {
    pub(crate) fn from_input(input: EventInput, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            title: input.title,
            description: input.description,
            timestamp,
            data: input.data,
            read: false,
        }
    }

    /// Returns whether `other` would collide with this event under dedup rules.
    pub fn same_subject(&self, kind: &EventType, title: &str) -> bool {
        &self.kind == kind && self.title == title
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventInput, JOB_EVENT};

    #[test]
    fn event_serializes_kind_as_type() {
        let event = Event::from_input(EventInput::new(JOB_EVENT, "Job added"), 42);
        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["type"], "job");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["read"], false);
        assert!(json.get("data").is_none());
    }
}
