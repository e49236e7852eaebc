//! Per-event-type notification preferences.

use crate::model::event::{EventType, DEFAULT_EVENT_TYPES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreference {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub enabled: bool,
}

/// Ordered preference rows; types without a row count as enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    rows: Vec<NotificationPreference>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            rows: DEFAULT_EVENT_TYPES
                .iter()
                .map(|kind| NotificationPreference {
                    kind: EventType::new(*kind),
                    enabled: true,
                })
                .collect(),
        }
    }
}

impl Preferences {
    /// Overlays a persisted `type -> enabled` record onto the defaults.
    pub fn from_persisted(record: BTreeMap<String, bool>) -> Self {
        let mut preferences = Self::default();
        for (kind, enabled) in record {
            preferences.set(EventType::new(kind), enabled);
        }
        preferences
    }

    pub fn to_persisted(&self) -> BTreeMap<String, bool> {
        self.rows
            .iter()
            .map(|row| (row.kind.as_str().to_string(), row.enabled))
            .collect()
    }

    pub fn is_enabled(&self, kind: &EventType) -> bool {
        self.rows
            .iter()
            .find(|row| &row.kind == kind)
            .map_or(true, |row| row.enabled)
    }

    /// Sets one row, appending it for unknown types. Returns whether it changed.
    pub fn set(&mut self, kind: EventType, enabled: bool) -> bool {
        match self.rows.iter_mut().find(|row| row.kind == kind) {
            Some(row) if row.enabled == enabled => false,
            Some(row) => {
                row.enabled = enabled;
                true
            }
            None => {
                self.rows.push(NotificationPreference { kind, enabled });
                true
            }
        }
    }

    pub fn rows(&self) -> &[NotificationPreference] {
        &self.rows
    }
}
