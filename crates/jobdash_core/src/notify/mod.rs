//! Debounced, preference-filtered notification views over the event log.
//!
//! # Responsibility
//! - Turn bursts of event log changes into one recomputation per debounce
//!   window.
//! - Derive the filtered list, unread count and per-type groups for the UI.
//! - Persist preferences and the filtered snapshot.
//!
//! # Invariants
//! - Never blocks or fails the mutation path; persistence errors are logged.
//! - A recomputation never starts while another one is in flight.
//! - Read-state changes flow through the event log only.

mod coordinator;
mod debounce;
mod preferences;

pub use coordinator::{
    NotificationCoordinator, NotificationView, DEBOUNCE_WINDOW_MS, NOTIFICATIONS_KEY,
    PREFERENCES_KEY,
};
pub use debounce::DebounceTimer;
pub use preferences::{NotificationPreference, Preferences};
