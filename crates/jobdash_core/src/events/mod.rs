//! Append-only domain event log.
//!
//! # Responsibility
//! - Store the most recent domain events, newest first.
//! - Suppress duplicate `(type, title)` events inside the dedup window.
//! - Notify subscribers with the full sequence after every observable change.
//!
//! # Invariants
//! - Length never exceeds `EVENT_LOG_CAPACITY`; the oldest entries are evicted.
//! - Events are never removed individually.

mod event_log;

pub use self::event_log::{EventLog, SubscriptionId, DEDUP_WINDOW_MS, EVENT_LOG_CAPACITY};
