//! Persistence collaborators.
//!
//! # Responsibility
//! - Define the key/value state store contract used by the entity store and
//!   the notification coordinator.
//! - Isolate SQLite details from slices and workflows.
//!
//! # Invariants
//! - Stored values are JSON documents addressed by stable keys.

pub mod state_repo;
