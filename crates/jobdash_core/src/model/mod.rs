//! Domain model for the dashboard coordination core.
//!
//! # Responsibility
//! - Define the records owned by the event log and the entity store slices.
//! - Keep serialization shapes stable for persisted snapshots.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Events are immutable after creation except for the `read` flag.

pub mod application;
pub mod event;
pub mod job;
pub mod resume;
pub mod user;
