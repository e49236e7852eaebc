//! Static inter-entity dependency graph.
//!
//! # Responsibility
//! - Name the entities and actions that can trigger or receive cascades.
//! - Answer "which cascades must follow `(entity, action)`" by pure lookup.
//!
//! # Invariants
//! - The table is immutable and built once per process.
//! - Lookups never perform cascades; workflows do.

mod resolver;

pub use resolver::{
    dependency_edges, is_acyclic, resolve, resolve_str, Action, Cascade, DependencyEdge,
    DependencyError, EntityKind,
};
