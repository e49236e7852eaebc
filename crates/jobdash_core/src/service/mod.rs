//! Cross-slice workflows.
//!
//! # Responsibility
//! - Turn one caller intent into a transaction: the primary mutation, the
//!   cascades the dependency table declares, and an optional checkpoint.
//! - Map slice and transaction failures onto caller-facing error kinds.
//!
//! # Invariants
//! - Missing targets are reported before any transaction is built.
//! - A rolled-back workflow leaves every slice equal to its pre-image.

pub mod career_service;
mod cascade;
pub mod matching;

use crate::deps::Cascade;
use crate::error::ErrorKind;
use crate::store::StoreError;
use crate::tx::TransactionError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug)]
pub enum WorkflowError {
    /// Synchronous validation failure (`NOT_FOUND`, `DUPLICATE`, `NO_USER`).
    Store(StoreError),
    /// The transaction rolled back or was reused.
    Transaction(TransactionError),
    /// The dependency table names a cascade no workflow can apply.
    UnsupportedCascade { source: Cascade, cascade: Cascade },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::Transaction(err) => err.kind(),
            Self::UnsupportedCascade { .. } => ErrorKind::Internal,
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Transaction(err) => write!(f, "{err}"),
            Self::UnsupportedCascade { source, cascade } => {
                write!(f, "no workflow step for cascade `{cascade}` of `{source}`")
            }
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Transaction(err) => Some(err),
            Self::UnsupportedCascade { .. } => None,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TransactionError> for WorkflowError {
    fn from(value: TransactionError) -> Self {
        Self::Transaction(value)
    }
}
