//! Caller-facing error classification shared by every layer.

use std::fmt::{Display, Formatter};

/// Stable error kind surfaced to UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation target id is absent.
    NotFound,
    /// `add` targeted an existing id.
    Duplicate,
    /// A transaction rolled back.
    TransactionFailed,
    /// User-scoped mutation without an active user.
    NoUser,
    /// Persistence or serialization failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Duplicate => "DUPLICATE",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::NoUser => "NO_USER",
            Self::Internal => "INTERNAL",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
