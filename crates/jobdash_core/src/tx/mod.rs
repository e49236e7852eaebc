//! Transaction coordinator with compensating rollback.
//!
//! # Responsibility
//! - Run registered operations strictly in registration order.
//! - On the first failure, compensate every operation that already ran, in
//!   reverse order, then report failure.
//!
//! # Invariants
//! - A transaction executes at most once; terminal states are final.
//! - Compensation failures are logged and never stop later compensations.

mod transaction;

pub use transaction::{
    run_transaction, Operation, OperationError, OperationResult, Step, Transaction,
    TransactionError, TransactionFailure, TransactionState,
};
