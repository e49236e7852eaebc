//! Transaction state machine and operation records.

use crate::error::ErrorKind;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cause reported by a failing operation or compensation.
pub type OperationError = Box<dyn Error>;
pub type OperationResult = Result<(), OperationError>;

/// One transaction step: a forward action and its inverse.
pub trait Operation<C> {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &mut C) -> OperationResult;
    fn compensate(&mut self, ctx: &mut C) -> OperationResult;
}

/// Operation built from two plain functions and an explicit captured value.
///
/// The captured value usually carries the pre-image needed by `compensate`;
/// `run` may also record data into it for the compensation to use.
pub struct Step<C, S> {
    name: String,
    state: S,
    run: fn(&mut C, &mut S) -> OperationResult,
    compensate: fn(&mut C, &mut S) -> OperationResult,
}

impl<C, S> Step<C, S> {
    pub fn new(
        name: impl Into<String>,
        state: S,
        run: fn(&mut C, &mut S) -> OperationResult,
        compensate: fn(&mut C, &mut S) -> OperationResult,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            run,
            compensate,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<C, S> Operation<C> for Step<C, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut C) -> OperationResult {
        (self.run)(ctx, &mut self.state)
    }

    fn compensate(&mut self, ctx: &mut C) -> OperationResult {
        (self.compensate)(ctx, &mut self.state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

impl TransactionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Open
    }
}

/// Diagnostic record of why a transaction rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFailure {
    pub step: String,
    pub step_index: usize,
    pub cause: String,
    pub compensation_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Registration or execution attempted on a terminal transaction.
    NotOpen {
        transaction: String,
        state: TransactionState,
    },
    /// The transaction rolled back; the original cause is only logged.
    Failed { transaction: String, step: String },
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOpen { .. } => ErrorKind::Internal,
            Self::Failed { .. } => ErrorKind::TransactionFailed,
        }
    }
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOpen { transaction, state } => write!(
                f,
                "transaction `{transaction}` is {} and cannot be reused",
                state.as_str()
            ),
            Self::Failed { transaction, step } => {
                write!(f, "transaction `{transaction}` failed at step `{step}`")
            }
        }
    }
}

impl Error for TransactionError {}

/// Ordered list of operations executed once against a context `C`.
pub struct Transaction<C> {
    name: String,
    state: TransactionState,
    operations: Vec<Box<dyn Operation<C>>>,
    failure: Option<TransactionFailure>,
}

impl<C> Transaction<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TransactionState::Open,
            operations: Vec::new(),
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of registered operations still held by the transaction.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn failure(&self) -> Option<&TransactionFailure> {
        self.failure.as_ref()
    }

    /// Appends one operation. Fails once the transaction left `Open`.
    pub fn add_operation(
        &mut self,
        operation: impl Operation<C> + 'static,
    ) -> Result<(), TransactionError> {
        self.add_boxed(Box::new(operation))
    }

    pub fn add_boxed(
        &mut self,
        operation: Box<dyn Operation<C>>,
    ) -> Result<(), TransactionError> {
        self.ensure_open()?;
        self.operations.push(operation);
        Ok(())
    }

    /// Runs every operation in order.
    ///
    /// Returns `Ok(true)` on commit and `Ok(false)` after a rollback. Calling
    /// this on a terminal transaction returns `TransactionError::NotOpen`.
    pub fn execute(&mut self, ctx: &mut C) -> Result<bool, TransactionError> {
        self.ensure_open()?;
        info!(
            "event=tx_execute module=tx status=start name={} operations={}",
            self.name,
            self.operations.len()
        );

        let mut operations = std::mem::take(&mut self.operations);
        let mut failed_at = None;
        for (index, operation) in operations.iter_mut().enumerate() {
            if let Err(err) = operation.run(ctx) {
                error!(
                    "event=tx_operation module=tx status=error name={} step={} index={} error={}",
                    self.name,
                    operation.name(),
                    index,
                    err
                );
                failed_at = Some((index, operation.name().to_string(), err.to_string()));
                break;
            }
        }

        let Some((step_index, step, cause)) = failed_at else {
            self.state = TransactionState::Committed;
            info!(
                "event=tx_execute module=tx status=ok name={} outcome=committed",
                self.name
            );
            return Ok(true);
        };

        let mut compensation_errors = 0;
        for operation in operations[..step_index].iter_mut().rev() {
            if let Err(err) = operation.compensate(ctx) {
                compensation_errors += 1;
                warn!(
                    "event=tx_compensate module=tx status=error name={} step={} error={}",
                    self.name,
                    operation.name(),
                    err
                );
            }
        }

        self.state = TransactionState::RolledBack;
        self.failure = Some(TransactionFailure {
            step,
            step_index,
            cause,
            compensation_errors,
        });
        info!(
            "event=tx_execute module=tx status=error name={} outcome=rolled_back compensated={} compensation_errors={}",
            self.name, step_index, compensation_errors
        );
        Ok(false)
    }

    fn ensure_open(&self) -> Result<(), TransactionError> {
        if self.state.is_terminal() {
            return Err(TransactionError::NotOpen {
                transaction: self.name.clone(),
                state: self.state,
            });
        }
        Ok(())
    }
}

/// Executes `tx` and converts a rollback into `TransactionError::Failed`.
pub fn run_transaction<C>(tx: &mut Transaction<C>, ctx: &mut C) -> Result<(), TransactionError> {
    if tx.execute(ctx)? {
        return Ok(());
    }
    let step = tx
        .failure()
        .map(|failure| failure.step.clone())
        .unwrap_or_default();
    Err(TransactionError::Failed {
        transaction: tx.name().to_string(),
        step,
    })
}

#[cfg(test)]
mod tests {
    use super::{run_transaction, OperationResult, Step, Transaction, TransactionError};

    fn push(log: &mut Vec<String>, value: &mut &'static str) -> OperationResult {
        log.push(format!("run:{value}"));
        Ok(())
    }

    fn pop(log: &mut Vec<String>, value: &mut &'static str) -> OperationResult {
        log.push(format!("undo:{value}"));
        Ok(())
    }

    fn fail(_: &mut Vec<String>, _: &mut &'static str) -> OperationResult {
        Err("boom".into())
    }

    #[test]
    fn empty_transaction_commits() {
        let mut tx: Transaction<Vec<String>> = Transaction::new("empty");
        let mut ctx = Vec::new();
        assert_eq!(tx.execute(&mut ctx), Ok(true));
        assert!(ctx.is_empty());
    }

    #[test]
    fn wrapper_reports_failed_step_not_cause() {
        let mut tx = Transaction::new("wrapped");
        tx.add_operation(Step::new("first", "a", push, pop))
            .expect("open transaction accepts operations");
        tx.add_operation(Step::new("second", "b", fail, pop))
            .expect("open transaction accepts operations");

        let mut ctx = Vec::new();
        let err = run_transaction(&mut tx, &mut ctx).expect_err("must fail");
        assert_eq!(
            err,
            TransactionError::Failed {
                transaction: "wrapped".to_string(),
                step: "second".to_string(),
            }
        );
        assert!(!err.to_string().contains("boom"));
        assert_eq!(ctx, vec!["run:a".to_string(), "undo:a".to_string()]);
        assert_eq!(tx.failure().map(|f| f.cause.as_str()), Some("boom"));
    }
}
