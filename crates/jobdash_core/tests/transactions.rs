use jobdash_core::tx::{Operation, OperationResult, TransactionFailure};
use jobdash_core::{ErrorKind, Step, Transaction, TransactionError, TransactionState};

/// Test context: every run and compensation is appended in order.
#[derive(Default)]
struct Journal {
    entries: Vec<String>,
}

fn record_run(journal: &mut Journal, label: &mut &'static str) -> OperationResult {
    journal.entries.push(format!("run:{label}"));
    Ok(())
}

fn record_undo(journal: &mut Journal, label: &mut &'static str) -> OperationResult {
    journal.entries.push(format!("undo:{label}"));
    Ok(())
}

fn fail_run(journal: &mut Journal, label: &mut &'static str) -> OperationResult {
    journal.entries.push(format!("fail:{label}"));
    Err(format!("{label} rejected").into())
}

fn fail_undo(journal: &mut Journal, label: &mut &'static str) -> OperationResult {
    journal.entries.push(format!("undo-fail:{label}"));
    Err("compensation rejected".into())
}

#[test]
fn failing_middle_operation_compensates_prior_and_skips_rest() {
    let mut tx = Transaction::new("three-steps");
    tx.add_operation(Step::new("op1", "op1", record_run, record_undo))
        .unwrap();
    tx.add_operation(Step::new("op2", "op2", fail_run, record_undo))
        .unwrap();
    tx.add_operation(Step::new("op3", "op3", record_run, record_undo))
        .unwrap();

    let mut journal = Journal::default();
    assert_eq!(tx.execute(&mut journal), Ok(false));
    assert_eq!(journal.entries, vec!["run:op1", "fail:op2", "undo:op1"]);
    assert_eq!(tx.state(), TransactionState::RolledBack);
    assert_eq!(
        tx.failure(),
        Some(&TransactionFailure {
            step: "op2".to_string(),
            step_index: 1,
            cause: "op2 rejected".to_string(),
            compensation_errors: 0,
        })
    );

    let err = tx.execute(&mut journal).unwrap_err();
    assert!(matches!(
        err,
        TransactionError::NotOpen {
            state: TransactionState::RolledBack,
            ..
        }
    ));
    assert_eq!(journal.entries.len(), 3);
}

#[test]
fn successful_transaction_commits_once() {
    let mut tx = Transaction::new("commit");
    tx.add_operation(Step::new("a", "a", record_run, record_undo))
        .unwrap();
    tx.add_operation(Step::new("b", "b", record_run, record_undo))
        .unwrap();
    assert_eq!(tx.len(), 2);

    let mut journal = Journal::default();
    assert_eq!(tx.execute(&mut journal), Ok(true));
    assert_eq!(journal.entries, vec!["run:a", "run:b"]);
    assert_eq!(tx.state(), TransactionState::Committed);

    assert!(tx.execute(&mut journal).is_err());
    let late = tx.add_operation(Step::new("c", "c", record_run, record_undo));
    assert!(matches!(late, Err(TransactionError::NotOpen { .. })));
    assert_eq!(journal.entries.len(), 2);
}

#[test]
fn compensation_failure_does_not_stop_remaining_compensations() {
    let mut tx = Transaction::new("stubborn");
    tx.add_operation(Step::new("a", "a", record_run, record_undo))
        .unwrap();
    tx.add_operation(Step::new("b", "b", record_run, fail_undo))
        .unwrap();
    tx.add_operation(Step::new("c", "c", fail_run, record_undo))
        .unwrap();

    let mut journal = Journal::default();
    assert_eq!(tx.execute(&mut journal), Ok(false));
    assert_eq!(
        journal.entries,
        vec!["run:a", "run:b", "fail:c", "undo-fail:b", "undo:a"]
    );
    assert_eq!(tx.failure().map(|f| f.compensation_errors), Some(1));
}

#[test]
fn failed_transaction_maps_to_transaction_failed_kind() {
    let mut tx = Transaction::new("wrapped");
    tx.add_operation(Step::new("only", "only", fail_run, record_undo))
        .unwrap();

    let mut journal = Journal::default();
    let err = jobdash_core::run_transaction(&mut tx, &mut journal).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionFailed);
    assert_eq!(err.kind().as_str(), "TRANSACTION_FAILED");
    assert!(err.to_string().contains("only"));
}

/// Hand-written operation that records its own state for compensation.
struct Counter {
    applied: bool,
}

impl Operation<i64> for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn run(&mut self, ctx: &mut i64) -> OperationResult {
        *ctx += 10;
        self.applied = true;
        Ok(())
    }

    fn compensate(&mut self, ctx: &mut i64) -> OperationResult {
        if self.applied {
            *ctx -= 10;
        }
        Ok(())
    }
}

fn reject(_: &mut i64, _: &mut ()) -> OperationResult {
    Err("no".into())
}

fn noop(_: &mut i64, _: &mut ()) -> OperationResult {
    Ok(())
}

#[test]
fn custom_operations_mix_with_steps() {
    let mut tx = Transaction::new("mixed");
    tx.add_operation(Counter { applied: false }).unwrap();
    tx.add_operation(Step::new("reject", (), reject, noop))
        .unwrap();

    let mut total = 5_i64;
    assert_eq!(tx.execute(&mut total), Ok(false));
    assert_eq!(total, 5);
}
