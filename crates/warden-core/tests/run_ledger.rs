// crates/warden-core/tests/run_ledger.rs
// ============================================================================
// Module: Run Ledger Tests
// Description: Event lifecycle, sealing, and the evaluator pipeline.
// ============================================================================
//! ## Overview
//! Ensures run events seal exactly once with a canonical content hash and
//! that registered evaluators run as pure functions whose results are stored
//! beside the event without mutating it.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use warden_core::RunLedger;
use warden_core::SessionId;
use warden_core::TaskId;
use warden_core::Violation;
use warden_core::runtime::DurationThresholdEvaluator;
use warden_core::runtime::RunLedgerError;
use warden_core::runtime::ViolationCountEvaluator;

fn ledger_with_evaluators() -> RunLedger {
    let mut ledger = RunLedger::new();
    ledger.register_evaluator(Box::new(ViolationCountEvaluator {
        max_violations: 1,
    }));
    ledger.register_evaluator(Box::new(DurationThresholdEvaluator {
        max_duration_ms: 1_000,
    }));
    ledger
}

#[test]
fn created_events_start_mutable_and_empty() {
    let ledger = RunLedger::new();
    let event = ledger.create_event(
        TaskId::new("task-1"),
        "catalog facts",
        "a".repeat(64),
        SessionId::new("session-1"),
    );
    assert!(event.tools_used.is_empty());
    assert!(event.violations.is_empty());
    assert!(!event.outcome_accepted);
    assert_eq!(event.duration_ms, 0);
}

#[test]
fn sealing_hashes_and_evaluates_the_event() {
    let mut ledger = ledger_with_evaluators();
    let mut event = ledger.create_event(
        TaskId::new("task-1"),
        "catalog facts",
        "a".repeat(64),
        SessionId::new("session-1"),
    );
    event.tools_used.push("search".to_string());
    event.duration_ms = 250;
    event.outcome_accepted = true;
    let event_id = event.event_id.clone();

    let sealed = ledger.finalize_event(event).expect("seal");
    assert_eq!(sealed.content_hash.len(), 64);
    assert_eq!(sealed.evaluations.len(), 2);
    assert!(sealed.evaluations.iter().all(|result| result.passed));

    let stored = ledger.get(&event_id).expect("stored");
    assert_eq!(stored.event.tools_used, vec!["search".to_string()]);
}

#[test]
fn evaluators_fail_over_budget_runs_without_mutating_them() {
    let mut ledger = ledger_with_evaluators();
    let mut event = ledger.create_event(
        TaskId::new("task-2"),
        "overrun",
        "b".repeat(64),
        SessionId::new("session-1"),
    );
    event.duration_ms = 5_000;
    event.violations.push(Violation::new("timeout", "run overran"));
    event.violations.push(Violation::new("forbidden-command", "rm matched"));
    let snapshot = event.clone();

    let sealed = ledger.finalize_event(event).expect("seal");
    let failed: Vec<&str> = sealed
        .evaluations
        .iter()
        .filter(|result| !result.passed)
        .map(|result| result.evaluator.as_str())
        .collect();
    assert_eq!(failed, vec!["violation-count", "duration-threshold"]);
    assert_eq!(sealed.event, snapshot, "evaluation never mutates the event");
}

#[test]
fn sealing_twice_is_rejected() {
    let mut ledger = RunLedger::new();
    let event = ledger.create_event(
        TaskId::new("task-3"),
        "duplicate",
        "c".repeat(64),
        SessionId::new("session-1"),
    );
    let duplicate = event.clone();
    ledger.finalize_event(event).expect("first seal");

    let err = ledger.finalize_event(duplicate).unwrap_err();
    assert!(matches!(err, RunLedgerError::AlreadySealed(_)));
    assert_eq!(ledger.sealed_events().len(), 1);
}
