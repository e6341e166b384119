// crates/warden-harness/tests/runner.rs
// ============================================================================
// Module: Harness Runner Tests
// Description: Subprocess execution, assertion mapping, and hard timeouts.
// ============================================================================
//! ## Overview
//! Exercises the runner against small unix utilities: echo provides a
//! deterministic stdout for assertion checks and sleep drives the hard
//! timeout path.

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
#![cfg(unix)]

use warden_harness::Assertion;
use warden_harness::AssertionKind;
use warden_harness::HeadlessOutput;
use warden_harness::TaskCommand;
use warden_harness::TaskRunner;
use warden_harness::TaskSpec;
use warden_harness::TaskSuite;
use warden_harness::evaluate_assertions;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn echo_runner() -> TaskRunner {
    TaskRunner::new(TaskCommand::new("echo", Vec::new()))
}

fn task(id: &str, prompt: &str, assertions: Vec<Assertion>, timeout_ms: u64) -> TaskSpec {
    TaskSpec {
        id: id.to_string(),
        prompt: prompt.to_string(),
        expected_intent: String::new(),
        assertions,
        max_violations: 0,
        timeout_ms,
        tags: Vec::new(),
    }
}

fn contains(expected: &str) -> Assertion {
    Assertion {
        kind: AssertionKind::OutputContains,
        expected: expected.to_string(),
        description: String::new(),
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

#[test]
fn echo_task_passes_its_assertions() {
    let runner = echo_runner();
    let task = task("echo-1", "governance harness check", vec![contains("harness")], 5_000);

    let outcome = runner.run_task(&task);
    assert!(outcome.passed, "violations: {:?}", outcome.violations);
    assert_eq!(outcome.exit_code, Some(0));
    let output = outcome.output.expect("output");
    assert!(output.result.contains("governance harness check"));
}

#[test]
fn json_stdout_is_parsed_into_fields() {
    let runner = echo_runner();
    let json_prompt = r#"{"result": "filed", "toolsUsed": ["write"], "hasErrors": false}"#;
    let task = task("echo-json", json_prompt, vec![contains("filed")], 5_000);

    let outcome = runner.run_task(&task);
    assert!(outcome.passed);
    let output = outcome.output.expect("output");
    assert_eq!(output.result, "filed");
    assert_eq!(output.tools_used, vec!["write"]);
}

#[test]
fn failed_assertion_fails_the_task() {
    let runner = echo_runner();
    let task = task("echo-miss", "something else", vec![contains("absent-token")], 5_000);

    let outcome = runner.run_task(&task);
    assert!(!outcome.passed);
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].code, "assertion-failed");
}

#[test]
fn timeout_kills_the_process_and_records_a_violation() {
    let runner = TaskRunner::new(TaskCommand::new("sleep", vec!["5".to_string()]));
    let task = task("sleeper", "ignored", Vec::new(), 100);

    let outcome = runner.run_task(&task);
    assert!(!outcome.passed);
    assert!(outcome.output.is_none(), "timed-out stdout is never parsed");
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].code, "timeout");
    assert!(outcome.duration_ms < 5_000, "the process must be killed early");
}

#[test]
fn spawn_failure_fails_the_task_without_aborting() {
    let runner = TaskRunner::new(TaskCommand::new("/nonexistent/warden-agent", Vec::new()));
    let task = task("missing-binary", "ignored", Vec::new(), 1_000);

    let outcome = runner.run_task(&task);
    assert!(!outcome.passed);
    assert_eq!(outcome.violations[0].code, "spawn-failed");
}

#[test]
fn suite_run_aggregates_pass_and_fail_counts() {
    let runner = echo_runner();
    let suite = TaskSuite {
        tasks: vec![
            task("pass", "alpha beta", vec![contains("alpha")], 5_000),
            task("fail", "alpha beta", vec![contains("gamma")], 5_000),
        ],
    };

    let outcome = runner.run_suite(&suite);
    assert_eq!(outcome.passed, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.outcomes.len(), 2);
}

// ============================================================================
// SECTION: Assertion Mapping
// ============================================================================

#[test]
fn forbidden_command_assertion_uses_the_core_gate() {
    let output = HeadlessOutput {
        result: "cleanup finished".to_string(),
        tools_used: vec!["rm -rf /srv/data".to_string()],
        files_modified: Vec::new(),
        has_errors: false,
        metadata: serde_json::json!({}),
    };
    let task = task(
        "forbidden",
        "ignored",
        vec![Assertion {
            kind: AssertionKind::NoForbiddenCommands,
            expected: String::new(),
            description: String::new(),
        }],
        1_000,
    );

    let violations = evaluate_assertions(&task, &output);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "forbidden-command");
}

#[test]
fn tests_pass_assertion_tracks_reported_errors() {
    let failing = HeadlessOutput {
        has_errors: true,
        ..HeadlessOutput::default()
    };
    let task = task(
        "tests",
        "ignored",
        vec![Assertion {
            kind: AssertionKind::TestsPass,
            expected: String::new(),
            description: String::new(),
        }],
        1_000,
    );

    let violations = evaluate_assertions(&task, &failing);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].code, "tests-failed");
}

#[test]
fn files_touched_assertion_matches_exact_paths() {
    let output = HeadlessOutput {
        files_modified: vec!["notes.md".to_string()],
        ..HeadlessOutput::default()
    };
    let hit = task(
        "files-hit",
        "ignored",
        vec![Assertion {
            kind: AssertionKind::FilesTouched,
            expected: "notes.md".to_string(),
            description: String::new(),
        }],
        1_000,
    );
    assert!(evaluate_assertions(&hit, &output).is_empty());

    let miss = task(
        "files-miss",
        "ignored",
        vec![Assertion {
            kind: AssertionKind::FilesTouched,
            expected: "other.md".to_string(),
            description: String::new(),
        }],
        1_000,
    );
    assert_eq!(evaluate_assertions(&miss, &output).len(), 1);
}

#[test]
fn output_assertions_accept_regex_sources() {
    let output = HeadlessOutput {
        result: "filed 20 facts".to_string(),
        ..HeadlessOutput::default()
    };
    let regex_task = task(
        "regex",
        "ignored",
        vec![Assertion {
            kind: AssertionKind::OutputContains,
            expected: r"filed \d+ facts".to_string(),
            description: String::new(),
        }],
        1_000,
    );
    assert!(evaluate_assertions(&regex_task, &output).is_empty());
}
