// crates/warden-harness/src/assertions.rs
// ============================================================================
// Module: Warden Harness Assertions
// Description: Assertion evaluation over normalized headless output.
// Purpose: Map unmet expectations to run violations.
// Dependencies: crate::{output, suite}, regex, warden-core
// ============================================================================

//! ## Overview
//! Assertions compare the normalized headless output against suite
//! expectations. `expected` values are tried as regex sources first and fall
//! back to literal substring matching when compilation fails. Forbidden
//! command checks reuse the core destructive-ops gate so the harness and the
//! control plane agree on what counts as destructive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use warden_core::Violation;
use warden_core::runtime::DestructiveOpsGate;

use crate::output::HeadlessOutput;
use crate::suite::Assertion;
use crate::suite::AssertionKind;
use crate::suite::TaskSpec;

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Returns whether `expected` matches `haystack`.
///
/// The expectation is compiled as a regex when possible; an uncompilable
/// source is treated as a literal substring. Patterns are compiled on an
/// owned local object per evaluation.
fn expectation_matches(expected: &str, haystack: &str) -> bool {
    match Regex::new(expected) {
        Ok(pattern) => pattern.is_match(haystack),
        Err(_) => haystack.contains(expected),
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates every assertion of a task, returning the violations found.
#[must_use]
pub fn evaluate_assertions(task: &TaskSpec, output: &HeadlessOutput) -> Vec<Violation> {
    let mut violations = Vec::new();
    for assertion in &task.assertions {
        if let Some(violation) = evaluate_assertion(assertion, output) {
            violations.push(violation);
        }
    }
    violations
}

/// Evaluates one assertion; `None` when it holds.
fn evaluate_assertion(assertion: &Assertion, output: &HeadlessOutput) -> Option<Violation> {
    match assertion.kind {
        AssertionKind::OutputContains => {
            if expectation_matches(&assertion.expected, &output.result) {
                None
            } else {
                Some(Violation::new(
                    "assertion-failed",
                    format!("Output does not contain expected '{}'", assertion.expected),
                ))
            }
        }
        AssertionKind::OutputNotContains => {
            if expectation_matches(&assertion.expected, &output.result) {
                Some(Violation::new(
                    "assertion-failed",
                    format!("Output contains forbidden '{}'", assertion.expected),
                ))
            } else {
                None
            }
        }
        AssertionKind::FilesTouched => {
            if output.files_modified.iter().any(|path| path == &assertion.expected) {
                None
            } else {
                Some(Violation::new(
                    "assertion-failed",
                    format!("Expected file '{}' was not touched", assertion.expected),
                ))
            }
        }
        AssertionKind::NoForbiddenCommands => forbidden_command_violation(output),
        AssertionKind::TestsPass => {
            if output.has_errors {
                Some(Violation::new("tests-failed", "Headless process reported errors"))
            } else {
                None
            }
        }
        AssertionKind::Custom => {
            if expectation_matches(&assertion.expected, &output.result) {
                None
            } else {
                Some(Violation::new(
                    "custom-assertion-failed",
                    format!("Custom expectation '{}' did not match", assertion.expected),
                ))
            }
        }
    }
}

/// Checks tool names against the destructive-ops gate.
fn forbidden_command_violation(output: &HeadlessOutput) -> Option<Violation> {
    let gate = DestructiveOpsGate;
    for tool in &output.tools_used {
        if let Some(result) = gate.evaluate_command(tool) {
            return Some(Violation::new(
                "forbidden-command",
                format!("Tool use '{tool}' matched rules: {}", result.triggered_rules.join(", ")),
            ));
        }
    }
    None
}
