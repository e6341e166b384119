// crates/warden-harness/src/suite.rs
// ============================================================================
// Module: Warden Task Suite
// Description: Task suite JSON input types.
// Purpose: Describe the headless tasks the harness runs and asserts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A task suite is a JSON document listing tasks with prompts, assertions,
//! violation budgets, and timeouts. The wire format uses camelCase keys as
//! produced by external suite authors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when loading a task suite.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The suite document was not valid JSON.
    #[error("failed to parse task suite: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Assertions
// ============================================================================

/// Assertion kinds evaluated against headless output.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssertionKind {
    /// Output must match `expected`.
    OutputContains,
    /// Output must not match `expected`.
    OutputNotContains,
    /// `expected` must appear among the touched files.
    FilesTouched,
    /// No tool or command may trip the destructive-ops gate.
    NoForbiddenCommands,
    /// The headless process must report no errors.
    TestsPass,
    /// Custom expression matched against the output.
    Custom,
}

/// One assertion in a task.
///
/// # Invariants
/// - `expected` is a literal string or a regex source; the evaluator tries
///   regex compilation first and falls back to literal matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    /// Assertion kind.
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Expected literal or regex source.
    #[serde(default)]
    pub expected: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// SECTION: Tasks
// ============================================================================

/// One headless task.
///
/// # Invariants
/// - `timeout_ms` bounds the subprocess wall clock; expiry kills the
///   process and records a `timeout` violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Task identifier.
    pub id: String,
    /// Prompt passed to the headless agent.
    pub prompt: String,
    /// Intent the run is expected to declare.
    #[serde(default)]
    pub expected_intent: String,
    /// Assertions evaluated after the run.
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    /// Maximum violations before the task fails.
    #[serde(default)]
    pub max_violations: usize,
    /// Subprocess timeout in milliseconds.
    pub timeout_ms: u64,
    /// Suite tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A parsed task suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSuite {
    /// Tasks in declared order.
    pub tasks: Vec<TaskSpec>,
}

impl TaskSuite {
    /// Parses a suite from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Parse`] when the document is not a valid suite.
    pub fn from_json(text: &str) -> Result<Self, SuiteError> {
        serde_json::from_str(text).map_err(|err| SuiteError::Parse(err.to_string()))
    }
}
