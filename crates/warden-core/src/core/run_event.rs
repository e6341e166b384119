// crates/warden-core/src/core/run_event.rs
// ============================================================================
// Module: Warden Run Events
// Description: Per-run event records and violations.
// Purpose: Capture what a run did for sealing, evaluation, and evidence.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`RunEvent`] is created when a run starts, mutates while the run
//! proceeds, and becomes immutable once the run ledger seals it. The sealed
//! form is the hashable body wrapped by a proof envelope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TaskId;

// ============================================================================
// SECTION: Violations
// ============================================================================

/// A policy violation attributed to a run.
///
/// # Invariants
/// - `code` is a stable machine-readable identifier; free text lives in
///   `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable violation code, e.g. `timeout` or `forbidden-command`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Creates a violation from a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Run Event
// ============================================================================

/// Mutable record of one run, sealed by the run ledger at finalization.
///
/// # Invariants
/// - After sealing, the record is immutable and hashable; mutation happens
///   only between creation and [`crate::runtime::RunLedger::finalize_event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// Event identifier assigned at creation.
    pub event_id: EventId,
    /// Task the run executed.
    pub task_id: TaskId,
    /// Declared intent for the run.
    pub intent: String,
    /// Opaque hash of the policy guidance in force.
    pub guidance_hash: String,
    /// Tool names used during the run.
    pub tools_used: Vec<String>,
    /// File paths touched during the run.
    pub files_touched: Vec<String>,
    /// Violations recorded against the run.
    pub violations: Vec<Violation>,
    /// Whether the run outcome was accepted.
    pub outcome_accepted: bool,
    /// Run duration in milliseconds.
    pub duration_ms: u64,
    /// Session the run belongs to.
    pub session_id: SessionId,
}
