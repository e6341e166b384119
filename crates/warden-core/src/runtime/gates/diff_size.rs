// crates/warden-core/src/runtime/gates/diff_size.rs
// ============================================================================
// Module: Warden Diff-Size Gate
// Description: Warns on oversized edits.
// Purpose: Nudge large edits toward planned, staged changes.
// Dependencies: crate::core::gate, serde_json
// ============================================================================

//! ## Overview
//! Edits whose line count exceeds the configured threshold return a warning
//! with a plan-and-stage remediation. The gate never blocks; it exists to
//! surface risk, not to stop work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default line-count threshold for the warning.
pub const DEFAULT_DIFF_SIZE_THRESHOLD: usize = 300;

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Gate warning on edits above a line-count threshold.
#[derive(Debug, Clone, Copy)]
pub struct DiffSizeGate {
    /// Line count above which the warning fires.
    threshold: usize,
}

impl Default for DiffSizeGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DIFF_SIZE_THRESHOLD,
        }
    }
}

impl DiffSizeGate {
    /// Creates a gate with the given threshold.
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self {
            threshold,
        }
    }

    /// Evaluates an edit; `None` when the diff is within the threshold.
    #[must_use]
    pub fn evaluate_edit(&self, path: &str, diff: &str) -> Option<GateResult> {
        let line_count = diff.lines().count();
        if line_count <= self.threshold {
            return None;
        }
        Some(GateResult {
            decision: GateDecision::Warn,
            gate_name: "diff-size".to_string(),
            reason: format!(
                "Edit to '{path}' spans {line_count} lines, above the {} line threshold",
                self.threshold
            ),
            triggered_rules: vec!["diff-size.threshold".to_string()],
            remediation: Some(
                "Split the change into reviewable stages and land them behind a plan".to_string(),
            ),
            metadata: json!({
                "path": path,
                "line_count": line_count,
                "threshold": self.threshold,
            }),
        })
    }
}
