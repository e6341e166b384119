// crates/warden-core/src/core/gate.rs
// ============================================================================
// Module: Warden Gate Results
// Description: Gate decisions, severity ranking, and aggregation.
// Purpose: Provide the shared decision vocabulary for every enforcement gate.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every gate returns a [`GateResult`] carrying a four-valued decision. The
//! aggregate of several results is the decision with the maximum severity
//! rank; an empty result set aggregates to `allow`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Gate Decision
// ============================================================================

/// Gate decision ordered by severity.
///
/// # Invariants
/// - Severity ranks are `allow=0, warn=1, require-confirmation=2, block=3`.
/// - Variants are stable for serialization and replay derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateDecision {
    /// The action proceeds unmodified.
    Allow,
    /// The action proceeds with a logged warning.
    Warn,
    /// The action requires explicit confirmation before proceeding.
    RequireConfirmation,
    /// The action is refused.
    Block,
}

impl GateDecision {
    /// Returns the severity rank used for aggregation.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Allow => 0,
            Self::Warn => 1,
            Self::RequireConfirmation => 2,
            Self::Block => 3,
        }
    }

    /// Returns the stable kebab-case label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::RequireConfirmation => "require-confirmation",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Outcome of a single gate evaluation.
///
/// # Invariants
/// - `triggered_rules` lists the rule identifiers that fired, never raw
///   matched content; secret material is redacted before it reaches
///   `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Decision for the evaluated action.
    pub decision: GateDecision,
    /// Name of the gate that produced the result.
    pub gate_name: String,
    /// Human-readable explanation of the decision.
    pub reason: String,
    /// Identifiers of the rules that matched.
    pub triggered_rules: Vec<String>,
    /// Suggested remediation for the caller.
    pub remediation: Option<String>,
    /// Structured gate-specific details.
    pub metadata: Value,
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Aggregates gate results into the maximum-severity decision.
///
/// The empty set aggregates to [`GateDecision::Allow`].
#[must_use]
pub fn aggregate_decision(results: &[GateResult]) -> GateDecision {
    results
        .iter()
        .map(|result| result.decision)
        .max_by_key(|decision| decision.severity())
        .unwrap_or(GateDecision::Allow)
}
