// crates/warden-core/src/runtime/gates/destructive.rs
// ============================================================================
// Module: Warden Destructive-Ops Gate
// Description: Pattern gate for irreversible shell, SQL, and cluster commands.
// Purpose: Force confirmation with a rollback plan before destructive actions.
// Dependencies: crate::core::gate, regex, serde_json
// ============================================================================

//! ## Overview
//! The destructive-ops gate scans commands and serialized tool parameters
//! for irreversible operations. A match yields `require-confirmation` with a
//! rollback-plan remediation. Patterns are compiled on an owned local object
//! per scan so no matcher state leaks between evaluations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde_json::Value;
use serde_json::json;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One destructive-operation rule.
struct DestructiveRule {
    /// Stable rule identifier.
    rule_id: &'static str,
    /// Regex source matched against the scanned text.
    pattern: &'static str,
    /// Short description of the matched operation.
    description: &'static str,
}

/// Destructive operation pattern set.
const DESTRUCTIVE_RULES: &[DestructiveRule] = &[
    DestructiveRule {
        rule_id: "destructive.rm-rf",
        pattern: r"\brm\s+-[a-zA-Z]*[rR][a-zA-Z]*[fF]|\brm\s+-[a-zA-Z]*[fF][a-zA-Z]*[rR]",
        description: "recursive force remove",
    },
    DestructiveRule {
        rule_id: "destructive.git-push-force",
        pattern: r"\bgit\s+push\b.*(?:--force\b|\s-f\b)",
        description: "force push rewriting remote history",
    },
    DestructiveRule {
        rule_id: "destructive.git-reset-hard",
        pattern: r"\bgit\s+reset\s+--hard\b",
        description: "hard reset discarding local changes",
    },
    DestructiveRule {
        rule_id: "destructive.git-clean",
        pattern: r"\bgit\s+clean\s+-[a-zA-Z]*[fd][a-zA-Z]*[fd]\b",
        description: "git clean removing untracked files",
    },
    DestructiveRule {
        rule_id: "destructive.sql-drop",
        pattern: r"(?i)\b(?:DROP|TRUNCATE)\s+(?:TABLE|DATABASE|SCHEMA|INDEX|VIEW)\b",
        description: "SQL object drop or truncate",
    },
    DestructiveRule {
        rule_id: "destructive.sql-alter-drop",
        pattern: r"(?i)\bALTER\s+TABLE\b.*\bDROP\b",
        description: "SQL column or constraint drop",
    },
    DestructiveRule {
        rule_id: "destructive.sql-delete",
        pattern: r"(?i)\bDELETE\s+FROM\s+\S+",
        description: "SQL bulk delete",
    },
    DestructiveRule {
        rule_id: "destructive.cluster-delete",
        pattern: r"\b(?:kubectl|helm)\s+delete\b.*(?:--all\b|--namespace\b|\s-n\s)",
        description: "cluster-wide resource deletion",
    },
    DestructiveRule {
        rule_id: "destructive.win-format",
        pattern: r"(?i)\bformat\s+[a-z]:",
        description: "Windows volume format",
    },
    DestructiveRule {
        rule_id: "destructive.win-del",
        pattern: r"(?i)\bdel\s+/[sf]\b",
        description: "Windows recursive or forced delete",
    },
];

/// Remediation guidance attached to every destructive match.
const ROLLBACK_REMEDIATION: &str = "Prepare and attach a rollback plan before confirming: \
     capture the current state, verify backups, and stage the operation on a copy first";

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Gate flagging irreversible operations in commands and tool parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DestructiveOpsGate;

impl DestructiveOpsGate {
    /// Evaluates a command string; `None` when nothing matched.
    #[must_use]
    pub fn evaluate_command(&self, command: &str) -> Option<GateResult> {
        let triggered = matched_rules(command);
        if triggered.is_empty() {
            return None;
        }
        Some(build_result(command, triggered))
    }

    /// Evaluates serialized tool parameters; `None` when nothing matched.
    #[must_use]
    pub fn evaluate_tool_params(&self, tool_name: &str, params: &Value) -> Option<GateResult> {
        let serialized = params.to_string();
        let triggered = matched_rules(&serialized);
        if triggered.is_empty() {
            return None;
        }
        let mut result = build_result(&serialized, triggered);
        result.reason = format!("Tool '{tool_name}' parameters contain a destructive operation");
        Some(result)
    }
}

/// Returns the identifiers and descriptions of rules matching the text.
///
/// Each pattern is compiled on a fresh local object; sources are validated
/// by the pattern-set test and a failing compile simply skips the rule.
fn matched_rules(text: &str) -> Vec<&'static DestructiveRule> {
    DESTRUCTIVE_RULES
        .iter()
        .filter(|rule| {
            Regex::new(rule.pattern).is_ok_and(|pattern| pattern.is_match(text))
        })
        .collect()
}

/// Builds the require-confirmation result for a matched scan.
fn build_result(scanned: &str, triggered: Vec<&'static DestructiveRule>) -> GateResult {
    let descriptions: Vec<&str> = triggered.iter().map(|rule| rule.description).collect();
    GateResult {
        decision: GateDecision::RequireConfirmation,
        gate_name: "destructive-ops".to_string(),
        reason: format!("Destructive operation detected: {}", descriptions.join(", ")),
        triggered_rules: triggered.iter().map(|rule| rule.rule_id.to_string()).collect(),
        remediation: Some(ROLLBACK_REMEDIATION.to_string()),
        metadata: json!({
            "scanned_length": scanned.len(),
            "match_count": triggered.len(),
        }),
    }
}

/// Returns every rule pattern source for compile validation in tests.
#[must_use]
pub fn rule_patterns() -> Vec<&'static str> {
    DESTRUCTIVE_RULES.iter().map(|rule| rule.pattern).collect()
}
