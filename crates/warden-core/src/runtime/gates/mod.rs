// crates/warden-core/src/runtime/gates/mod.rs
// ============================================================================
// Module: Warden Enforcement Gates
// Description: Gate family over commands, tool uses, and edits.
// Purpose: Provide the synchronous policy checks consulted before every action.
// Dependencies: crate::core, crate::runtime::gates::*
// ============================================================================

//! ## Overview
//! Enforcement gates operate on three evaluation contexts: commands, tool
//! uses, and edits. Each gate returns `Option<GateResult>`; the aggregate of
//! a context's results is the maximum-severity decision, with the empty set
//! aggregating to `allow`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod allowlist;
pub mod destructive;
pub mod diff_size;
pub mod secrets;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::gate::GateResult;

pub use allowlist::ToolAllowlistGate;
pub use destructive::DestructiveOpsGate;
pub use diff_size::DEFAULT_DIFF_SIZE_THRESHOLD;
pub use diff_size::DiffSizeGate;
pub use secrets::SecretsGate;
pub use secrets::SecretsWriteHook;
pub use secrets::redact;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Enforcement gate configuration.
///
/// # Invariants
/// - An absent allowlist admits every tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementConfig {
    /// Tool allowlist; `None` or empty admits everything.
    pub tool_allowlist: Option<Vec<String>>,
    /// Diff-size warning threshold in lines.
    pub diff_size_threshold: usize,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            tool_allowlist: None,
            diff_size_threshold: DEFAULT_DIFF_SIZE_THRESHOLD,
        }
    }
}

// ============================================================================
// SECTION: Gate Assembly
// ============================================================================

/// The assembled enforcement gate family.
#[derive(Debug, Clone, Default)]
pub struct EnforcementGates {
    /// Destructive-operation gate.
    destructive: DestructiveOpsGate,
    /// Tool allowlist gate.
    allowlist: ToolAllowlistGate,
    /// Diff-size gate.
    diff_size: DiffSizeGate,
    /// Secrets gate.
    secrets: SecretsGate,
}

impl EnforcementGates {
    /// Assembles the gate family from configuration.
    #[must_use]
    pub fn new(config: &EnforcementConfig) -> Self {
        Self {
            destructive: DestructiveOpsGate,
            allowlist: ToolAllowlistGate::new(config.tool_allowlist.clone()),
            diff_size: DiffSizeGate::new(config.diff_size_threshold),
            secrets: SecretsGate,
        }
    }

    /// Evaluates a command against the destructive and secrets gates.
    #[must_use]
    pub fn evaluate_command(&self, command: &str) -> Vec<GateResult> {
        let mut results = Vec::new();
        if let Some(result) = self.destructive.evaluate_command(command) {
            results.push(result);
        }
        if let Some(result) = self.secrets.evaluate_content(command) {
            results.push(result);
        }
        results
    }

    /// Evaluates a tool use against the allowlist, destructive, and secrets
    /// gates.
    #[must_use]
    pub fn evaluate_tool(&self, tool_name: &str, params: &Value) -> Vec<GateResult> {
        let mut results = Vec::new();
        if let Some(result) = self.allowlist.evaluate_tool(tool_name) {
            results.push(result);
        }
        if let Some(result) = self.destructive.evaluate_tool_params(tool_name, params) {
            results.push(result);
        }
        if let Some(result) = self.secrets.evaluate_content(&params.to_string()) {
            results.push(result);
        }
        results
    }

    /// Evaluates an edit against the diff-size and secrets gates.
    #[must_use]
    pub fn evaluate_edit(&self, path: &str, diff: &str) -> Vec<GateResult> {
        let mut results = Vec::new();
        if let Some(result) = self.diff_size.evaluate_edit(path, diff) {
            results.push(result);
        }
        if let Some(result) = self.secrets.evaluate_content(diff) {
            results.push(result);
        }
        results
    }
}
