// crates/warden-core/src/runtime/gates/allowlist.rs
// ============================================================================
// Module: Warden Tool Allowlist Gate
// Description: Exact and prefix allowlist matching for tool names.
// Purpose: Block tools outside the configured allowlist.
// Dependencies: crate::core::gate, serde_json
// ============================================================================

//! ## Overview
//! When an allowlist is configured and non-empty, a tool name must match an
//! entry exactly, match the wildcard `*`, or match a `prefix*` entry.
//! Anything else blocks. An absent or empty allowlist admits every tool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Gate rejecting tools outside the configured allowlist.
#[derive(Debug, Clone, Default)]
pub struct ToolAllowlistGate {
    /// Allowlist entries; `None` or empty admits everything.
    allowlist: Option<Vec<String>>,
}

impl ToolAllowlistGate {
    /// Creates a gate with the given allowlist.
    #[must_use]
    pub const fn new(allowlist: Option<Vec<String>>) -> Self {
        Self {
            allowlist,
        }
    }

    /// Evaluates a tool name; `None` when the tool is admitted.
    #[must_use]
    pub fn evaluate_tool(&self, tool_name: &str) -> Option<GateResult> {
        let entries = self.allowlist.as_ref()?;
        if entries.is_empty() || entries.iter().any(|entry| entry_matches(entry, tool_name)) {
            return None;
        }
        Some(GateResult {
            decision: GateDecision::Block,
            gate_name: "tool-allowlist".to_string(),
            reason: format!("Tool '{tool_name}' is not on the configured allowlist"),
            triggered_rules: vec!["allowlist.unlisted-tool".to_string()],
            remediation: Some(
                "Request an allowlist entry for the tool or use an allowlisted alternative"
                    .to_string(),
            ),
            metadata: json!({
                "tool": tool_name,
                "allowlist_size": entries.len(),
            }),
        })
    }
}

/// Returns whether one allowlist entry admits a tool name.
fn entry_matches(entry: &str, tool_name: &str) -> bool {
    if entry == "*" {
        return true;
    }
    if let Some(prefix) = entry.strip_suffix('*') {
        return tool_name.starts_with(prefix);
    }
    entry == tool_name
}
