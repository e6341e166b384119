// crates/warden-core/src/runtime/gateway.rs
// ============================================================================
// Module: Warden Deterministic Tool Gateway
// Description: Allow/block decisions and call recording for tool invocations.
// Purpose: Ensure no tool runs ungated and every allowed call leaves evidence.
// Dependencies: crate::core, crate::runtime::gates, serde
// ============================================================================

//! ## Overview
//! Before any tool runs, the gateway evaluates the tool name and parameters
//! against the enforcement gates. Decisions are pure functions of the inputs,
//! independent of clock or scheduling. Allowed calls are recorded with their
//! parameters and results for inclusion in proof envelopes; a denied tool is
//! never recorded as executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;
use crate::core::gate::aggregate_decision;
use crate::core::identifiers::CallId;
use crate::core::time::Timestamp;
use crate::runtime::gates::EnforcementGates;

// ============================================================================
// SECTION: Tool Call Records
// ============================================================================

/// Evidence record for one executed tool call.
///
/// # Invariants
/// - Only gateway-allowed calls are recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Call identifier.
    pub call_id: CallId,
    /// Tool name invoked.
    pub tool_name: String,
    /// Parameters passed to the tool.
    pub params: Value,
    /// Result payload returned by the tool.
    pub result: Value,
    /// Invocation timestamp.
    pub timestamp: Timestamp,
    /// Call duration in milliseconds.
    pub duration_ms: u64,
}

/// Gateway decision for a proposed tool call.
///
/// # Invariants
/// - `allowed` is `false` exactly when the aggregate gate decision is
///   `block`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDecision {
    /// Whether the tool may execute.
    pub allowed: bool,
    /// Highest-severity gate result when any gate fired.
    pub gate: Option<GateResult>,
}

// ============================================================================
// SECTION: Tool Gateway
// ============================================================================

/// Deterministic tool gateway: evaluation plus call evidence.
#[derive(Debug)]
pub struct ToolGateway {
    /// Enforcement gates consulted for every evaluation.
    gates: EnforcementGates,
    /// Records of allowed, executed calls.
    calls: Vec<ToolCallRecord>,
}

impl ToolGateway {
    /// Creates a gateway over the given enforcement gates.
    #[must_use]
    pub fn new(gates: EnforcementGates) -> Self {
        Self {
            gates,
            calls: Vec::new(),
        }
    }

    /// Evaluates a proposed tool call without executing or recording it.
    ///
    /// Identical inputs always produce identical decisions.
    #[must_use]
    pub fn evaluate(&self, tool_name: &str, params: &Value) -> GatewayDecision {
        let results = self.gates.evaluate_tool(tool_name, params);
        let aggregate = aggregate_decision(&results);
        let gate = results.into_iter().max_by_key(|result| result.decision.severity());
        GatewayDecision {
            allowed: aggregate != GateDecision::Block,
            gate,
        }
    }

    /// Records an executed call and returns its evidence record.
    ///
    /// Callers must only record calls the gateway allowed.
    pub fn record(
        &mut self,
        tool_name: &str,
        params: Value,
        result: Value,
        timestamp: Timestamp,
        duration_ms: u64,
    ) -> &ToolCallRecord {
        let record = ToolCallRecord {
            call_id: CallId::uuid(),
            tool_name: tool_name.to_string(),
            params,
            result,
            timestamp,
            duration_ms,
        };
        self.calls.push(record);
        // push guarantees a last element
        let index = self.calls.len() - 1;
        &self.calls[index]
    }

    /// Returns the recorded calls in invocation order.
    #[must_use]
    pub fn calls(&self) -> &[ToolCallRecord] {
        &self.calls
    }

    /// Drains the recorded calls, leaving the gateway empty for the next run.
    pub fn take_calls(&mut self) -> Vec<ToolCallRecord> {
        std::mem::take(&mut self.calls)
    }
}
