// crates/warden-conformance/src/replay.rs
// ============================================================================
// Module: Warden Replay Verifier
// Description: Re-derives every trace decision from event type and payload.
// Purpose: Prove a recorded trace is consistent with control-plane logic.
// Dependencies: warden-core, serde_json
// ============================================================================

//! ## Overview
//! Replay walks a recorded trace with only the control-plane derivation
//! rules and the configured coherence thresholds. For each event it
//! recomputes the expected decision from `(type, payload)` and reports a
//! divergence where the recorded decision differs:
//!
//! | event type | expected decision |
//! |---|---|
//! | `run_start` | `start` |
//! | `memory_read`, `model_infer` | `allow` |
//! | `memory_write_proposed` | `evaluate` |
//! | `coherence_check` | privilege name for the payload score |
//! | `memory_write_committed` | `allow` while privilege permits writes |
//! | `memory_write_blocked` | `block` |
//! | `privilege_change` | `{previous}->{new}` from the payload |
//! | `tool_invoke` | `allow`/`block` from the payload `allowed` flag |
//! | `run_end` | `end` |
//!
//! Privilege state is re-derived from the `run_start` initial score and each
//! `coherence_check` payload, so a committed write under a non-writing tier
//! also surfaces as a divergence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use warden_core::CoherenceThresholds;
use warden_core::PrivilegeLevel;
use warden_core::TraceEvent;
use warden_core::TraceEventType;
use warden_core::validate_trace;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// One divergence between a recorded and a re-derived decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    /// Sequence of the diverging event.
    pub seq: u64,
    /// Decision the derivation expected.
    pub expected: String,
    /// Decision the trace recorded.
    pub actual: String,
    /// Event type label for context.
    pub event_type: String,
}

/// Replay verification report.
///
/// # Invariants
/// - `divergences` is empty exactly when every decision re-derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Number of events checked.
    pub events_checked: usize,
    /// Decision divergences in sequence order.
    pub divergences: Vec<ReplayDivergence>,
    /// Trace well-formedness failure, if any.
    pub malformed: Option<String>,
}

impl ReplayReport {
    /// Returns whether the trace replayed without divergence.
    #[must_use]
    pub fn verified(&self) -> bool {
        self.divergences.is_empty() && self.malformed.is_none()
    }
}

// ============================================================================
// SECTION: Replay Verifier
// ============================================================================

/// Deterministic trace replay verifier.
#[derive(Debug, Clone, Copy)]
pub struct ReplayVerifier {
    /// Coherence thresholds used to re-derive privilege.
    thresholds: CoherenceThresholds,
}

impl ReplayVerifier {
    /// Creates a verifier over the thresholds the runtime used.
    #[must_use]
    pub const fn new(thresholds: CoherenceThresholds) -> Self {
        Self {
            thresholds,
        }
    }

    /// Re-derives every decision in the trace and reports divergences.
    #[must_use]
    pub fn verify(&self, trace: &[TraceEvent]) -> ReplayReport {
        let malformed = validate_trace(trace).err().map(|err| err.to_string());
        let mut divergences = Vec::new();
        let mut privilege = PrivilegeLevel::Full;

        for event in trace {
            let expected = self.expected_decision(event, &mut privilege);
            if expected != event.decision {
                divergences.push(ReplayDivergence {
                    seq: event.seq,
                    expected,
                    actual: event.decision.clone(),
                    event_type: event.event_type.as_str().to_string(),
                });
            }
        }

        ReplayReport {
            events_checked: trace.len(),
            divergences,
            malformed,
        }
    }

    /// Computes the expected decision for one event, updating privilege
    /// state as the derivation table requires.
    fn expected_decision(&self, event: &TraceEvent, privilege: &mut PrivilegeLevel) -> String {
        match event.event_type {
            TraceEventType::RunStart => {
                if let Some(score) = payload_f64(&event.payload, "initial_coherence") {
                    *privilege = self.thresholds.privilege_for(score);
                }
                "start".to_string()
            }
            TraceEventType::RunEnd => "end".to_string(),
            TraceEventType::MemoryRead | TraceEventType::ModelInfer => "allow".to_string(),
            TraceEventType::MemoryWriteProposed => "evaluate".to_string(),
            TraceEventType::CoherenceCheck => {
                let derived = payload_f64(&event.payload, "score")
                    .map_or(*privilege, |score| self.thresholds.privilege_for(score));
                *privilege = derived;
                derived.as_str().to_string()
            }
            TraceEventType::MemoryWriteCommitted => {
                if privilege.permits_writes() {
                    "allow".to_string()
                } else {
                    "block".to_string()
                }
            }
            TraceEventType::MemoryWriteBlocked => "block".to_string(),
            TraceEventType::PrivilegeChange => {
                let previous = payload_str(&event.payload, "previous_level");
                let new_level = payload_str(&event.payload, "new_level");
                if let Some(score) = payload_f64(&event.payload, "score") {
                    *privilege = self.thresholds.privilege_for(score);
                }
                format!("{previous}->{new_level}")
            }
            TraceEventType::ToolInvoke => {
                let allowed = event
                    .payload
                    .get("allowed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if allowed { "allow".to_string() } else { "block".to_string() }
            }
        }
    }
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Reads a float field from an event payload.
fn payload_f64(payload: &Value, field: &str) -> Option<f64> {
    payload.get(field).and_then(Value::as_f64)
}

/// Reads a string field from an event payload, empty when absent.
fn payload_str(payload: &Value, field: &str) -> String {
    payload.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}
