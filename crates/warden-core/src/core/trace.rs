// crates/warden-core/src/core/trace.rs
// ============================================================================
// Module: Warden Trace Events
// Description: Per-run trace event stream and budget snapshots.
// Purpose: Capture the deterministic run evolution consumed by replay.
// Dependencies: crate::core::time, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every consequential runtime operation emits a [`TraceEvent`]. Within a run
//! the `seq` values are dense and 0-based, timestamps never decrease, and the
//! attached budget counters are monotone. [`validate_trace`] checks these
//! well-formedness rules for export and replay.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Trace event kinds emitted by a cell runtime.
///
/// # Invariants
/// - Variants are stable for serialization and replay derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    /// A memory value was read.
    MemoryRead,
    /// A memory write was proposed for evaluation.
    MemoryWriteProposed,
    /// A proposed write was committed.
    MemoryWriteCommitted,
    /// A proposed write was blocked.
    MemoryWriteBlocked,
    /// A model inference was performed.
    ModelInfer,
    /// A tool invocation was evaluated.
    ToolInvoke,
    /// The coherence score was consulted for a mutating operation.
    CoherenceCheck,
    /// The privilege tier changed after a threshold crossing.
    PrivilegeChange,
    /// The run started.
    RunStart,
    /// The run ended.
    RunEnd,
}

impl TraceEventType {
    /// Returns the stable snake_case label for the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryRead => "memory_read",
            Self::MemoryWriteProposed => "memory_write_proposed",
            Self::MemoryWriteCommitted => "memory_write_committed",
            Self::MemoryWriteBlocked => "memory_write_blocked",
            Self::ModelInfer => "model_infer",
            Self::ToolInvoke => "tool_invoke",
            Self::CoherenceCheck => "coherence_check",
            Self::PrivilegeChange => "privilege_change",
            Self::RunStart => "run_start",
            Self::RunEnd => "run_end",
        }
    }
}

impl fmt::Display for TraceEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Budget Snapshot
// ============================================================================

/// Cumulative budget counters attached to each trace event.
///
/// # Invariants
/// - Every counter is monotone non-decreasing across a run's trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BudgetSnapshot {
    /// Tokens consumed by inference.
    pub tokens: u64,
    /// Tool calls dispatched.
    pub tool_calls: u64,
    /// Bytes committed to memory storage.
    pub storage_bytes: u64,
    /// Milliseconds elapsed since run start.
    pub time_ms: u64,
    /// Accumulated cost in USD.
    pub cost_usd: f64,
}

// ============================================================================
// SECTION: Trace Event
// ============================================================================

/// One entry in a run's trace stream.
///
/// # Invariants
/// - `seq` is dense and 0-based within a run.
/// - `ts` never decreases between consecutive events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Monotonic 0-based sequence number.
    pub seq: u64,
    /// Event timestamp.
    pub ts: Timestamp,
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: TraceEventType,
    /// Event-specific payload consumed by replay derivation.
    pub payload: Value,
    /// Decision string recorded at emission.
    pub decision: String,
    /// Budget counters at emission time.
    pub budget: BudgetSnapshot,
}

// ============================================================================
// SECTION: Well-Formedness
// ============================================================================

/// Errors describing a malformed trace.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    /// A sequence number broke the dense 0-based ordering.
    #[error("trace seq {found} at position {position}, expected {expected}")]
    SequenceGap {
        /// Index of the offending event.
        position: usize,
        /// Sequence value found.
        found: u64,
        /// Sequence value required by density.
        expected: u64,
    },
    /// A timestamp decreased between consecutive events.
    #[error("timestamp regressed at seq {seq}")]
    TimestampRegression {
        /// Sequence of the offending event.
        seq: u64,
    },
    /// A budget counter decreased between consecutive events.
    #[error("budget counter {counter} regressed at seq {seq}")]
    BudgetRegression {
        /// Sequence of the offending event.
        seq: u64,
        /// Name of the regressed counter.
        counter: &'static str,
    },
}

/// Validates trace well-formedness: dense 0-based `seq`, non-decreasing
/// timestamps, and monotone budget counters.
///
/// # Errors
///
/// Returns the first [`TraceError`] encountered in event order.
pub fn validate_trace(events: &[TraceEvent]) -> Result<(), TraceError> {
    let mut previous: Option<&TraceEvent> = None;
    for (position, event) in events.iter().enumerate() {
        let expected = position as u64;
        if event.seq != expected {
            return Err(TraceError::SequenceGap {
                position,
                found: event.seq,
                expected,
            });
        }
        if let Some(prior) = previous {
            if event.ts < prior.ts {
                return Err(TraceError::TimestampRegression {
                    seq: event.seq,
                });
            }
            check_budget_monotone(prior, event)?;
        }
        previous = Some(event);
    }
    Ok(())
}

/// Checks per-counter monotonicity between two consecutive events.
fn check_budget_monotone(prior: &TraceEvent, event: &TraceEvent) -> Result<(), TraceError> {
    let pairs: [(&'static str, u64, u64); 4] = [
        ("tokens", prior.budget.tokens, event.budget.tokens),
        ("tool_calls", prior.budget.tool_calls, event.budget.tool_calls),
        ("storage_bytes", prior.budget.storage_bytes, event.budget.storage_bytes),
        ("time_ms", prior.budget.time_ms, event.budget.time_ms),
    ];
    for (counter, before, after) in pairs {
        if after < before {
            return Err(TraceError::BudgetRegression {
                seq: event.seq,
                counter,
            });
        }
    }
    if event.budget.cost_usd < prior.budget.cost_usd {
        return Err(TraceError::BudgetRegression {
            seq: event.seq,
            counter: "cost_usd",
        });
    }
    Ok(())
}
