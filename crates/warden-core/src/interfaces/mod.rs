// crates/warden-core/src/interfaces/mod.rs
// ============================================================================
// Module: Warden Interfaces
// Description: Backend-agnostic seams for cells, tools, clocks, and telemetry.
// Purpose: Define the contract surfaces used by the Warden runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Warden integrates with agent cells and external
//! systems without embedding backend detail. Implementations must be
//! deterministic and fail closed: a denied operation is a decision, not an
//! exception, and the core never reads ambient state through these seams.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;
use crate::core::privilege::PrivilegeLevel;
use crate::core::run_event::RunEvent;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source injected into every time-dependent component.
///
/// The core never reads wall-clock time directly; hosts provide a clock so
/// traces and rollouts replay deterministically.
pub trait Clock {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Manually advanced clock for tests and deterministic runtimes.
///
/// # Invariants
/// - Time only moves forward through [`ManualClock::advance`].
#[derive(Debug, Default)]
pub struct ManualClock {
    /// Current epoch-millisecond value.
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock positioned at the given epoch milliseconds.
    #[must_use]
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance(&self, delta_ms: i64) {
        self.millis.fetch_add(delta_ms.max(0), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

// ============================================================================
// SECTION: Cell Runtime
// ============================================================================

/// Errors raised by cell runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No run is currently open.
    #[error("no active run")]
    NoActiveRun,
    /// A run is already open.
    #[error("run already started")]
    RunAlreadyStarted,
    /// Sealing the run into the evidence chain failed.
    #[error("failed to seal run: {0}")]
    Seal(String),
    /// The runtime rejected the operation for an internal reason.
    #[error("runtime error: {0}")]
    Internal(String),
}

/// Outcome of a proposed memory write.
///
/// # Invariants
/// - `reason` explains the first failing rule, or reads `"Write committed"`
///   on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Whether the write was committed.
    pub committed: bool,
    /// Explanation of the outcome.
    pub reason: String,
}

/// Outcome of a tool invocation routed through the gateway.
///
/// # Invariants
/// - A denied tool never executes; `result` is `None` when blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvokeOutcome {
    /// Whether the gateway allowed the call.
    pub allowed: bool,
    /// Gate result when the call was gated.
    pub gate: Option<GateResult>,
    /// Simulated or recorded tool result when allowed.
    pub result: Option<Value>,
}

/// Runtime abstraction an agent cell runs against.
///
/// Every memory read/write, inference, and tool call flows through this
/// seam so gating, budgeting, and tracing stay consistent.
pub trait CellRuntime {
    /// Reads a memory value, recording lineage.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active.
    fn memory_read(&mut self, namespace: &str, key: &str) -> Result<Option<Value>, RuntimeError>;

    /// Proposes a memory write through the coherence check and write gate.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active.
    fn memory_write(
        &mut self,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<WriteOutcome, RuntimeError>;

    /// Performs a simulated model inference.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active.
    fn model_infer(&mut self, prompt: &str) -> Result<String, RuntimeError>;

    /// Invokes a tool through the deterministic gateway.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active.
    fn tool_invoke(
        &mut self,
        tool_name: &str,
        params: Value,
    ) -> Result<ToolInvokeOutcome, RuntimeError>;

    /// Updates the coherence score, possibly changing privilege.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active.
    fn set_coherence(&mut self, score: f64) -> Result<(), RuntimeError>;

    /// Returns the current privilege tier.
    fn privilege(&self) -> PrivilegeLevel;
}

// ============================================================================
// SECTION: Tool Executor
// ============================================================================

/// Errors raised by tool executors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executor reported a failure.
    #[error("tool execution error: {0}")]
    Execution(String),
}

/// External tool executor invoked only after the gateway allows a call.
pub trait ToolExecutor {
    /// Executes an allowed tool call and returns its result payload.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when execution fails.
    fn execute(&self, tool_name: &str, params: &Value) -> Result<Value, ToolError>;
}

// ============================================================================
// SECTION: Write Hooks
// ============================================================================

/// External gate hook consulted by the memory write gate.
///
/// Hooks inspect the serialized value of a proposed write (for example the
/// secrets gate) and may veto it with a gate result.
pub trait WriteHook {
    /// Inspects a proposed write; `None` means no objection.
    fn inspect(&self, namespace: &str, key: &str, serialized_value: &str) -> Option<GateResult>;
}

// ============================================================================
// SECTION: Run Evaluators
// ============================================================================

/// Result of evaluating a sealed run event.
///
/// # Invariants
/// - Evaluators never mutate the event they observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResult {
    /// Name of the evaluator that produced the result.
    pub evaluator: String,
    /// Whether the run passed this evaluator.
    pub passed: bool,
    /// Scalar score in `[0, 1]`.
    pub score: f64,
    /// Free-text notes.
    pub notes: String,
}

/// Pure per-event evaluator run by the run ledger at finalization.
pub trait RunEvaluator {
    /// Returns the evaluator's stable name.
    fn name(&self) -> &'static str;

    /// Evaluates a sealed run event.
    fn evaluate(&self, event: &RunEvent) -> EvaluatorResult;
}

// ============================================================================
// SECTION: Telemetry
// ============================================================================

/// Typed telemetry events emitted by the control plane.
///
/// # Invariants
/// - Events carry labels and counters only; raw secret material never
///   reaches telemetry.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// A gate produced a non-allow decision.
    GateDecision {
        /// Gate name.
        gate: String,
        /// Decision severity.
        decision: GateDecision,
        /// Rules that fired.
        triggered_rules: Vec<String>,
    },
    /// A budget counter crossed its soft limit.
    BudgetWarning {
        /// Counter label.
        counter: &'static str,
        /// Current counter value.
        value: f64,
        /// Configured soft limit.
        soft_limit: f64,
    },
    /// The privilege tier changed.
    PrivilegeChange {
        /// Previous tier.
        previous: PrivilegeLevel,
        /// New tier.
        new_level: PrivilegeLevel,
        /// Coherence score that caused the change.
        score: f64,
    },
    /// A rollout changed stage or reached a terminal state.
    RolloutTransition {
        /// Rollout identifier.
        rollout_id: String,
        /// Stage name the transition applies to.
        stage: String,
        /// Transition label, e.g. `advanced` or `rolled-back`, optionally
        /// carrying the operator-supplied reason.
        transition: String,
    },
}

/// Telemetry sink for control-plane events.
pub trait TelemetrySink: Send + Sync {
    /// Records one telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// No-op telemetry sink.
///
/// # Invariants
/// - Events are intentionally discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: TelemetryEvent) {}
}
