// crates/warden-core/src/runtime/run_ledger.rs
// ============================================================================
// Module: Warden Run Ledger
// Description: Run event creation, sealing, and the evaluator pipeline.
// Purpose: Turn open runs into immutable, evaluated, hashable records.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! The run ledger creates mutable [`RunEvent`] records at run start and
//! seals them at finalization. Sealing computes the canonical content hash
//! and feeds the event through the registered evaluators. Evaluators are
//! pure: their results are stored beside the event and never modify it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::crypto::CryptoError;
use crate::core::crypto::sha256_canonical_hex;
use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TaskId;
use crate::core::run_event::RunEvent;
use crate::interfaces::EvaluatorResult;
use crate::interfaces::RunEvaluator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by run ledger operations.
#[derive(Debug, Error)]
pub enum RunLedgerError {
    /// Canonicalization of the event failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The event was already sealed.
    #[error("run event {0} is already sealed")]
    AlreadySealed(String),
}

// ============================================================================
// SECTION: Sealed Events
// ============================================================================

/// An immutable, evaluated run event.
///
/// # Invariants
/// - `content_hash` is the canonical hash of `event` at sealing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedRunEvent {
    /// The sealed event.
    pub event: RunEvent,
    /// Canonical content hash computed at sealing.
    pub content_hash: String,
    /// Evaluator results produced at sealing.
    pub evaluations: Vec<EvaluatorResult>,
}

// ============================================================================
// SECTION: Run Ledger
// ============================================================================

/// Ledger of sealed run events with an evaluator pipeline.
pub struct RunLedger {
    /// Sealed events in finalization order.
    sealed: Vec<SealedRunEvent>,
    /// Registered evaluators, run in registration order.
    evaluators: Vec<Box<dyn RunEvaluator>>,
}

impl RunLedger {
    /// Creates an empty ledger with no evaluators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sealed: Vec::new(),
            evaluators: Vec::new(),
        }
    }

    /// Registers an evaluator applied to every subsequently sealed event.
    pub fn register_evaluator(&mut self, evaluator: Box<dyn RunEvaluator>) {
        self.evaluators.push(evaluator);
    }

    /// Creates a new mutable run event.
    #[must_use]
    pub fn create_event(
        &self,
        task_id: TaskId,
        intent: impl Into<String>,
        guidance_hash: impl Into<String>,
        session_id: SessionId,
    ) -> RunEvent {
        RunEvent {
            event_id: EventId::uuid(),
            task_id,
            intent: intent.into(),
            guidance_hash: guidance_hash.into(),
            tools_used: Vec::new(),
            files_touched: Vec::new(),
            violations: Vec::new(),
            outcome_accepted: false,
            duration_ms: 0,
            session_id,
        }
    }

    /// Seals an event: hashes it, runs the evaluators, and stores the result.
    ///
    /// # Errors
    ///
    /// Returns [`RunLedgerError::AlreadySealed`] when the event identifier is
    /// already present, or a crypto error when hashing fails.
    pub fn finalize_event(&mut self, event: RunEvent) -> Result<&SealedRunEvent, RunLedgerError> {
        if self.get(&event.event_id).is_some() {
            return Err(RunLedgerError::AlreadySealed(event.event_id.as_str().to_string()));
        }
        let content_hash = sha256_canonical_hex(&event)?;
        let evaluations =
            self.evaluators.iter().map(|evaluator| evaluator.evaluate(&event)).collect();
        self.sealed.push(SealedRunEvent {
            event,
            content_hash,
            evaluations,
        });
        // push guarantees a last element
        let index = self.sealed.len() - 1;
        Ok(&self.sealed[index])
    }

    /// Returns a sealed event by identifier.
    #[must_use]
    pub fn get(&self, event_id: &EventId) -> Option<&SealedRunEvent> {
        self.sealed.iter().find(|sealed| &sealed.event.event_id == event_id)
    }

    /// Returns every sealed event in finalization order.
    #[must_use]
    pub fn sealed_events(&self) -> &[SealedRunEvent] {
        &self.sealed
    }
}

impl Default for RunLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLedger")
            .field("sealed", &self.sealed.len())
            .field("evaluators", &self.evaluators.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Stock Evaluators
// ============================================================================

/// Evaluator failing runs that exceed a violation budget.
#[derive(Debug, Clone, Copy)]
pub struct ViolationCountEvaluator {
    /// Maximum violations tolerated.
    pub max_violations: usize,
}

impl RunEvaluator for ViolationCountEvaluator {
    fn name(&self) -> &'static str {
        "violation-count"
    }

    fn evaluate(&self, event: &RunEvent) -> EvaluatorResult {
        let count = event.violations.len();
        let passed = count <= self.max_violations;
        let score = if count == 0 {
            1.0
        } else {
            (self.max_violations as f64 / count as f64).min(1.0)
        };
        EvaluatorResult {
            evaluator: self.name().to_string(),
            passed,
            score,
            notes: format!("{count} violation(s), budget {}", self.max_violations),
        }
    }
}

/// Evaluator failing runs that outlast a duration budget.
#[derive(Debug, Clone, Copy)]
pub struct DurationThresholdEvaluator {
    /// Maximum tolerated duration in milliseconds.
    pub max_duration_ms: u64,
}

impl RunEvaluator for DurationThresholdEvaluator {
    fn name(&self) -> &'static str {
        "duration-threshold"
    }

    fn evaluate(&self, event: &RunEvent) -> EvaluatorResult {
        let passed = event.duration_ms <= self.max_duration_ms;
        let score = if event.duration_ms == 0 {
            1.0
        } else {
            (self.max_duration_ms as f64 / event.duration_ms as f64).min(1.0)
        };
        EvaluatorResult {
            evaluator: self.name().to_string(),
            passed,
            score,
            notes: format!("{} ms against a {} ms budget", event.duration_ms, self.max_duration_ms),
        }
    }
}
