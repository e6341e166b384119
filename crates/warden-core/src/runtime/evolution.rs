// crates/warden-core/src/runtime/evolution.rs
// ============================================================================
// Module: Warden Evolution Pipeline
// Description: Propose, simulate, compare, stage, advance, rollback, promote.
// Purpose: Evolve rules, policies, tool config, and budgets without touching
//          live configuration until simulation and staged rollout pass.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Every configuration change flows through a signed [`ChangeProposal`]. The
//! pipeline simulates the change against golden traces under baseline and
//! candidate variants, compares divergence and metric regressions, stages a
//! percentage rollout, and promotes only when every stage passes. A stage
//! whose observed divergence breaches its threshold rolls the proposal back
//! automatically. Signatures are verified at every status transition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::crypto::CryptoError;
use crate::core::crypto::SigningKey;
use crate::core::crypto::sha256_canonical_hex;
use crate::core::crypto::sha256_hex;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::RolloutId;
use crate::core::proposal::ChangeProposal;
use crate::core::proposal::DecisionDiff;
use crate::core::proposal::DecisionEntry;
use crate::core::proposal::DiffSeverity;
use crate::core::proposal::MetricsComparison;
use crate::core::proposal::ProposalDiff;
use crate::core::proposal::ProposalKind;
use crate::core::proposal::ProposalStatus;
use crate::core::proposal::RiskAssessment;
use crate::core::proposal::RolloutStage;
use crate::core::proposal::RolloutStatus;
use crate::core::proposal::SimulationResult;
use crate::core::proposal::StageMetrics;
use crate::core::proposal::StagedRollout;
use crate::core::proposal::default_stages;
use crate::core::trace::TraceEvent;
use crate::interfaces::Clock;
use crate::interfaces::NoopTelemetry;
use crate::interfaces::TelemetryEvent;
use crate::interfaces::TelemetrySink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fields excluded from the proposal signature body.
const PROPOSAL_SIGNATURE_EXCLUDED: &[&str] = &["signature", "status"];

/// Divergence normalization weight per golden trace.
const DIVERGENCE_UNITS_PER_TRACE: f64 = 5.0;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by evolution pipeline operations.
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Canonicalization or signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The proposal identifier is unknown.
    #[error("unknown proposal '{0}'")]
    UnknownProposal(String),
    /// The rollout identifier is unknown.
    #[error("unknown rollout '{0}'")]
    UnknownRollout(String),
    /// The proposal is not in a status that permits the operation.
    #[error("proposal '{id}' is {found}, expected {expected}")]
    InvalidStatus {
        /// Proposal identifier.
        id: String,
        /// Status found.
        found: ProposalStatus,
        /// Status the operation requires.
        expected: &'static str,
    },
    /// The proposal signature failed verification.
    #[error("proposal '{0}' failed signature verification")]
    SignatureInvalid(String),
    /// A simulation result was presented for the wrong proposal.
    #[error("simulation result belongs to proposal '{result}', not '{expected}'")]
    ResultMismatch {
        /// Proposal the result claims.
        result: String,
        /// Proposal the operation targets.
        expected: String,
    },
    /// The rollout cannot be explicitly promoted yet.
    #[error("rollout '{0}' has unpassed stages and cannot be promoted")]
    StagesIncomplete(String),
}

// ============================================================================
// SECTION: Golden Traces and Evaluators
// ============================================================================

/// A pre-recorded trace used to simulate a proposal.
///
/// # Invariants
/// - Events are a well-formed trace of a previously sealed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenTrace {
    /// Trace identifier.
    pub trace_id: String,
    /// Recorded trace events.
    pub events: Vec<TraceEvent>,
}

/// Variant a golden trace is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Current live configuration.
    Baseline,
    /// Configuration with the proposal applied.
    Candidate,
}

/// Decisions and metrics produced by evaluating one trace under one variant.
///
/// # Invariants
/// - `decisions` are ordered by trace position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    /// Ordered decisions for the trace.
    pub decisions: Vec<DecisionEntry>,
    /// Metrics observed for the trace, keyed by name.
    pub metrics: BTreeMap<String, f64>,
}

/// Evaluator replaying golden traces under baseline and candidate variants.
pub trait TraceEvaluator {
    /// Evaluates one golden trace under the given variant.
    fn evaluate(&self, trace: &GoldenTrace, variant: Variant) -> EvaluationOutput;
}

// ============================================================================
// SECTION: Inputs and Outcomes
// ============================================================================

/// Author-provided proposal fields.
///
/// # Invariants
/// - The pipeline assigns identifier, signature, timestamps, and status.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalDraft {
    /// Proposal kind.
    pub kind: ProposalKind,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Proposal author.
    pub author: String,
    /// Path of the configuration object being changed.
    pub target_path: String,
    /// Before/after payloads.
    pub diff: ProposalDiff,
    /// Rationale for the change.
    pub rationale: String,
    /// Author-declared risk assessment.
    pub risk_assessment: RiskAssessment,
}

/// Verdict of comparing a simulation result against the acceptance bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareVerdict {
    /// Whether the proposal may be staged.
    pub approved: bool,
    /// Explanation of the verdict.
    pub reason: String,
}

/// Outcome of one stage advancement.
///
/// # Invariants
/// - `rolled_back` is `true` only when this call performed the rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    /// Whether the rollout advanced (or completed) this call.
    pub advanced: bool,
    /// Whether this call rolled the rollout back.
    pub rolled_back: bool,
    /// Whether this call promoted the proposal.
    pub promoted: bool,
    /// Explanation when the rollout did not advance.
    pub reason: Option<String>,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Evolution pipeline configuration.
///
/// # Invariants
/// - `max_divergence` and `metric_regression_tolerance` lie within `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionConfig {
    /// Maximum tolerated divergence score at comparison.
    pub max_divergence: f64,
    /// Maximum tolerated relative metric regression at comparison.
    pub metric_regression_tolerance: f64,
    /// Stage plan cloned into each new rollout.
    pub stages: Vec<RolloutStage>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_divergence: 0.3,
            metric_regression_tolerance: 0.05,
            stages: default_stages(),
        }
    }
}

// ============================================================================
// SECTION: Evolution Pipeline
// ============================================================================

/// Pipeline owning proposals, simulations, and rollouts.
///
/// # Invariants
/// - Live configuration is never mutated by the pipeline; it only records
///   what may be promoted.
pub struct EvolutionPipeline<C: Clock> {
    /// Signing key for proposal HMACs.
    key: SigningKey,
    /// Pipeline configuration.
    config: EvolutionConfig,
    /// Injected time source.
    clock: C,
    /// Proposals by identifier.
    proposals: BTreeMap<ProposalId, ChangeProposal>,
    /// Latest simulation result per proposal.
    simulations: BTreeMap<ProposalId, SimulationResult>,
    /// Rollouts by identifier.
    rollouts: BTreeMap<RolloutId, StagedRollout>,
    /// Telemetry sink for rollout transitions.
    telemetry: Box<dyn TelemetrySink>,
}

impl<C: Clock> EvolutionPipeline<C> {
    /// Creates a pipeline with the given key, configuration, and clock.
    #[must_use]
    pub fn new(key: SigningKey, config: EvolutionConfig, clock: C) -> Self {
        Self {
            key,
            config,
            clock,
            proposals: BTreeMap::new(),
            simulations: BTreeMap::new(),
            rollouts: BTreeMap::new(),
            telemetry: Box::new(NoopTelemetry),
        }
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Creates and signs a proposal; its status becomes `signed`.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] when signing fails.
    pub fn propose(&mut self, draft: ProposalDraft) -> Result<ChangeProposal, EvolutionError> {
        let mut proposal = ChangeProposal {
            proposal_id: ProposalId::uuid(),
            kind: draft.kind,
            title: draft.title,
            description: draft.description,
            author: draft.author,
            target_path: draft.target_path,
            diff: draft.diff,
            rationale: draft.rationale,
            risk_assessment: draft.risk_assessment,
            signature: String::new(),
            created_at: self.clock.now(),
            status: ProposalStatus::Draft,
        };
        proposal.signature = self.key.sign_body(&proposal, PROPOSAL_SIGNATURE_EXCLUDED)?;
        proposal.status = ProposalStatus::Signed;
        self.proposals.insert(proposal.proposal_id.clone(), proposal.clone());
        Ok(proposal)
    }

    /// Simulates a signed proposal over golden traces.
    ///
    /// Each trace is evaluated under both variants. The composite trace hash
    /// is `SHA-256(join(":", per_trace_hashes))`; identical baseline and
    /// candidate composites short-circuit to a zero divergence. Otherwise
    /// decision arrays are compared pairwise per trace and the weighted
    /// divergence is normalized against `trace_count x 5`.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] for unknown proposals, invalid status, bad
    /// signatures, or hashing failures.
    pub fn simulate(
        &mut self,
        proposal_id: &ProposalId,
        golden_traces: &[GoldenTrace],
        evaluator: &dyn TraceEvaluator,
    ) -> Result<SimulationResult, EvolutionError> {
        let status = self.verified_status(proposal_id)?;
        if !matches!(status, ProposalStatus::Signed | ProposalStatus::Simulating) {
            return Err(EvolutionError::InvalidStatus {
                id: proposal_id.as_str().to_string(),
                found: status,
                expected: "signed",
            });
        }
        self.set_proposal_status(proposal_id, ProposalStatus::Simulating);

        let mut baseline_hashes = Vec::new();
        let mut candidate_hashes = Vec::new();
        let mut baseline_outputs = Vec::new();
        let mut candidate_outputs = Vec::new();
        for trace in golden_traces {
            let baseline = evaluator.evaluate(trace, Variant::Baseline);
            let candidate = evaluator.evaluate(trace, Variant::Candidate);
            baseline_hashes.push(sha256_canonical_hex(&baseline.decisions)?);
            candidate_hashes.push(sha256_canonical_hex(&candidate.decisions)?);
            baseline_outputs.push(baseline);
            candidate_outputs.push(candidate);
        }

        let baseline_trace_hash = sha256_hex(baseline_hashes.join(":").as_bytes());
        let candidate_trace_hash = sha256_hex(candidate_hashes.join(":").as_bytes());

        let metrics_comparison = MetricsComparison {
            baseline: mean_metrics(&baseline_outputs),
            candidate: mean_metrics(&candidate_outputs),
        };

        let (divergence_score, decision_diffs) = if baseline_trace_hash == candidate_trace_hash {
            (0.0, Vec::new())
        } else {
            diff_decisions(&baseline_outputs, &candidate_outputs, golden_traces.len())
        };

        let passed = divergence_score <= self.config.max_divergence;
        let reason = if baseline_trace_hash == candidate_trace_hash {
            "Identical decision traces".to_string()
        } else if passed {
            format!(
                "Divergence {divergence_score:.3} within bound {:.3}",
                self.config.max_divergence
            )
        } else {
            format!(
                "Divergence {divergence_score:.3} exceeds bound {:.3}",
                self.config.max_divergence
            )
        };

        let result = SimulationResult {
            proposal_id: proposal_id.clone(),
            baseline_trace_hash,
            candidate_trace_hash,
            divergence_score,
            decision_diffs,
            metrics_comparison,
            passed,
            reason,
        };
        self.simulations.insert(proposal_id.clone(), result.clone());
        Ok(result)
    }

    /// Compares a simulation result against the acceptance bounds.
    ///
    /// Rejects when the divergence exceeds the bound or any metric regresses
    /// by more than the configured relative tolerance. Approval moves the
    /// proposal to `compared`; rejection is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] for unknown proposals, invalid status,
    /// signature failures, or a result belonging to another proposal.
    pub fn compare(
        &mut self,
        proposal_id: &ProposalId,
        result: &SimulationResult,
    ) -> Result<CompareVerdict, EvolutionError> {
        if &result.proposal_id != proposal_id {
            return Err(EvolutionError::ResultMismatch {
                result: result.proposal_id.as_str().to_string(),
                expected: proposal_id.as_str().to_string(),
            });
        }
        let max_divergence = self.config.max_divergence;
        let tolerance = self.config.metric_regression_tolerance;
        let status = self.verified_status(proposal_id)?;
        if status != ProposalStatus::Simulating {
            return Err(EvolutionError::InvalidStatus {
                id: proposal_id.as_str().to_string(),
                found: status,
                expected: "simulating",
            });
        }

        if result.divergence_score > max_divergence {
            self.set_proposal_status(proposal_id, ProposalStatus::Rejected);
            return Ok(CompareVerdict {
                approved: false,
                reason: format!(
                    "Divergence {:.3} exceeds the maximum {max_divergence:.3}",
                    result.divergence_score
                ),
            });
        }

        if let Some(regressed) = first_regression(&result.metrics_comparison, tolerance) {
            let reason = format!(
                "Metric '{regressed}' regressed by more than {:.0}%",
                tolerance * 100.0
            );
            self.set_proposal_status(proposal_id, ProposalStatus::Rejected);
            return Ok(CompareVerdict {
                approved: false,
                reason,
            });
        }

        self.set_proposal_status(proposal_id, ProposalStatus::Compared);
        Ok(CompareVerdict {
            approved: true,
            reason: "Divergence and metrics within bounds".to_string(),
        })
    }

    /// Stages a compared proposal, starting stage zero immediately.
    ///
    /// The stage plan is deep-cloned from configuration so each rollout owns
    /// independent stage state.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] for unknown proposals, invalid status, or
    /// signature failures.
    pub fn stage(&mut self, proposal_id: &ProposalId) -> Result<StagedRollout, EvolutionError> {
        let now = self.clock.now();
        let status = self.verified_status(proposal_id)?;
        if status != ProposalStatus::Compared {
            return Err(EvolutionError::InvalidStatus {
                id: proposal_id.as_str().to_string(),
                found: status,
                expected: "compared",
            });
        }
        self.set_proposal_status(proposal_id, ProposalStatus::Staged);

        let mut stages = self.config.stages.clone();
        if let Some(first) = stages.first_mut() {
            first.started_at = Some(now);
        }
        let rollout = StagedRollout {
            rollout_id: RolloutId::uuid(),
            proposal_id: proposal_id.clone(),
            stages,
            current_stage: 0,
            status: RolloutStatus::InProgress,
            created_at: now,
        };
        self.rollouts.insert(rollout.rollout_id.clone(), rollout.clone());
        Ok(rollout)
    }

    /// Adjudicates the current stage with observed metrics.
    ///
    /// A divergence above the stage threshold rolls the proposal back
    /// automatically and is terminal. Passing the final stage promotes the
    /// proposal. Advancing a terminal rollout reports the state without
    /// mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::UnknownRollout`] when the rollout does not
    /// exist.
    pub fn advance_stage(
        &mut self,
        rollout_id: &RolloutId,
        stage_metrics: StageMetrics,
    ) -> Result<AdvanceOutcome, EvolutionError> {
        let now = self.clock.now();
        let rollout = self
            .rollouts
            .get_mut(rollout_id)
            .ok_or_else(|| EvolutionError::UnknownRollout(rollout_id.as_str().to_string()))?;

        if rollout.status != RolloutStatus::InProgress {
            return Ok(AdvanceOutcome {
                advanced: false,
                rolled_back: false,
                promoted: false,
                reason: Some(format!(
                    "Rollout is {}, not in-progress",
                    rollout.status.as_str()
                )),
            });
        }

        let stage_index = rollout.current_stage;
        let Some(stage) = rollout.stages.get_mut(stage_index) else {
            return Ok(AdvanceOutcome {
                advanced: false,
                rolled_back: false,
                promoted: false,
                reason: Some("Rollout has no remaining stages".to_string()),
            });
        };

        let divergence = stage_metrics.divergence;
        let threshold = stage.divergence_threshold;
        let stage_name = stage.name.clone();
        stage.metrics = Some(stage_metrics);
        stage.completed_at = Some(now);

        if divergence > threshold {
            stage.passed = Some(false);
            rollout.status = RolloutStatus::RolledBack;
            let proposal_id = rollout.proposal_id.clone();
            self.set_proposal_status(&proposal_id, ProposalStatus::RolledBack);
            self.telemetry.record(TelemetryEvent::RolloutTransition {
                rollout_id: rollout_id.as_str().to_string(),
                stage: stage_name,
                transition: "rolled-back".to_string(),
            });
            return Ok(AdvanceOutcome {
                advanced: false,
                rolled_back: true,
                promoted: false,
                reason: Some(format!(
                    "Stage divergence {divergence:.3} breached threshold {threshold:.3}"
                )),
            });
        }

        stage.passed = Some(true);
        let final_stage = stage_index + 1 == rollout.stages.len();
        if final_stage {
            rollout.status = RolloutStatus::Completed;
            let proposal_id = rollout.proposal_id.clone();
            self.set_proposal_status(&proposal_id, ProposalStatus::Promoted);
            self.telemetry.record(TelemetryEvent::RolloutTransition {
                rollout_id: rollout_id.as_str().to_string(),
                stage: stage_name,
                transition: "promoted".to_string(),
            });
            return Ok(AdvanceOutcome {
                advanced: true,
                rolled_back: false,
                promoted: true,
                reason: None,
            });
        }

        rollout.current_stage = stage_index + 1;
        if let Some(next) = rollout.stages.get_mut(stage_index + 1) {
            next.started_at = Some(now);
        }
        self.telemetry.record(TelemetryEvent::RolloutTransition {
            rollout_id: rollout_id.as_str().to_string(),
            stage: stage_name,
            transition: "advanced".to_string(),
        });
        Ok(AdvanceOutcome {
            advanced: true,
            rolled_back: false,
            promoted: false,
            reason: None,
        })
    }

    /// Explicitly rolls back an in-progress rollout.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] when the rollout is unknown or already
    /// terminal.
    pub fn rollback(
        &mut self,
        rollout_id: &RolloutId,
        reason: &str,
    ) -> Result<(), EvolutionError> {
        let rollout = self
            .rollouts
            .get_mut(rollout_id)
            .ok_or_else(|| EvolutionError::UnknownRollout(rollout_id.as_str().to_string()))?;
        if rollout.status != RolloutStatus::InProgress {
            return Err(EvolutionError::UnknownRollout(format!(
                "{} is already {}",
                rollout_id.as_str(),
                rollout.status.as_str()
            )));
        }
        let stage_name = rollout
            .stages
            .get(rollout.current_stage)
            .map_or_else(String::new, |stage| stage.name.clone());
        rollout.status = RolloutStatus::RolledBack;
        let proposal_id = rollout.proposal_id.clone();
        self.set_proposal_status(&proposal_id, ProposalStatus::RolledBack);
        self.telemetry.record(TelemetryEvent::RolloutTransition {
            rollout_id: rollout_id.as_str().to_string(),
            stage: stage_name,
            transition: format!("rolled-back: {reason}"),
        });
        Ok(())
    }

    /// Explicitly promotes a rollout whose stages have all passed.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError`] when the rollout is unknown, terminal, or
    /// has unpassed stages.
    pub fn promote(&mut self, rollout_id: &RolloutId) -> Result<(), EvolutionError> {
        let rollout = self
            .rollouts
            .get_mut(rollout_id)
            .ok_or_else(|| EvolutionError::UnknownRollout(rollout_id.as_str().to_string()))?;
        if rollout.status != RolloutStatus::InProgress {
            return Err(EvolutionError::UnknownRollout(format!(
                "{} is already {}",
                rollout_id.as_str(),
                rollout.status.as_str()
            )));
        }
        if !rollout.stages.iter().all(|stage| stage.passed == Some(true)) {
            return Err(EvolutionError::StagesIncomplete(rollout_id.as_str().to_string()));
        }
        rollout.status = RolloutStatus::Completed;
        let proposal_id = rollout.proposal_id.clone();
        self.set_proposal_status(&proposal_id, ProposalStatus::Promoted);
        Ok(())
    }

    /// Returns a proposal by identifier.
    #[must_use]
    pub fn proposal(&self, proposal_id: &ProposalId) -> Option<&ChangeProposal> {
        self.proposals.get(proposal_id)
    }

    /// Returns the latest simulation result for a proposal.
    #[must_use]
    pub fn simulation(&self, proposal_id: &ProposalId) -> Option<&SimulationResult> {
        self.simulations.get(proposal_id)
    }

    /// Returns a rollout by identifier.
    #[must_use]
    pub fn rollout(&self, rollout_id: &RolloutId) -> Option<&StagedRollout> {
        self.rollouts.get(rollout_id)
    }

    /// Looks up a proposal, verifies its signature, and returns its status.
    fn verified_status(&self, proposal_id: &ProposalId) -> Result<ProposalStatus, EvolutionError> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .ok_or_else(|| EvolutionError::UnknownProposal(proposal_id.as_str().to_string()))?;
        verify_signature(&self.key, proposal)?;
        Ok(proposal.status)
    }

    /// Sets a proposal's status, ignoring unknown identifiers.
    fn set_proposal_status(&mut self, proposal_id: &ProposalId, status: ProposalStatus) {
        if let Some(proposal) = self.proposals.get_mut(proposal_id) {
            proposal.status = status;
        }
    }
}

impl<C: Clock> std::fmt::Debug for EvolutionPipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionPipeline")
            .field("proposals", &self.proposals.len())
            .field("rollouts", &self.rollouts.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Signature Verification
// ============================================================================

/// Verifies a proposal signature over the canonical body.
fn verify_signature(key: &SigningKey, proposal: &ChangeProposal) -> Result<(), EvolutionError> {
    if key.verify_body(proposal, PROPOSAL_SIGNATURE_EXCLUDED, &proposal.signature) {
        Ok(())
    } else {
        Err(EvolutionError::SignatureInvalid(proposal.proposal_id.as_str().to_string()))
    }
}

// ============================================================================
// SECTION: Divergence Computation
// ============================================================================

/// Computes per-position decision diffs and the normalized divergence score.
fn diff_decisions(
    baseline_outputs: &[EvaluationOutput],
    candidate_outputs: &[EvaluationOutput],
    trace_count: usize,
) -> (f64, Vec<DecisionDiff>) {
    let mut diffs = Vec::new();
    let mut weight_sum = 0.0;
    let mut global_seq = 0_u64;

    for (baseline, candidate) in baseline_outputs.iter().zip(candidate_outputs) {
        let positions = baseline.decisions.len().max(candidate.decisions.len());
        for index in 0 .. positions {
            let left = baseline.decisions.get(index);
            let right = candidate.decisions.get(index);
            if let Some(severity) = classify_divergence(left, right) {
                weight_sum += severity.weight();
                diffs.push(DecisionDiff {
                    seq: global_seq,
                    baseline: left.cloned(),
                    candidate: right.cloned(),
                    severity,
                });
            }
            global_seq += 1;
        }
    }

    let normalizer = (trace_count.max(1) as f64) * DIVERGENCE_UNITS_PER_TRACE;
    let score = (weight_sum / normalizer).clamp(0.0, 1.0);
    (score, diffs)
}

/// Classifies one decision pair; `None` when the decisions agree.
///
/// A missing counterpart or a structural (event-type) mismatch is `high`,
/// a decision mismatch on the same shape is `medium`, and a payload-only
/// mismatch is `low`.
fn classify_divergence(
    baseline: Option<&DecisionEntry>,
    candidate: Option<&DecisionEntry>,
) -> Option<DiffSeverity> {
    match (baseline, candidate) {
        (None, None) => None,
        (None, Some(_)) | (Some(_), None) => Some(DiffSeverity::High),
        (Some(left), Some(right)) => {
            if left.event_type != right.event_type {
                Some(DiffSeverity::High)
            } else if left.decision != right.decision {
                Some(DiffSeverity::Medium)
            } else if left.payload_hash != right.payload_hash {
                Some(DiffSeverity::Low)
            } else {
                None
            }
        }
    }
}

// ============================================================================
// SECTION: Metric Aggregation
// ============================================================================

/// Aggregates per-trace metrics into arithmetic means per key.
fn mean_metrics(outputs: &[EvaluationOutput]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for output in outputs {
        for (name, value) in &output.metrics {
            let entry = sums.entry(name.clone()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / count.max(1) as f64))
        .collect()
}

/// Returns the first metric regressing beyond the relative tolerance.
///
/// Metrics are higher-is-better: a candidate mean below
/// `baseline x (1 - tolerance)` is a regression. Non-positive baselines are
/// skipped; relative comparison is undefined for them.
fn first_regression(comparison: &MetricsComparison, tolerance: f64) -> Option<&str> {
    for (name, baseline) in &comparison.baseline {
        if *baseline <= 0.0 {
            continue;
        }
        if let Some(candidate) = comparison.candidate.get(name)
            && *candidate < baseline * (1.0 - tolerance)
        {
            return Some(name.as_str());
        }
    }
    None
}
