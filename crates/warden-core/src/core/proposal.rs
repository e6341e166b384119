// crates/warden-core/src/core/proposal.rs
// ============================================================================
// Module: Warden Change Proposals
// Description: Signed change proposals, simulation results, staged rollouts.
// Purpose: Model the records flowing through the evolution pipeline.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! System evolution flows through signed [`ChangeProposal`] records. A
//! proposal is simulated against golden traces, compared, staged through a
//! percentage rollout, and finally promoted or rolled back. Proposal
//! signatures cover every field except `signature` and `status`, so status
//! transitions never invalidate the signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProposalId;
use crate::core::identifiers::RolloutId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Proposal Kind and Status
// ============================================================================

/// Change proposal kinds accepted by the evolution pipeline.
///
/// # Invariants
/// - Variants are stable for serialization and audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalKind {
    /// Modify an existing rule.
    RuleModify,
    /// Add a new rule.
    RuleAdd,
    /// Remove a rule.
    RuleRemove,
    /// Promote a rule to a stricter tier.
    RulePromote,
    /// Update a policy bundle.
    PolicyUpdate,
    /// Change tool gateway configuration.
    ToolConfig,
    /// Adjust budget limits.
    BudgetAdjust,
}

/// Proposal lifecycle status.
///
/// # Invariants
/// - Transitions follow `draft → signed → simulating → compared →
///   (rejected | staged) → (rolled-back | promoted)`.
/// - `rejected`, `rolled-back`, and `promoted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalStatus {
    /// Unsigned draft.
    Draft,
    /// Signed and awaiting simulation.
    Signed,
    /// Simulation in progress or complete, awaiting comparison.
    Simulating,
    /// Comparison approved, awaiting staging.
    Compared,
    /// Comparison rejected the proposal.
    Rejected,
    /// Rollout staged and in progress.
    Staged,
    /// Rollout breached a threshold or was explicitly rolled back.
    RolledBack,
    /// All stages passed and the change was promoted.
    Promoted,
}

impl ProposalStatus {
    /// Returns the stable kebab-case label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Signed => "signed",
            Self::Simulating => "simulating",
            Self::Compared => "compared",
            Self::Rejected => "rejected",
            Self::Staged => "staged",
            Self::RolledBack => "rolled-back",
            Self::Promoted => "promoted",
        }
    }

    /// Returns whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::RolledBack | Self::Promoted)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Risk Assessment
// ============================================================================

/// Risk tier declared by the proposal author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    /// Low blast radius.
    Low,
    /// Moderate blast radius.
    Medium,
    /// High blast radius.
    High,
}

/// Author-declared risk assessment.
///
/// # Invariants
/// - `factors` name concrete risks, not generic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Declared risk tier.
    pub level: RiskLevel,
    /// Named risk factors.
    pub factors: Vec<String>,
}

// ============================================================================
// SECTION: Proposal Diff
// ============================================================================

/// Before/after payload pair for the proposed change.
///
/// # Invariants
/// - Payloads are opaque to the pipeline; only simulation interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDiff {
    /// Configuration before the change.
    pub before: String,
    /// Configuration after the change.
    pub after: String,
}

// ============================================================================
// SECTION: Change Proposal
// ============================================================================

/// Signed, typed request to modify a rule, policy, tool config, or budget.
///
/// # Invariants
/// - `signature` covers every field except `signature` and `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeProposal {
    /// Proposal identifier.
    pub proposal_id: ProposalId,
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
    /// HMAC-SHA256 signature over the canonical body.
    pub signature: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Lifecycle status, excluded from the signed body.
    pub status: ProposalStatus,
}

// ============================================================================
// SECTION: Simulation Results
// ============================================================================

/// Severity class of one decision divergence.
///
/// # Invariants
/// - Divergence weights are `low=0.1, medium=0.4, high=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffSeverity {
    /// Payload-only divergence.
    Low,
    /// Same event shape with a different decision.
    Medium,
    /// Structural divergence or a missing counterpart.
    High,
}

impl DiffSeverity {
    /// Returns the divergence weight for the severity class.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Low => 0.1,
            Self::Medium => 0.4,
            Self::High => 1.0,
        }
    }
}

/// One decision emitted by an evaluator for a golden trace position.
///
/// # Invariants
/// - `payload_hash` is the canonical hash of the evaluator payload at this
///   position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// Event type the decision applies to.
    pub event_type: String,
    /// Decision string.
    pub decision: String,
    /// Canonical hash of the decision payload.
    pub payload_hash: String,
}

/// One divergence between baseline and candidate decisions.
///
/// # Invariants
/// - `seq` is the global position across the simulated traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionDiff {
    /// Global decision position.
    pub seq: u64,
    /// Baseline decision, absent when the baseline produced fewer decisions.
    pub baseline: Option<DecisionEntry>,
    /// Candidate decision, absent when the candidate produced fewer decisions.
    pub candidate: Option<DecisionEntry>,
    /// Divergence severity class.
    pub severity: DiffSeverity,
}

/// Aggregated metric means for baseline and candidate variants.
///
/// # Invariants
/// - Values are arithmetic means across the simulated traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsComparison {
    /// Baseline metric means keyed by metric name.
    pub baseline: BTreeMap<String, f64>,
    /// Candidate metric means keyed by metric name.
    pub candidate: BTreeMap<String, f64>,
}

/// Result of simulating a proposal over golden traces.
///
/// # Invariants
/// - `divergence_score` lies within `[0, 1]`; identical composite hashes
///   force it to `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Proposal the simulation belongs to.
    pub proposal_id: ProposalId,
    /// Composite decision hash under the baseline variant.
    pub baseline_trace_hash: String,
    /// Composite decision hash under the candidate variant.
    pub candidate_trace_hash: String,
    /// Weighted divergence in `[0, 1]`.
    pub divergence_score: f64,
    /// Individual decision divergences.
    pub decision_diffs: Vec<DecisionDiff>,
    /// Aggregated metric means per variant.
    pub metrics_comparison: MetricsComparison,
    /// Whether the simulation passed the divergence bound.
    pub passed: bool,
    /// Explanation of the outcome.
    pub reason: String,
}

// ============================================================================
// SECTION: Staged Rollout
// ============================================================================

/// Metrics observed while a rollout stage was live.
///
/// # Invariants
/// - `divergence` is compared against the stage's threshold on advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StageMetrics {
    /// Observed divergence for the stage population.
    pub divergence: f64,
    /// Additional observed metrics keyed by name.
    pub metrics: BTreeMap<String, f64>,
}

/// One percentage stage of a rollout.
///
/// # Invariants
/// - `passed` is `None` until the stage is adjudicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutStage {
    /// Stage name.
    pub name: String,
    /// Population percentage exposed to the change.
    pub percentage: u8,
    /// Minimum stage duration in milliseconds.
    pub duration_ms: u64,
    /// Metrics recorded when the stage was adjudicated.
    pub metrics: Option<StageMetrics>,
    /// Divergence threshold that triggers auto-rollback.
    pub divergence_threshold: f64,
    /// Tri-state adjudication outcome.
    pub passed: Option<bool>,
    /// When the stage started.
    pub started_at: Option<Timestamp>,
    /// When the stage was adjudicated.
    pub completed_at: Option<Timestamp>,
}

impl RolloutStage {
    /// Creates an unadjudicated stage definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        percentage: u8,
        duration_ms: u64,
        divergence_threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            percentage,
            duration_ms,
            metrics: None,
            divergence_threshold,
            passed: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Rollout lifecycle status.
///
/// # Invariants
/// - `rolled-back` and `completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RolloutStatus {
    /// Stages are still advancing.
    InProgress,
    /// Every stage passed.
    Completed,
    /// A threshold breach or explicit rollback ended the rollout.
    RolledBack,
}

impl RolloutStatus {
    /// Returns the stable kebab-case label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::RolledBack => "rolled-back",
        }
    }
}

impl fmt::Display for RolloutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staged rollout state for one proposal.
///
/// # Invariants
/// - `current_stage` never decreases; a rolled-back rollout is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRollout {
    /// Rollout identifier.
    pub rollout_id: RolloutId,
    /// Proposal being rolled out.
    pub proposal_id: ProposalId,
    /// Ordered rollout stages.
    pub stages: Vec<RolloutStage>,
    /// Index of the active stage.
    pub current_stage: usize,
    /// Rollout status.
    pub status: RolloutStatus,
    /// When the rollout was staged.
    pub created_at: Timestamp,
}

/// Returns the default canary → partial → full stage plan.
#[must_use]
pub fn default_stages() -> Vec<RolloutStage> {
    vec![
        RolloutStage::new("canary", 5, 60_000, 0.20),
        RolloutStage::new("partial", 50, 300_000, 0.25),
        RolloutStage::new("full", 100, 600_000, 0.30),
    ]
}
