// crates/warden-core/tests/evolution.rs
// ============================================================================
// Module: Evolution Pipeline Tests
// Description: Verifies the proposal status machine and simulation math.
// ============================================================================
//! ## Overview
//! Ensures proposals are signed at creation, simulations compute divergence
//! exactly, comparisons reject divergent or regressing candidates, and the
//! status machine rejects out-of-order operations and unknown identifiers.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use warden_core::DecisionEntry;
use warden_core::EvolutionConfig;
use warden_core::EvolutionError;
use warden_core::EvolutionPipeline;
use warden_core::GoldenTrace;
use warden_core::ManualClock;
use warden_core::MetricsComparison;
use warden_core::ProposalDiff;
use warden_core::ProposalDraft;
use warden_core::ProposalId;
use warden_core::ProposalKind;
use warden_core::ProposalStatus;
use warden_core::RiskAssessment;
use warden_core::RiskLevel;
use warden_core::SigningKey;
use warden_core::SimulationResult;
use warden_core::TraceEvaluator;
use warden_core::Variant;
use warden_core::runtime::EvaluationOutput;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn pipeline() -> EvolutionPipeline<ManualClock> {
    EvolutionPipeline::new(
        SigningKey::new(b"evolution-test-key").expect("key"),
        EvolutionConfig::default(),
        ManualClock::new(1_700_000_000_000),
    )
}

fn draft(title: &str) -> ProposalDraft {
    ProposalDraft {
        kind: ProposalKind::RuleModify,
        title: title.to_string(),
        description: "tighten the destructive-ops rule set".to_string(),
        author: "policy-team".to_string(),
        target_path: "gates/destructive".to_string(),
        diff: ProposalDiff {
            before: "threshold: 300".to_string(),
            after: "threshold: 200".to_string(),
        },
        rationale: "large diffs slipped through review".to_string(),
        risk_assessment: RiskAssessment {
            level: RiskLevel::Low,
            factors: vec!["rule scope is advisory".to_string()],
        },
    }
}

fn golden(trace_id: &str) -> GoldenTrace {
    GoldenTrace {
        trace_id: trace_id.to_string(),
        events: Vec::new(),
    }
}

/// Evaluator emitting identical decisions for both variants.
struct IdenticalEvaluator;

impl TraceEvaluator for IdenticalEvaluator {
    fn evaluate(&self, trace: &GoldenTrace, _variant: Variant) -> EvaluationOutput {
        EvaluationOutput {
            decisions: vec![DecisionEntry {
                event_type: "tool_invoke".to_string(),
                decision: format!("allow:{}", trace.trace_id),
                payload_hash: "0".repeat(64),
            }],
            metrics: BTreeMap::from([("accuracy".to_string(), 0.95)]),
        }
    }
}

/// Evaluator whose candidate flips one decision per trace.
struct FlippingEvaluator;

impl TraceEvaluator for FlippingEvaluator {
    fn evaluate(&self, _trace: &GoldenTrace, variant: Variant) -> EvaluationOutput {
        let decision = match variant {
            Variant::Baseline => "allow",
            Variant::Candidate => "block",
        };
        EvaluationOutput {
            decisions: vec![DecisionEntry {
                event_type: "tool_invoke".to_string(),
                decision: decision.to_string(),
                payload_hash: "0".repeat(64),
            }],
            metrics: BTreeMap::from([("accuracy".to_string(), 0.95)]),
        }
    }
}

// ============================================================================
// SECTION: Propose and Simulate
// ============================================================================

#[test]
fn propose_signs_and_marks_signed() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("tighten diff gate")).expect("propose");
    assert_eq!(proposal.status, ProposalStatus::Signed);
    assert_eq!(proposal.signature.len(), 64);
}

#[test]
fn identical_traces_short_circuit_to_zero_divergence() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("noop change")).expect("propose");
    let traces = [golden("g1"), golden("g2")];

    let result = pipeline
        .simulate(&proposal.proposal_id, &traces, &IdenticalEvaluator)
        .expect("simulate");
    assert_eq!(result.baseline_trace_hash, result.candidate_trace_hash);
    assert!((result.divergence_score - 0.0).abs() < f64::EPSILON);
    assert!(result.decision_diffs.is_empty());
    assert!(result.passed);
    assert_eq!(result.reason, "Identical decision traces");
}

#[test]
fn flipped_decision_scores_medium_weight() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("flip one decision")).expect("propose");
    let traces = [golden("g1")];

    let result = pipeline
        .simulate(&proposal.proposal_id, &traces, &FlippingEvaluator)
        .expect("simulate");
    // One medium diff (0.4) over trace_count x 5 = 5 units.
    assert!((result.divergence_score - 0.08).abs() < 1e-9);
    assert_eq!(result.decision_diffs.len(), 1);
    assert!(result.passed, "0.08 is within the default 0.3 bound");
}

#[test]
fn simulate_unknown_proposal_is_an_error() {
    let mut pipeline = pipeline();
    let err = pipeline
        .simulate(&ProposalId::new("missing"), &[golden("g1")], &IdenticalEvaluator)
        .unwrap_err();
    assert!(matches!(err, EvolutionError::UnknownProposal(_)));
}

// ============================================================================
// SECTION: Compare
// ============================================================================

#[test]
fn compare_approves_within_bounds() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("compare ok")).expect("propose");
    let result = pipeline
        .simulate(&proposal.proposal_id, &[golden("g1")], &IdenticalEvaluator)
        .expect("simulate");

    let verdict = pipeline.compare(&proposal.proposal_id, &result).expect("compare");
    assert!(verdict.approved);
    assert_eq!(
        pipeline.proposal(&proposal.proposal_id).map(|p| p.status),
        Some(ProposalStatus::Compared)
    );
}

#[test]
fn compare_rejects_high_divergence() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("too divergent")).expect("propose");
    let mut result = pipeline
        .simulate(&proposal.proposal_id, &[golden("g1")], &IdenticalEvaluator)
        .expect("simulate");
    result.divergence_score = 0.9;

    let verdict = pipeline.compare(&proposal.proposal_id, &result).expect("compare");
    assert!(!verdict.approved);
    assert_eq!(
        pipeline.proposal(&proposal.proposal_id).map(|p| p.status),
        Some(ProposalStatus::Rejected)
    );
}

#[test]
fn compare_rejects_metric_regression() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("regressed accuracy")).expect("propose");
    let mut result = pipeline
        .simulate(&proposal.proposal_id, &[golden("g1")], &IdenticalEvaluator)
        .expect("simulate");
    result.metrics_comparison = MetricsComparison {
        baseline: BTreeMap::from([("accuracy".to_string(), 1.0)]),
        candidate: BTreeMap::from([("accuracy".to_string(), 0.9)]),
    };

    let verdict = pipeline.compare(&proposal.proposal_id, &result).expect("compare");
    assert!(!verdict.approved);
    assert!(verdict.reason.contains("accuracy"));
}

#[test]
fn compare_result_for_wrong_proposal_is_an_error() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("mismatched result")).expect("propose");
    pipeline
        .simulate(&proposal.proposal_id, &[golden("g1")], &IdenticalEvaluator)
        .expect("simulate");

    let foreign = SimulationResult {
        proposal_id: ProposalId::new("someone-else"),
        baseline_trace_hash: String::new(),
        candidate_trace_hash: String::new(),
        divergence_score: 0.0,
        decision_diffs: Vec::new(),
        metrics_comparison: MetricsComparison::default(),
        passed: true,
        reason: String::new(),
    };
    let err = pipeline.compare(&proposal.proposal_id, &foreign).unwrap_err();
    assert!(matches!(err, EvolutionError::ResultMismatch { .. }));
}

// ============================================================================
// SECTION: Status Machine
// ============================================================================

#[test]
fn stage_requires_a_compared_proposal() {
    let mut pipeline = pipeline();
    let proposal = pipeline.propose(draft("not yet compared")).expect("propose");
    let err = pipeline.stage(&proposal.proposal_id).unwrap_err();
    assert!(matches!(err, EvolutionError::InvalidStatus { .. }));
}

#[test]
fn stage_clones_independent_stage_state() {
    let mut pipeline = pipeline();
    let first = pipeline.propose(draft("first")).expect("propose");
    let second = pipeline.propose(draft("second")).expect("propose");

    for proposal in [&first, &second] {
        let result = pipeline
            .simulate(&proposal.proposal_id, &[golden("g1")], &IdenticalEvaluator)
            .expect("simulate");
        pipeline.compare(&proposal.proposal_id, &result).expect("compare");
    }

    let rollout_a = pipeline.stage(&first.proposal_id).expect("stage a");
    let rollout_b = pipeline.stage(&second.proposal_id).expect("stage b");
    assert_ne!(rollout_a.rollout_id, rollout_b.rollout_id);
    assert_eq!(rollout_a.stages.len(), 3);
    assert_eq!(rollout_a.current_stage, 0);
    assert!(rollout_a.stages[0].started_at.is_some());
    assert!(rollout_a.stages[1].started_at.is_none());

    let stages: Vec<(&str, u8, f64)> = rollout_a
        .stages
        .iter()
        .map(|stage| (stage.name.as_str(), stage.percentage, stage.divergence_threshold))
        .collect();
    assert_eq!(stages, vec![("canary", 5, 0.20), ("partial", 50, 0.25), ("full", 100, 0.30)]);
}

#[test]
fn unknown_rollout_is_an_error() {
    let mut pipeline = pipeline();
    let err = pipeline
        .advance_stage(&warden_core::RolloutId::new("missing"), warden_core::StageMetrics::default())
        .unwrap_err();
    assert!(matches!(err, EvolutionError::UnknownRollout(_)));
}
