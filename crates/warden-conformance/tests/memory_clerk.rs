// crates/warden-conformance/tests/memory_clerk.rs
// ============================================================================
// Module: Memory Clerk Acceptance Tests
// Description: The canonical conformance run and its literal post-conditions.
// ============================================================================
//! ## Overview
//! Runs the memory clerk scenario (twenty reads, one inference, five writes
//! with a coherence collapse before the third) and checks every acceptance
//! post-condition literally, then replays the trace and verifies that any
//! mutated decision surfaces as a divergence.

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

use warden_conformance::MemoryClerkCell;
use warden_conformance::ReplayVerifier;
use warden_conformance::RunOutcome;
use warden_conformance::RunReport;
use warden_conformance::RuntimeConfig;
use warden_conformance::SimulatedRuntime;
use warden_core::AgentId;
use warden_core::MemoryAuthority;
use warden_core::TraceEventType;
use warden_core::validate_trace;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn clerk_authority() -> MemoryAuthority {
    MemoryAuthority {
        agent_id: AgentId::new("memory-clerk"),
        role: "clerk".to_string(),
        namespaces: vec!["notes".to_string()],
        max_writes_per_minute: 30,
        can_delete: false,
        can_overwrite: true,
        trust_level: 0.9,
    }
}

fn canonical_run() -> (SimulatedRuntime, RunReport) {
    let config = RuntimeConfig::new(clerk_authority(), "d".repeat(64));
    let mut runtime = SimulatedRuntime::new(config).expect("runtime");
    let report = MemoryClerkCell::default().run(&mut runtime).expect("clerk run");
    (runtime, report)
}

// ============================================================================
// SECTION: Acceptance
// ============================================================================

#[test]
fn clerk_counts_match_the_acceptance_numbers() {
    let (_runtime, report) = canonical_run();
    assert_eq!(report.memory_reads, 20);
    assert_eq!(report.memory_writes_attempted, 5);
    assert_eq!(report.memory_writes_committed, 2);
    assert_eq!(report.memory_writes_blocked, 3);
    assert_eq!(report.outcome, RunOutcome::Restricted);
}

#[test]
fn clerk_seals_exactly_one_verified_envelope() {
    let (runtime, report) = canonical_run();
    assert_eq!(runtime.chain().len(), 1);
    assert!(runtime.chain().verify_chain());
    assert!(runtime.chain().verify(&report.envelope));
}

#[test]
fn clerk_lineage_holds_reads_plus_commits() {
    let (_runtime, report) = canonical_run();
    assert_eq!(report.envelope.memory_lineage.len(), 22, "20 reads + 2 commits");
}

#[test]
fn clerk_trace_is_bounded_by_run_events() {
    let (runtime, _report) = canonical_run();
    let trace = runtime.trace();
    assert_eq!(trace.first().map(|event| event.event_type), Some(TraceEventType::RunStart));
    assert_eq!(trace.last().map(|event| event.event_type), Some(TraceEventType::RunEnd));
}

#[test]
fn clerk_trace_is_well_formed() {
    let (runtime, _report) = canonical_run();
    assert!(validate_trace(runtime.trace()).is_ok());
}

#[test]
fn clerk_emits_exactly_one_privilege_collapse() {
    let (runtime, _report) = canonical_run();
    let changes: Vec<&str> = runtime
        .trace()
        .iter()
        .filter(|event| event.event_type == TraceEventType::PrivilegeChange)
        .map(|event| event.decision.as_str())
        .collect();
    assert_eq!(changes, vec!["full->suspended"]);
}

#[test]
fn clerk_checks_coherence_once_per_write() {
    let (runtime, _report) = canonical_run();
    let checks = runtime
        .trace()
        .iter()
        .filter(|event| event.event_type == TraceEventType::CoherenceCheck)
        .count();
    assert_eq!(checks, 5);
}

#[test]
fn committed_writes_never_follow_the_collapse() {
    let (runtime, _report) = canonical_run();
    let collapse_seq = runtime
        .trace()
        .iter()
        .find(|event| event.event_type == TraceEventType::PrivilegeChange)
        .map(|event| event.seq)
        .expect("privilege change");
    for event in runtime.trace() {
        if event.event_type == TraceEventType::MemoryWriteCommitted {
            assert!(event.seq < collapse_seq, "no commit may follow the collapse");
        }
    }
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

#[test]
fn artifacts_recorded_mid_run_carry_run_lineage() {
    let config = RuntimeConfig::new(clerk_authority(), "d".repeat(64));
    let mut runtime = SimulatedRuntime::new(config).expect("runtime");
    runtime.seed_entry("knowledge", "fact-00", serde_json::json!({"fact": 0}));

    let event_id = runtime
        .start_run(warden_core::TaskId::new("artifact-run"), "file one fact")
        .expect("start");
    warden_core::CellRuntime::memory_read(&mut runtime, "knowledge", "fact-00").expect("read");

    let artifact = runtime
        .record_artifact(
            warden_core::ArtifactKind::Report,
            "filing-summary",
            "summary of filed facts",
            warden_core::ArtifactContent::Text("one fact filed".to_string()),
            vec!["conformance".to_string()],
        )
        .expect("artifact");

    assert_eq!(
        artifact.lineage.source_run_id.as_ref().map(warden_core::RunId::as_str),
        Some(event_id.as_str())
    );
    assert_eq!(artifact.lineage.memory_reads, vec!["knowledge/fact-00".to_string()]);
    assert!(runtime.artifacts().verify(&artifact.artifact_id).verified);

    runtime.end_run().expect("end");
}

// ============================================================================
// SECTION: Replay
// ============================================================================

#[test]
fn replay_re_derives_every_decision() {
    let (runtime, _report) = canonical_run();
    let verifier = ReplayVerifier::new(*runtime.thresholds());
    let report = verifier.verify(runtime.trace());
    assert!(report.verified(), "divergences: {:?}", report.divergences);
    assert_eq!(report.events_checked, runtime.trace().len());
}

#[test]
fn mutated_decision_diverges_at_that_seq() {
    let (runtime, _report) = canonical_run();
    let verifier = ReplayVerifier::new(*runtime.thresholds());

    for target_seq in [0_u64, 5, 21, 23] {
        let mut trace = runtime.trace().to_vec();
        let index = usize::try_from(target_seq).expect("index");
        trace[index].decision = "tampered".to_string();

        let report = verifier.verify(&trace);
        assert_eq!(report.divergences.len(), 1, "seq {target_seq}");
        assert_eq!(report.divergences[0].seq, target_seq);
    }
}

#[test]
fn reordered_trace_is_malformed() {
    let (runtime, _report) = canonical_run();
    let mut trace = runtime.trace().to_vec();
    trace.swap(3, 4);

    let verifier = ReplayVerifier::new(*runtime.thresholds());
    let report = verifier.verify(&trace);
    assert!(report.malformed.is_some());
    assert!(!report.verified());
}
