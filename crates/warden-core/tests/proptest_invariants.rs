// crates/warden-core/tests/proptest_invariants.rs
// ============================================================================
// Module: Property Tests
// Description: Universally quantified invariants for gates, crypto, chains.
// ============================================================================
//! ## Overview
//! Property coverage for the aggregation maximum, redaction edge
//! preservation, signature round-trips, and chain monotonicity under
//! arbitrary appends.

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

use proptest::prelude::*;
use serde_json::json;
use warden_core::AgentId;
use warden_core::EnvelopeMetadata;
use warden_core::EventId;
use warden_core::GateDecision;
use warden_core::GateResult;
use warden_core::ProofChain;
use warden_core::RunEvent;
use warden_core::SessionId;
use warden_core::SigningKey;
use warden_core::TaskId;
use warden_core::Timestamp;
use warden_core::aggregate_decision;
use warden_core::runtime::redact;

// ============================================================================
// SECTION: Strategies
// ============================================================================

fn decision_strategy() -> impl Strategy<Value = GateDecision> {
    prop_oneof![
        Just(GateDecision::Allow),
        Just(GateDecision::Warn),
        Just(GateDecision::RequireConfirmation),
        Just(GateDecision::Block),
    ]
}

fn result_with(decision: GateDecision) -> GateResult {
    GateResult {
        decision,
        gate_name: "property".to_string(),
        reason: "generated".to_string(),
        triggered_rules: Vec::new(),
        remediation: None,
        metadata: json!({}),
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn aggregate_equals_maximum_severity(decisions in prop::collection::vec(decision_strategy(), 0 .. 8)) {
        let results: Vec<GateResult> = decisions.iter().copied().map(result_with).collect();
        let aggregate = aggregate_decision(&results);
        let expected = decisions
            .iter()
            .copied()
            .max_by_key(|decision| decision.severity())
            .unwrap_or(GateDecision::Allow);
        prop_assert_eq!(aggregate, expected);
    }

    #[test]
    fn redaction_preserves_edges_and_hides_the_middle(secret in "[A-Za-z0-9]{9,48}") {
        let redacted = redact(&secret);
        prop_assert_eq!(redacted.len(), secret.len());
        prop_assert_eq!(&redacted[.. 4], &secret[.. 4]);
        prop_assert_eq!(&redacted[redacted.len() - 4 ..], &secret[secret.len() - 4 ..]);
        prop_assert!(redacted[4 .. redacted.len() - 4].chars().all(|c| c == '*'));
    }

    #[test]
    fn short_secrets_redact_fully(secret in "[A-Za-z0-9]{0,8}") {
        let redacted = redact(&secret);
        prop_assert_eq!(redacted.len(), secret.len());
        prop_assert!(redacted.chars().all(|c| c == '*'));
    }

    #[test]
    fn signature_round_trip_holds_for_arbitrary_bodies(
        name in "[a-z]{1,16}",
        count in 0_u32 .. 1_000_000,
    ) {
        let key = SigningKey::new(b"proptest-key").expect("key");
        let body = json!({ "name": name, "count": count, "signature": "" });
        let signature = key.sign_body(&body, &["signature"]).expect("sign");
        prop_assert!(key.verify_body(&body, &["signature"], &signature));

        let tampered = json!({ "name": format!("{name}!"), "count": count, "signature": "" });
        prop_assert!(!key.verify_body(&tampered, &["signature"], &signature));
    }

    #[test]
    fn chain_stays_verified_and_grows_by_one_per_append(intents in prop::collection::vec("[a-z ]{1,24}", 1 .. 6)) {
        let mut chain = ProofChain::new(SigningKey::new(b"proptest-chain-key").expect("key"));
        prop_assert!(chain.verify_chain());

        for (index, intent) in intents.iter().enumerate() {
            let event = RunEvent {
                event_id: EventId::uuid(),
                task_id: TaskId::new(format!("task-{index}")),
                intent: intent.clone(),
                guidance_hash: "c".repeat(64),
                tools_used: Vec::new(),
                files_touched: Vec::new(),
                violations: Vec::new(),
                outcome_accepted: true,
                duration_ms: index as u64,
                session_id: SessionId::new("proptest"),
            };
            let metadata = EnvelopeMetadata {
                agent_id: AgentId::new("proptest"),
                session_id: SessionId::new("proptest"),
                parent_envelope_id: None,
            };
            let before = chain.len();
            chain
                .append(&event, &[], &[], metadata, Timestamp::from_millis(1_700_000_000_000))
                .expect("append");
            prop_assert_eq!(chain.len(), before + 1);
            prop_assert!(chain.verify_chain());
        }
    }
}
