// crates/warden-core/tests/memory_gate.rs
// ============================================================================
// Module: Memory Write Gate Tests
// Description: Verifies the ordered rule evaluation for proposed writes.
// ============================================================================
//! ## Overview
//! Ensures namespace authorization, the sliding rate window, capability
//! checks, contradiction tracking, and hook vetoes fire in order, with the
//! first failing rule determining the outcome.

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

use serde_json::Value;
use serde_json::json;
use warden_core::AgentId;
use warden_core::GateDecision;
use warden_core::GateResult;
use warden_core::MemoryAuthority;
use warden_core::MemoryEntry;
use warden_core::MemoryGateConfig;
use warden_core::MemoryWriteGate;
use warden_core::Timestamp;
use warden_core::WriteHook;
use warden_core::WriteOp;
use warden_core::WriteRequest;
use warden_core::runtime::ContradictionSeverity;
use warden_core::runtime::WRITE_COMMITTED;

fn authority(trust: f64, max_writes: u32) -> MemoryAuthority {
    MemoryAuthority {
        agent_id: AgentId::new("clerk"),
        role: "clerk".to_string(),
        namespaces: vec!["notes".to_string()],
        max_writes_per_minute: max_writes,
        can_delete: false,
        can_overwrite: false,
        trust_level: trust,
    }
}

fn at(ms: i64) -> Timestamp {
    Timestamp::from_millis(1_700_000_000_000 + ms)
}

fn write<'a>(
    authority: &'a MemoryAuthority,
    namespace: &'a str,
    key: &'a str,
    value: &'a Value,
    existing: Option<&'a MemoryEntry>,
    now: Timestamp,
) -> WriteRequest<'a> {
    WriteRequest {
        authority,
        namespace,
        key,
        value,
        existing,
        now,
    }
}

#[test]
fn authorized_create_commits() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 10);
    let value = json!({"note": 1});
    let verdict = gate.evaluate_write(&write(&authority, "notes", "n1", &value, None, at(0)), WriteOp::Create);
    assert!(verdict.allowed);
    assert_eq!(verdict.reason, WRITE_COMMITTED);
}

#[test]
fn unauthorized_namespace_is_denied_first() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 10);
    let value = json!({"note": 1});
    let verdict = gate.evaluate_write(&write(&authority, "secrets", "n1", &value, None, at(0)), WriteOp::Create);
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("secrets"));
}

#[test]
fn rate_limit_blocks_within_window_and_recovers_after() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 2);
    let value = json!("v");

    assert!(gate.evaluate_write(&write(&authority, "notes", "a", &value, None, at(0)), WriteOp::Create).allowed);
    assert!(gate.evaluate_write(&write(&authority, "notes", "b", &value, None, at(1)), WriteOp::Create).allowed);

    let third = gate.evaluate_write(&write(&authority, "notes", "c", &value, None, at(2)), WriteOp::Create);
    assert!(!third.allowed);
    assert!(third.reason.contains("Rate limit"));

    let later = gate.evaluate_write(&write(&authority, "notes", "c", &value, None, at(61_000)), WriteOp::Create);
    assert!(later.allowed, "entries outside the 60s window no longer count");
}

#[test]
fn overwrite_requires_capability() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 10);
    let value = json!("new");
    let existing = MemoryEntry {
        key: "n1".to_string(),
        namespace: "notes".to_string(),
        value: json!("old"),
        author: AgentId::new("clerk"),
        created_at: at(0),
    };
    let verdict = gate.evaluate_write(
        &write(&authority, "notes", "n1", &value, Some(&existing), at(1)),
        WriteOp::Create,
    );
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("overwriting"));
}

#[test]
fn delete_requires_capability() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 10);
    let value = Value::Null;
    let verdict = gate.evaluate_write(&write(&authority, "notes", "n1", &value, None, at(0)), WriteOp::Delete);
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("deleting"));
}

#[test]
fn trusted_contradiction_is_recorded_but_allowed() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let mut authority = authority(0.9, 10);
    authority.can_overwrite = true;

    let first = json!("the sky is blue");
    let second = json!("the sky is green");
    assert!(gate.evaluate_write(&write(&authority, "notes", "sky", &first, None, at(0)), WriteOp::Create).allowed);
    let verdict =
        gate.evaluate_write(&write(&authority, "notes", "sky", &second, None, at(1)), WriteOp::Create);
    assert!(verdict.allowed, "trusted contradictions record without denying");

    let contradictions = gate.contradictions_for("notes", "sky");
    assert_eq!(contradictions.len(), 1);
    assert_eq!(contradictions[0].severity, ContradictionSeverity::Normal);
}

#[test]
fn low_trust_contradiction_is_denied() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let mut trusted = authority(0.9, 10);
    trusted.can_overwrite = true;
    let mut untrusted = authority(0.2, 10);
    untrusted.can_overwrite = true;

    let first = json!("the sky is blue");
    let second = json!("the sky is green");
    assert!(gate.evaluate_write(&write(&trusted, "notes", "sky", &first, None, at(0)), WriteOp::Create).allowed);

    let verdict =
        gate.evaluate_write(&write(&untrusted, "notes", "sky", &second, None, at(1)), WriteOp::Create);
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("low-trust"));
    assert_eq!(
        gate.contradictions_for("notes", "sky")[0].severity,
        ContradictionSeverity::Escalated
    );
}

#[test]
fn contradiction_tracking_can_be_disabled() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig {
        track_contradictions: false,
        low_trust_threshold: 0.5,
    });
    let mut untrusted = authority(0.1, 10);
    untrusted.can_overwrite = true;

    let first = json!("a");
    let second = json!("b");
    assert!(gate.evaluate_write(&write(&untrusted, "notes", "k", &first, None, at(0)), WriteOp::Create).allowed);
    assert!(gate.evaluate_write(&write(&untrusted, "notes", "k", &second, None, at(1)), WriteOp::Create).allowed);
    assert!(gate.contradictions().is_empty());
}

struct BlockingHook;

impl WriteHook for BlockingHook {
    fn inspect(&self, _namespace: &str, _key: &str, serialized_value: &str) -> Option<GateResult> {
        serialized_value.contains("sk-").then(|| GateResult {
            decision: GateDecision::Block,
            gate_name: "secrets".to_string(),
            reason: "Detected 1 secret(s) in content".to_string(),
            triggered_rules: vec!["secrets.sk-token".to_string()],
            remediation: None,
            metadata: json!({}),
        })
    }
}

#[test]
fn blocking_hook_denies_the_write() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    gate.register_hook(Box::new(BlockingHook));
    let authority = authority(0.9, 10);

    let leaky = json!({"token": "sk-ABCDEFGHIJKLMNOPQRSTUVWX"});
    let verdict = gate.evaluate_write(&write(&authority, "notes", "n1", &leaky, None, at(0)), WriteOp::Create);
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("secrets"));

    let clean = json!({"note": "plain"});
    assert!(gate.evaluate_write(&write(&authority, "notes", "n2", &clean, None, at(1)), WriteOp::Create).allowed);
}

#[test]
fn value_history_tracks_committed_hashes() {
    let mut gate = MemoryWriteGate::new(MemoryGateConfig::default());
    let authority = authority(0.9, 10);
    let value = json!("v1");
    gate.evaluate_write(&write(&authority, "notes", "k", &value, None, at(0)), WriteOp::Create);
    assert_eq!(gate.value_history("notes", "k").len(), 1);
    assert!(gate.value_history("notes", "missing").is_empty());
}
