// crates/warden-core/tests/coherence_governor.rs
// ============================================================================
// Module: Coherence and Governor Tests
// Description: Verifies privilege derivation and budget metering.
// ============================================================================
//! ## Overview
//! Ensures the threshold mapping is monotone, crossings report transitions,
//! and governor counters stay monotone with soft and hard limit verdicts.

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

use warden_core::CoherenceScheduler;
use warden_core::CoherenceThresholds;
use warden_core::PrivilegeLevel;
use warden_core::runtime::BudgetCounter;
use warden_core::runtime::BudgetVerdict;
use warden_core::runtime::CounterLimit;
use warden_core::runtime::EconomicGovernor;
use warden_core::runtime::GovernorLimits;

#[test]
fn default_thresholds_map_scores_to_tiers() {
    let thresholds = CoherenceThresholds::default();
    assert_eq!(thresholds.privilege_for(0.9), PrivilegeLevel::Full);
    assert_eq!(thresholds.privilege_for(0.7), PrivilegeLevel::Full);
    assert_eq!(thresholds.privilege_for(0.69), PrivilegeLevel::Restricted);
    assert_eq!(thresholds.privilege_for(0.5), PrivilegeLevel::Restricted);
    assert_eq!(thresholds.privilege_for(0.49), PrivilegeLevel::ReadOnly);
    assert_eq!(thresholds.privilege_for(0.3), PrivilegeLevel::ReadOnly);
    assert_eq!(thresholds.privilege_for(0.29), PrivilegeLevel::Suspended);
    assert_eq!(thresholds.privilege_for(0.0), PrivilegeLevel::Suspended);
}

#[test]
fn mapping_is_monotone_in_score() {
    let thresholds = CoherenceThresholds::default();
    let mut previous_rank = 0;
    for step in 0 ..= 100 {
        let score = f64::from(step) / 100.0;
        let rank = thresholds.privilege_for(score).rank();
        assert!(rank >= previous_rank, "higher score must never lower privilege");
        previous_rank = rank;
    }
}

#[test]
fn invalid_thresholds_are_rejected() {
    let inverted = CoherenceThresholds {
        healthy: 0.3,
        warning: 0.5,
        read_only: 0.7,
    };
    assert!(inverted.validate().is_err());
    assert!(CoherenceScheduler::new(inverted, 0.9).is_err());
}

#[test]
fn crossing_reports_the_transition() {
    let mut scheduler = CoherenceScheduler::new(CoherenceThresholds::default(), 0.9).expect("scheduler");
    assert_eq!(scheduler.level(), PrivilegeLevel::Full);

    let shift = scheduler.set_score(0.2).expect("threshold crossing");
    assert_eq!(shift.previous, PrivilegeLevel::Full);
    assert_eq!(shift.new_level, PrivilegeLevel::Suspended);
    assert_eq!(shift.decision(), "full->suspended");
    assert_eq!(scheduler.level(), PrivilegeLevel::Suspended);
}

#[test]
fn update_within_band_reports_nothing() {
    let mut scheduler = CoherenceScheduler::new(CoherenceThresholds::default(), 0.9).expect("scheduler");
    assert!(scheduler.set_score(0.8).is_none());
    assert_eq!(scheduler.level(), PrivilegeLevel::Full);
}

#[test]
fn scores_are_clamped_to_unit_interval() {
    let mut scheduler = CoherenceScheduler::new(CoherenceThresholds::default(), 1.5).expect("scheduler");
    assert_eq!(scheduler.score(), 1.0);
    scheduler.set_score(-0.5);
    assert_eq!(scheduler.score(), 0.0);
    assert_eq!(scheduler.level(), PrivilegeLevel::Suspended);
}

#[test]
fn governor_counters_are_monotone() {
    let mut governor = EconomicGovernor::new(GovernorLimits::default()).expect("governor");
    governor.record_tokens(100);
    governor.record_tool_call();
    governor.record_storage(64);
    governor.record_elapsed(10);
    governor.record_elapsed(5);
    governor.record_cost(0.25);
    governor.record_cost(-1.0);

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.tokens, 100);
    assert_eq!(snapshot.tool_calls, 1);
    assert_eq!(snapshot.storage_bytes, 64);
    assert_eq!(snapshot.time_ms, 10, "elapsed regressions are ignored");
    assert!((snapshot.cost_usd - 0.25).abs() < f64::EPSILON, "negative cost is ignored");
}

#[test]
fn soft_limit_produces_a_warning_verdict() {
    let limits = GovernorLimits {
        tokens: Some(CounterLimit {
            soft: 50.0,
            hard: 100.0,
        }),
        ..GovernorLimits::default()
    };
    let mut governor = EconomicGovernor::new(limits).expect("governor");
    assert_eq!(governor.record_tokens(40), BudgetVerdict::Within);
    let verdict = governor.record_tokens(20);
    assert_eq!(verdict, BudgetVerdict::SoftExceeded(vec![BudgetCounter::Tokens]));
    assert!(verdict.permits_continuation());
}

#[test]
fn hard_limit_produces_a_stop_verdict() {
    let limits = GovernorLimits {
        tokens: Some(CounterLimit {
            soft: 50.0,
            hard: 100.0,
        }),
        ..GovernorLimits::default()
    };
    let mut governor = EconomicGovernor::new(limits).expect("governor");
    let verdict = governor.record_tokens(150);
    assert_eq!(verdict, BudgetVerdict::HardExceeded(vec![BudgetCounter::Tokens]));
    assert!(!verdict.permits_continuation());
}

#[test]
fn inverted_limits_are_rejected() {
    let limits = GovernorLimits {
        cost_usd: Some(CounterLimit {
            soft: 2.0,
            hard: 1.0,
        }),
        ..GovernorLimits::default()
    };
    assert!(EconomicGovernor::new(limits).is_err());
}
