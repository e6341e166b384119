// crates/warden-core/src/runtime/coherence.rs
// ============================================================================
// Module: Warden Coherence Scheduler
// Description: Coherence score tracking and privilege derivation.
// Purpose: Drive the privilege tier that gates every mutating operation.
// Dependencies: crate::core::privilege, serde
// ============================================================================

//! ## Overview
//! The scheduler holds the runtime's coherence score and derives the
//! privilege tier through the configured thresholds. A score update that
//! crosses a threshold yields a [`PrivilegeShift`] which the runtime must
//! surface as a `privilege_change` trace event before any further reads or
//! writes are processed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::privilege::CoherenceThresholds;
use crate::core::privilege::PrivilegeLevel;
use crate::core::privilege::ThresholdError;

// ============================================================================
// SECTION: Privilege Shift
// ============================================================================

/// A threshold-crossing privilege transition.
///
/// # Invariants
/// - `previous` differs from `new_level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrivilegeShift {
    /// Privilege tier before the update.
    pub previous: PrivilegeLevel,
    /// Privilege tier after the update.
    pub new_level: PrivilegeLevel,
    /// Score that caused the transition.
    pub score: f64,
}

impl PrivilegeShift {
    /// Returns the trace decision string `"{previous}->{new}"`.
    #[must_use]
    pub fn decision(&self) -> String {
        format!("{}->{}", self.previous.as_str(), self.new_level.as_str())
    }
}

// ============================================================================
// SECTION: Coherence Scheduler
// ============================================================================

/// Coherence score holder and privilege derivation point.
///
/// # Invariants
/// - The threshold mapping is the only source of truth for write gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceScheduler {
    /// Threshold configuration.
    thresholds: CoherenceThresholds,
    /// Current coherence score, clamped to `[0, 1]`.
    score: f64,
    /// Privilege tier derived from the current score.
    level: PrivilegeLevel,
}

impl CoherenceScheduler {
    /// Creates a scheduler with validated thresholds and an initial score.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] when the thresholds are not strictly
    /// descending within `(0, 1]`.
    pub fn new(
        thresholds: CoherenceThresholds,
        initial_score: f64,
    ) -> Result<Self, ThresholdError> {
        thresholds.validate()?;
        let score = initial_score.clamp(0.0, 1.0);
        let level = thresholds.privilege_for(score);
        Ok(Self {
            thresholds,
            score,
            level,
        })
    }

    /// Returns the current coherence score.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Returns the current privilege tier.
    #[must_use]
    pub const fn level(&self) -> PrivilegeLevel {
        self.level
    }

    /// Returns the threshold configuration.
    #[must_use]
    pub const fn thresholds(&self) -> &CoherenceThresholds {
        &self.thresholds
    }

    /// Updates the score and reports a privilege transition when a threshold
    /// is crossed.
    ///
    /// The caller must emit a `privilege_change` trace event for every
    /// returned shift; no reordering with reads or writes is permitted.
    pub fn set_score(&mut self, score: f64) -> Option<PrivilegeShift> {
        let score = score.clamp(0.0, 1.0);
        self.score = score;
        let new_level = self.thresholds.privilege_for(score);
        if new_level == self.level {
            return None;
        }
        let shift = PrivilegeShift {
            previous: self.level,
            new_level,
            score,
        };
        self.level = new_level;
        Some(shift)
    }
}
