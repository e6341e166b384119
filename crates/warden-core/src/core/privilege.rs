// crates/warden-core/src/core/privilege.rs
// ============================================================================
// Module: Warden Privilege Model
// Description: Coherence-derived privilege levels and threshold configuration.
// Purpose: Map the runtime coherence score onto the write-gating privilege tier.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Privilege is a discrete tier derived from a scalar coherence score in
//! `[0, 1]`. The mapping is the only source of truth for write gating: a
//! higher score always yields at least the same privilege.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Privilege Levels
// ============================================================================

/// Privilege tier ordered from most to least capable.
///
/// # Invariants
/// - Variants are stable for serialization and replay derivation.
/// - `full > restricted > read_only > suspended` by [`PrivilegeLevel::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivilegeLevel {
    /// Unrestricted memory and tool access.
    Full,
    /// Writes allowed, elevated operations constrained.
    Restricted,
    /// Reads only; all writes are blocked.
    ReadOnly,
    /// All mutating operations blocked pending recovery.
    Suspended,
}

impl PrivilegeLevel {
    /// Returns the stable lowercase label used in trace decisions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Restricted => "restricted",
            Self::ReadOnly => "read-only",
            Self::Suspended => "suspended",
        }
    }

    /// Returns the ordering rank; higher means more privileged.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Full => 3,
            Self::Restricted => 2,
            Self::ReadOnly => 1,
            Self::Suspended => 0,
        }
    }

    /// Returns whether memory writes are permitted at this tier.
    #[must_use]
    pub const fn permits_writes(self) -> bool {
        matches!(self, Self::Full | Self::Restricted)
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Coherence Thresholds
// ============================================================================

/// Threshold configuration mapping coherence scores onto privilege tiers.
///
/// # Invariants
/// - `healthy > warning > read_only`, all within `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceThresholds {
    /// Minimum score for [`PrivilegeLevel::Full`].
    pub healthy: f64,
    /// Minimum score for [`PrivilegeLevel::Restricted`].
    pub warning: f64,
    /// Minimum score for [`PrivilegeLevel::ReadOnly`].
    pub read_only: f64,
}

impl Default for CoherenceThresholds {
    fn default() -> Self {
        Self {
            healthy: 0.7,
            warning: 0.5,
            read_only: 0.3,
        }
    }
}

/// Errors raised when threshold configuration is invalid.
#[derive(Debug, Error)]
pub enum ThresholdError {
    /// Thresholds are not strictly descending or leave the unit interval.
    #[error("thresholds must satisfy 0 < read_only < warning < healthy <= 1, got {0}, {1}, {2}")]
    Invalid(f64, f64, f64),
}

impl CoherenceThresholds {
    /// Validates the threshold ordering and range.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::Invalid`] when the ordering constraint is
    /// violated.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let ordered = self.read_only > 0.0
            && self.read_only < self.warning
            && self.warning < self.healthy
            && self.healthy <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(ThresholdError::Invalid(self.healthy, self.warning, self.read_only))
        }
    }

    /// Derives the privilege tier for a coherence score.
    ///
    /// Scores are clamped into `[0, 1]` before mapping so that out-of-range
    /// inputs degrade to the nearest tier rather than failing.
    #[must_use]
    pub fn privilege_for(&self, score: f64) -> PrivilegeLevel {
        let score = score.clamp(0.0, 1.0);
        if score >= self.healthy {
            PrivilegeLevel::Full
        } else if score >= self.warning {
            PrivilegeLevel::Restricted
        } else if score >= self.read_only {
            PrivilegeLevel::ReadOnly
        } else {
            PrivilegeLevel::Suspended
        }
    }
}
