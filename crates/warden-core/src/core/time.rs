// crates/warden-core/src/core/time.rs
// ============================================================================
// Module: Warden Time Model
// Description: Epoch-millisecond timestamps with ISO-8601 boundary rendering.
// Purpose: Provide deterministic, replayable time values across Warden records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Warden stores all timestamps as epoch milliseconds and renders ISO-8601
//! only at external boundaries. The core never reads wall-clock time
//! directly; hosts supply timestamps through the [`crate::interfaces::Clock`]
//! seam so replay stays deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when rendering timestamps at the boundary.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The millisecond value is outside the representable date range.
    #[error("timestamp {0} ms is outside the representable range")]
    OutOfRange(i64),
    /// Formatting the timestamp failed.
    #[error("failed to format timestamp: {0}")]
    Format(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp in epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
/// - Monotonicity within a trace is a runtime responsibility, checked by
///   trace validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as epoch milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the whole milliseconds elapsed since an earlier timestamp.
    ///
    /// Saturates to zero when `earlier` is in the future.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> u64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta < 0 { 0 } else { delta as u64 }
    }

    /// Renders the timestamp as an ISO-8601 (RFC 3339) string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the value is outside the representable
    /// range or formatting fails.
    pub fn to_iso8601(self) -> Result<String, TimeError> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|_| TimeError::OutOfRange(self.0))?;
        datetime.format(&Rfc3339).map_err(|err| TimeError::Format(err.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
