// crates/warden-core/src/core/identifiers.rs
// ============================================================================
// Module: Warden Identifiers
// Description: Canonical opaque identifiers for Warden records and runs.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: crate::core::crypto, serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Warden.
//! Identifiers are opaque UTF-8 strings and serialize transparently on the
//! wire. Long-lived records receive lowercase UUIDv4 identifiers at creation
//! via the `uuid()` constructors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::crypto::new_uuid;

// ============================================================================
// SECTION: Identifier Definition
// ============================================================================

/// Defines an opaque string identifier with the shared constructor set.
macro_rules! string_identifier {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; no normalization or validation is applied.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Creates a fresh lowercase UUIDv4 identifier.
            #[must_use]
            pub fn uuid() -> Self {
                Self(new_uuid())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier! {
    /// Agent identifier bound to a memory authority.
    AgentId
}

string_identifier! {
    /// Tenant identifier scoping artifacts and runs.
    TenantId
}

string_identifier! {
    /// Cell identifier for a single agent cell instance.
    CellId
}

string_identifier! {
    /// Session identifier grouping runs from one agent session.
    SessionId
}

string_identifier! {
    /// Task identifier supplied by the task source.
    TaskId
}

string_identifier! {
    /// Run identifier for one sealed execution.
    RunId
}

string_identifier! {
    /// Run event identifier assigned by the run ledger.
    EventId
}

string_identifier! {
    /// Proof envelope identifier assigned by the proof chain.
    EnvelopeId
}

string_identifier! {
    /// Artifact identifier assigned by the artifact ledger.
    ArtifactId
}

string_identifier! {
    /// Change proposal identifier assigned by the evolution pipeline.
    ProposalId
}

string_identifier! {
    /// Staged rollout identifier assigned by the evolution pipeline.
    RolloutId
}

string_identifier! {
    /// Tool call identifier assigned by the tool gateway.
    CallId
}
