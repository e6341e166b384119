// crates/warden-core/src/core/authority.rs
// ============================================================================
// Module: Warden Memory Authority
// Description: Capability tokens scoping memory writes and stored entries.
// Purpose: Define what namespaces and operations an agent may perform in memory.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A memory authority is assembled when a runtime is constructed and stays
//! immutable for the life of a run. The memory write gate consults it for
//! namespace scope, rate limits, and overwrite/delete capabilities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::AgentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Memory Authority
// ============================================================================

/// Capability token scoping memory writes for one agent.
///
/// # Invariants
/// - Immutable for the duration of a run.
/// - `trust_level` lies within `[0, 1]` after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryAuthority {
    /// Agent the authority is issued to.
    pub agent_id: AgentId,
    /// Role label carried for audit output.
    pub role: String,
    /// Namespaces the agent may write into.
    pub namespaces: Vec<String>,
    /// Maximum committed writes within any 60 second window.
    pub max_writes_per_minute: u32,
    /// Whether delete operations are permitted.
    pub can_delete: bool,
    /// Whether overwriting an existing entry is permitted.
    pub can_overwrite: bool,
    /// Trust level in `[0, 1]` driving contradiction severity.
    pub trust_level: f64,
}

/// Errors raised when authority configuration is invalid.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Trust level was outside the unit interval.
    #[error("trust level must be within [0, 1], got {0}")]
    TrustOutOfRange(f64),
    /// The namespace list was empty.
    #[error("authority for agent {0} grants no namespaces")]
    NoNamespaces(String),
}

impl MemoryAuthority {
    /// Validates trust range and namespace scope.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] when the trust level leaves `[0, 1]` or no
    /// namespace is granted.
    pub fn validate(&self) -> Result<(), AuthorityError> {
        if !(0.0 ..= 1.0).contains(&self.trust_level) {
            return Err(AuthorityError::TrustOutOfRange(self.trust_level));
        }
        if self.namespaces.is_empty() {
            return Err(AuthorityError::NoNamespaces(self.agent_id.as_str().to_string()));
        }
        Ok(())
    }

    /// Returns whether the authority covers the given namespace.
    #[must_use]
    pub fn authorizes_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|granted| granted == namespace)
    }
}

// ============================================================================
// SECTION: Memory Entry
// ============================================================================

/// Stored memory entry with its authoring authority.
///
/// # Invariants
/// - Entries are append-oriented; contradiction tracking keeps the history of
///   competing values per `(namespace, key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Entry key within the namespace.
    pub key: String,
    /// Namespace holding the entry.
    pub namespace: String,
    /// Stored value.
    pub value: Value,
    /// Agent that authored the entry.
    pub author: AgentId,
    /// Creation timestamp.
    pub created_at: Timestamp,
}
