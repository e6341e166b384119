// crates/warden-core/src/core/envelope.rs
// ============================================================================
// Module: Warden Proof Envelopes
// Description: Hash-chained, HMAC-signed wrappers around sealed run events.
// Purpose: Form the per-run link in the append-only evidence chain.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Each sealed run event is wrapped into a [`ProofEnvelope`] whose
//! `previous_hash` links to the content hash of the predecessor envelope.
//! Envelope zero links to [`GENESIS_HASH`]. The signature covers every field
//! except `signature` itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::CallId;
use crate::core::identifiers::EnvelopeId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Previous-hash value of the first envelope in a chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// ============================================================================
// SECTION: Memory Lineage
// ============================================================================

/// Memory operation kinds recorded in envelope lineage.
///
/// # Invariants
/// - Variants are stable for serialization and replay derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOp {
    /// A value was read.
    Read,
    /// A value was committed.
    Write,
    /// A value was deleted.
    Delete,
}

/// One memory operation captured in an envelope's lineage.
///
/// # Invariants
/// - `value_hash` is the SHA-256 of the canonical value at operation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLineageEntry {
    /// Entry key within the namespace.
    pub key: String,
    /// Namespace holding the entry.
    pub namespace: String,
    /// Operation performed.
    pub op: MemoryOp,
    /// Canonical hash of the value involved.
    pub value_hash: String,
}

// ============================================================================
// SECTION: Envelope Metadata
// ============================================================================

/// Identifying metadata attached to an envelope.
///
/// # Invariants
/// - `parent_envelope_id` is present only for nested or resumed runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Agent that produced the run.
    pub agent_id: AgentId,
    /// Session the run belongs to.
    pub session_id: SessionId,
    /// Optional parent envelope for nested runs.
    pub parent_envelope_id: Option<EnvelopeId>,
}

// ============================================================================
// SECTION: Proof Envelope
// ============================================================================

/// Hash-chained, signed wrapper around one sealed run event.
///
/// # Invariants
/// - `previous_hash` equals the predecessor's `content_hash`, or
///   [`GENESIS_HASH`] for the first envelope.
/// - `signature` is the HMAC over the canonical body excluding `signature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofEnvelope {
    /// Envelope identifier.
    pub envelope_id: EnvelopeId,
    /// Identifier of the sealed run event.
    pub run_event_id: EventId,
    /// Sealing time rendered as ISO-8601.
    pub timestamp_iso: String,
    /// SHA-256 of the canonical sealed run event.
    pub content_hash: String,
    /// Content hash of the predecessor envelope or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// Per-tool-call content hashes keyed by call identifier.
    pub tool_call_hashes: BTreeMap<CallId, String>,
    /// Opaque hash of the policy guidance in force.
    pub guidance_hash: String,
    /// Memory operations performed during the run.
    pub memory_lineage: Vec<MemoryLineageEntry>,
    /// HMAC-SHA256 signature over the canonical body.
    pub signature: String,
    /// Identifying metadata.
    pub metadata: EnvelopeMetadata,
}
