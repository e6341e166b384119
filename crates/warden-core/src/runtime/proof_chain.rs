// crates/warden-core/src/runtime/proof_chain.rs
// ============================================================================
// Module: Warden Proof Chain
// Description: Append-only hash-chained envelope log with per-envelope HMAC.
// Purpose: Produce and verify the tamper-evident evidence trail of runs.
// Dependencies: crate::core, crate::runtime::gateway, serde
// ============================================================================

//! ## Overview
//! The proof chain appends one signed envelope per sealed run. Each
//! envelope's `previous_hash` equals the content hash of its predecessor;
//! the first envelope links to the genesis hash. Verification recomputes
//! signatures in constant time and walks the linkage; a mismatch is a
//! `false`, never a panic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::crypto::CryptoError;
use crate::core::crypto::SigningKey;
use crate::core::crypto::canonical_json_bytes;
use crate::core::crypto::sha256_canonical_hex;
use crate::core::crypto::sha256_hex;
use crate::core::envelope::EnvelopeMetadata;
use crate::core::envelope::GENESIS_HASH;
use crate::core::envelope::MemoryLineageEntry;
use crate::core::envelope::ProofEnvelope;
use crate::core::identifiers::EnvelopeId;
use crate::core::run_event::RunEvent;
use crate::core::time::Timestamp;
use crate::runtime::gateway::ToolCallRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Serialization version accepted by chain import.
pub const CHAIN_EXPORT_VERSION: u32 = 1;

/// Fields excluded from the envelope signature body.
const ENVELOPE_SIGNATURE_EXCLUDED: &[&str] = &["signature"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by proof chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Canonicalization or signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// Envelope sealing time could not be rendered.
    #[error("failed to render sealing time: {0}")]
    Time(String),
    /// The export carries an unsupported serialization version.
    #[error("unsupported chain export version {0}, expected {CHAIN_EXPORT_VERSION}")]
    UnsupportedVersion(u32),
    /// An imported chain failed linkage verification.
    #[error("imported chain broken at index {0}")]
    BrokenLink(usize),
    /// An imported envelope failed signature verification.
    #[error("imported envelope at index {0} failed signature verification")]
    BadSignature(usize),
}

// ============================================================================
// SECTION: Export Format
// ============================================================================

/// Persisted chain export.
///
/// # Invariants
/// - `version` must equal [`CHAIN_EXPORT_VERSION`] to be importable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainExport {
    /// Envelopes in append order.
    pub envelopes: Vec<ProofEnvelope>,
    /// Export creation time.
    pub created_at: Timestamp,
    /// Serialization version.
    pub version: u32,
}

// ============================================================================
// SECTION: Proof Chain
// ============================================================================

/// Append-only hash-chained envelope log.
///
/// # Invariants
/// - Envelopes are never mutated or removed after append.
/// - Appends are serialized through the owning component; readers receive
///   copies or shared references.
#[derive(Debug)]
pub struct ProofChain {
    /// Signing key for envelope HMACs.
    key: SigningKey,
    /// Envelopes in append order.
    envelopes: Vec<ProofEnvelope>,
}

impl ProofChain {
    /// Creates an empty chain with the given signing key.
    ///
    /// Key validation happens at [`SigningKey::new`]; a chain cannot exist
    /// without signing material.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            envelopes: Vec::new(),
        }
    }

    /// Appends a sealed run event as a new signed envelope.
    ///
    /// Computes the run event's content hash, links it to the current tip,
    /// hashes each recorded tool call, copies memory lineage, and signs the
    /// envelope body. The append is atomic: the envelope is only stored once
    /// fully constructed.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] when canonicalization or time rendering fails.
    pub fn append(
        &mut self,
        run_event: &RunEvent,
        tool_calls: &[ToolCallRecord],
        memory_ops: &[MemoryLineageEntry],
        metadata: EnvelopeMetadata,
        sealed_at: Timestamp,
    ) -> Result<ProofEnvelope, ChainError> {
        let content_hash = sha256_canonical_hex(run_event)?;
        let previous_hash = self
            .envelopes
            .last()
            .map_or_else(|| GENESIS_HASH.to_string(), |tip| tip.content_hash.clone());

        let mut tool_call_hashes = BTreeMap::new();
        for call in tool_calls {
            tool_call_hashes.insert(call.call_id.clone(), hash_tool_call(call)?);
        }

        let timestamp_iso =
            sealed_at.to_iso8601().map_err(|err| ChainError::Time(err.to_string()))?;

        let mut envelope = ProofEnvelope {
            envelope_id: EnvelopeId::uuid(),
            run_event_id: run_event.event_id.clone(),
            timestamp_iso,
            content_hash,
            previous_hash,
            tool_call_hashes,
            guidance_hash: run_event.guidance_hash.clone(),
            memory_lineage: memory_ops.to_vec(),
            signature: String::new(),
            metadata,
        };
        envelope.signature = self.key.sign_body(&envelope, ENVELOPE_SIGNATURE_EXCLUDED)?;

        self.envelopes.push(envelope.clone());
        Ok(envelope)
    }

    /// Verifies one envelope's signature and, when it belongs to this chain,
    /// its linkage to the predecessor.
    ///
    /// Mismatches report `false`; verification never raises.
    #[must_use]
    pub fn verify(&self, envelope: &ProofEnvelope) -> bool {
        if !self.key.verify_body(envelope, ENVELOPE_SIGNATURE_EXCLUDED, &envelope.signature) {
            return false;
        }
        match self.position_of(&envelope.envelope_id) {
            Some(0) => envelope.previous_hash == GENESIS_HASH,
            Some(index) => self
                .envelopes
                .get(index - 1)
                .is_some_and(|prior| envelope.previous_hash == prior.content_hash),
            None => true,
        }
    }

    /// Verifies every envelope in order, short-circuiting on first failure.
    #[must_use]
    pub fn verify_chain(&self) -> bool {
        self.envelopes.iter().all(|envelope| self.verify(envelope))
    }

    /// Returns the newest envelope, if any.
    #[must_use]
    pub fn tip(&self) -> Option<&ProofEnvelope> {
        self.envelopes.last()
    }

    /// Returns the number of envelopes in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Returns whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Returns an envelope by identifier.
    #[must_use]
    pub fn get(&self, envelope_id: &EnvelopeId) -> Option<&ProofEnvelope> {
        self.envelopes.iter().find(|envelope| &envelope.envelope_id == envelope_id)
    }

    /// Exports the chain for persistence.
    #[must_use]
    pub fn export(&self, created_at: Timestamp) -> ChainExport {
        ChainExport {
            envelopes: self.envelopes.clone(),
            created_at,
            version: CHAIN_EXPORT_VERSION,
        }
    }

    /// Imports a persisted chain, replacing the current contents.
    ///
    /// The import is validated before any mutation: the version must match,
    /// every envelope must verify against this chain's key, and linkage must
    /// be intact from genesis. A failed import leaves the chain untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] naming the failing envelope or version.
    pub fn import(&mut self, export: ChainExport) -> Result<usize, ChainError> {
        if export.version != CHAIN_EXPORT_VERSION {
            return Err(ChainError::UnsupportedVersion(export.version));
        }
        let mut expected_previous = GENESIS_HASH.to_string();
        for (index, envelope) in export.envelopes.iter().enumerate() {
            if !self.key.verify_body(envelope, ENVELOPE_SIGNATURE_EXCLUDED, &envelope.signature) {
                return Err(ChainError::BadSignature(index));
            }
            if envelope.previous_hash != expected_previous {
                return Err(ChainError::BrokenLink(index));
            }
            expected_previous = envelope.content_hash.clone();
        }
        self.envelopes = export.envelopes;
        Ok(self.envelopes.len())
    }

    /// Returns the index of an envelope within the chain.
    fn position_of(&self, envelope_id: &EnvelopeId) -> Option<usize> {
        self.envelopes.iter().position(|envelope| &envelope.envelope_id == envelope_id)
    }
}

// ============================================================================
// SECTION: Tool Call Hashing
// ============================================================================

/// Hashes one tool call as `SHA-256(name ‖ canonical(params) ‖
/// canonical(result))`.
fn hash_tool_call(call: &ToolCallRecord) -> Result<String, CryptoError> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(call.tool_name.as_bytes());
    bytes.extend_from_slice(&canonical_json_bytes(&call.params)?);
    bytes.extend_from_slice(&canonical_json_bytes(&call.result)?);
    Ok(sha256_hex(&bytes))
}
