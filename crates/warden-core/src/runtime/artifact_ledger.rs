// crates/warden-core/src/runtime/artifact_ledger.rs
// ============================================================================
// Module: Warden Artifact Ledger
// Description: Signed artifact store with lineage search and FIFO eviction.
// Purpose: Record production outputs with verifiable provenance.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The artifact ledger records signed production outputs and answers
//! multi-axis queries sorted by creation time. Lineage traversal is a DFS
//! with a visited set so imported cycles terminate. When capacity is
//! exceeded, the oldest artifact is evicted first, ties broken by insertion
//! order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::artifact::Artifact;
use crate::core::artifact::ArtifactContent;
use crate::core::artifact::ArtifactKind;
use crate::core::artifact::ArtifactLineage;
use crate::core::artifact::ArtifactQuery;
use crate::core::artifact::ArtifactVerification;
use crate::core::crypto::CryptoError;
use crate::core::crypto::SigningKey;
use crate::core::crypto::canonical_json_bytes;
use crate::core::crypto::sha256_hex;
use crate::core::identifiers::ArtifactId;
use crate::core::identifiers::CellId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Serialization version accepted by ledger import.
pub const LEDGER_EXPORT_VERSION: u32 = 1;

/// Fields excluded from the artifact signature body.
const ARTIFACT_SIGNATURE_EXCLUDED: &[&str] = &["signature", "content"];

/// Default artifact capacity before FIFO eviction.
pub const DEFAULT_MAX_ARTIFACTS: usize = 1_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by artifact ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Canonicalization or signing failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The export carries an unsupported serialization version.
    #[error("unsupported ledger export version {0}, expected {LEDGER_EXPORT_VERSION}")]
    UnsupportedVersion(u32),
}

// ============================================================================
// SECTION: Record Input
// ============================================================================

/// Input parameters for recording one artifact.
///
/// # Invariants
/// - `content` is the payload to hash; identifiers must reference the
///   producing run and cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDraft {
    /// Run that produced the artifact.
    pub run_id: RunId,
    /// Cell that produced the artifact.
    pub cell_id: CellId,
    /// Tenant owning the artifact.
    pub tenant_id: TenantId,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Short artifact name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Inline payload.
    pub content: ArtifactContent,
    /// Structured caller-provided metadata.
    pub metadata: Value,
    /// Provenance block.
    pub lineage: ArtifactLineage,
    /// Search tags.
    pub tags: Vec<String>,
}

// ============================================================================
// SECTION: Export Format
// ============================================================================

/// Persisted ledger export.
///
/// # Invariants
/// - `version` must equal [`LEDGER_EXPORT_VERSION`] to be importable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    /// Artifacts in insertion order.
    pub artifacts: Vec<Artifact>,
    /// Export creation time.
    pub created_at: Timestamp,
    /// Serialization version.
    pub version: u32,
}

// ============================================================================
// SECTION: Artifact Ledger
// ============================================================================

/// Signed artifact store owned by the control plane.
///
/// # Invariants
/// - Artifacts are immutable once recorded; eviction is the only removal.
#[derive(Debug)]
pub struct ArtifactLedger {
    /// Signing key for artifact HMACs.
    key: SigningKey,
    /// Maximum stored artifacts before eviction.
    max_artifacts: usize,
    /// Artifacts in insertion order.
    artifacts: Vec<Artifact>,
}

impl ArtifactLedger {
    /// Creates an empty ledger with the given key and capacity.
    #[must_use]
    pub fn new(key: SigningKey, max_artifacts: usize) -> Self {
        Self {
            key,
            max_artifacts: max_artifacts.max(1),
            artifacts: Vec::new(),
        }
    }

    /// Creates a ledger with the default capacity.
    #[must_use]
    pub fn with_default_capacity(key: SigningKey) -> Self {
        Self::new(key, DEFAULT_MAX_ARTIFACTS)
    }

    /// Records a signed artifact and returns it.
    ///
    /// The content hash covers the raw UTF-8 bytes for text payloads and
    /// canonical JSON bytes for structured payloads; `content_size` is the
    /// byte length of the hashed payload. The signature covers every field
    /// except `signature` and the raw `content`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when canonicalization or signing fails.
    pub fn record(
        &mut self,
        draft: ArtifactDraft,
        created_at: Timestamp,
    ) -> Result<Artifact, LedgerError> {
        let payload = content_payload_bytes(&draft.content)?;
        let content_hash = sha256_hex(&payload);
        let content_size = payload.len() as u64;

        let mut artifact = Artifact {
            artifact_id: ArtifactId::uuid(),
            run_id: draft.run_id,
            cell_id: draft.cell_id,
            tenant_id: draft.tenant_id,
            kind: draft.kind,
            name: draft.name,
            description: draft.description,
            content_hash,
            content_size,
            content: draft.content,
            metadata: draft.metadata,
            lineage: draft.lineage,
            signature: String::new(),
            created_at,
            tags: draft.tags,
        };
        artifact.signature = self.key.sign_body(&artifact, ARTIFACT_SIGNATURE_EXCLUDED)?;

        self.artifacts.push(artifact.clone());
        self.evict_over_capacity();
        Ok(artifact)
    }

    /// Verifies an artifact's signature, content integrity, and lineage
    /// completeness.
    ///
    /// A missing artifact reports all axes `false`. Missing lineage parents
    /// flip `lineage_complete` while the other axes are still computed.
    #[must_use]
    pub fn verify(&self, artifact_id: &ArtifactId) -> ArtifactVerification {
        let Some(artifact) = self.get(artifact_id) else {
            return ArtifactVerification::default();
        };

        let signature_valid =
            self.key.verify_body(artifact, ARTIFACT_SIGNATURE_EXCLUDED, &artifact.signature);
        let content_intact = content_payload_bytes(&artifact.content)
            .map(|payload| sha256_hex(&payload) == artifact.content_hash)
            .unwrap_or(false);
        let lineage_complete = artifact
            .lineage
            .parent_artifacts
            .iter()
            .all(|parent| self.get(parent).is_some());

        ArtifactVerification {
            signature_valid,
            content_intact,
            lineage_complete,
            verified: signature_valid && content_intact && lineage_complete,
        }
    }

    /// Returns an artifact by identifier.
    #[must_use]
    pub fn get(&self, artifact_id: &ArtifactId) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| &artifact.artifact_id == artifact_id)
    }

    /// Returns artifacts recorded by one run, oldest first.
    #[must_use]
    pub fn get_by_run(&self, run_id: &RunId) -> Vec<&Artifact> {
        self.filter_sorted(|artifact| &artifact.run_id == run_id)
    }

    /// Returns artifacts of one kind, oldest first.
    #[must_use]
    pub fn get_by_kind(&self, kind: ArtifactKind) -> Vec<&Artifact> {
        self.filter_sorted(|artifact| artifact.kind == kind)
    }

    /// Returns artifacts produced by one cell, oldest first.
    #[must_use]
    pub fn get_by_cell(&self, cell_id: &CellId) -> Vec<&Artifact> {
        self.filter_sorted(|artifact| &artifact.cell_id == cell_id)
    }

    /// Runs a multi-axis search, oldest first.
    ///
    /// Tag constraints are conjunctive: every queried tag must be present on
    /// a matching artifact.
    #[must_use]
    pub fn search(&self, query: &ArtifactQuery) -> Vec<&Artifact> {
        self.filter_sorted(|artifact| query_matches(query, artifact))
    }

    /// Returns the ancestors of an artifact in first-visit DFS order.
    ///
    /// Traversal is protected by a visited set so cyclic lineage introduced
    /// by imports terminates. Missing parents are skipped; they affect
    /// [`ArtifactLedger::verify`], not traversal.
    #[must_use]
    pub fn get_lineage(&self, artifact_id: &ArtifactId) -> Vec<ArtifactId> {
        let mut visited = BTreeSet::new();
        let mut ancestors = Vec::new();
        visited.insert(artifact_id.clone());

        let mut stack: Vec<ArtifactId> = self
            .get(artifact_id)
            .map(|artifact| artifact.lineage.parent_artifacts.clone())
            .unwrap_or_default();
        stack.reverse();

        while let Some(parent_id) = stack.pop() {
            if !visited.insert(parent_id.clone()) {
                continue;
            }
            let Some(parent) = self.get(&parent_id) else {
                continue;
            };
            ancestors.push(parent_id);
            for grandparent in parent.lineage.parent_artifacts.iter().rev() {
                stack.push(grandparent.clone());
            }
        }
        ancestors
    }

    /// Returns the number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Exports the ledger for persistence.
    #[must_use]
    pub fn export(&self, created_at: Timestamp) -> LedgerExport {
        LedgerExport {
            artifacts: self.artifacts.clone(),
            created_at,
            version: LEDGER_EXPORT_VERSION,
        }
    }

    /// Imports a persisted ledger, replacing the current contents.
    ///
    /// A version mismatch rejects the import without mutating state.
    /// Signatures are not required to verify at import time: imported
    /// records may have been signed by another deployment and surface as
    /// unverifiable through [`ArtifactLedger::verify`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedVersion`] for any version other
    /// than [`LEDGER_EXPORT_VERSION`].
    pub fn import(&mut self, export: LedgerExport) -> Result<usize, LedgerError> {
        if export.version != LEDGER_EXPORT_VERSION {
            return Err(LedgerError::UnsupportedVersion(export.version));
        }
        self.artifacts = export.artifacts;
        self.evict_over_capacity();
        Ok(self.artifacts.len())
    }

    /// Filters artifacts and sorts the result by creation time ascending.
    fn filter_sorted<F: Fn(&Artifact) -> bool>(&self, predicate: F) -> Vec<&Artifact> {
        let mut matches: Vec<&Artifact> =
            self.artifacts.iter().filter(|artifact| predicate(artifact)).collect();
        matches.sort_by_key(|artifact| artifact.created_at);
        matches
    }

    /// Evicts oldest-first while over capacity, ties by insertion order.
    fn evict_over_capacity(&mut self) {
        while self.artifacts.len() > self.max_artifacts {
            let oldest = self
                .artifacts
                .iter()
                .enumerate()
                .min_by_key(|(index, artifact)| (artifact.created_at, *index))
                .map(|(index, _)| index);
            match oldest {
                Some(index) => {
                    self.artifacts.remove(index);
                }
                None => break,
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the bytes hashed for an artifact payload.
fn content_payload_bytes(content: &ArtifactContent) -> Result<Vec<u8>, CryptoError> {
    match content {
        ArtifactContent::Text(text) => Ok(text.as_bytes().to_vec()),
        ArtifactContent::Structured(value) => canonical_json_bytes(value),
    }
}

/// Returns whether an artifact matches every present query axis.
fn query_matches(query: &ArtifactQuery, artifact: &Artifact) -> bool {
    if query.run_id.as_ref().is_some_and(|run_id| run_id != &artifact.run_id) {
        return false;
    }
    if query.cell_id.as_ref().is_some_and(|cell_id| cell_id != &artifact.cell_id) {
        return false;
    }
    if query.tenant_id.as_ref().is_some_and(|tenant_id| tenant_id != &artifact.tenant_id) {
        return false;
    }
    if query.kind.is_some_and(|kind| kind != artifact.kind) {
        return false;
    }
    if query.name_contains.as_ref().is_some_and(|needle| !artifact.name.contains(needle)) {
        return false;
    }
    if !query.tags.iter().all(|tag| artifact.tags.contains(tag)) {
        return false;
    }
    if query.created_after.is_some_and(|after| artifact.created_at < after) {
        return false;
    }
    if query.created_before.is_some_and(|before| artifact.created_at > before) {
        return false;
    }
    true
}
