// crates/warden-core/src/core/artifact.rs
// ============================================================================
// Module: Warden Artifacts
// Description: Signed production artifact records with lineage.
// Purpose: Describe the outputs a run produces and where they came from.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Artifacts are the signed production outputs of runs. Each carries a
//! content hash, a lineage block pointing at parent artifacts and the
//! sealing run, and an HMAC signature over every field except the signature
//! and the raw content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ArtifactId;
use crate::core::identifiers::CallId;
use crate::core::identifiers::CellId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Artifact Kind
// ============================================================================

/// Artifact kinds recorded by the ledger.
///
/// # Invariants
/// - Variants are stable for serialization and search filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Source or generated code.
    Code,
    /// Generated report or summary.
    Report,
    /// Dataset payload.
    Dataset,
    /// Raw model output.
    ModelOutput,
    /// Serialized memory delta.
    MemoryDelta,
    /// Configuration payload.
    Config,
    /// Exported trace stream.
    TraceExport,
    /// Runtime checkpoint.
    Checkpoint,
}

impl ArtifactKind {
    /// Returns the stable kebab-case label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Report => "report",
            Self::Dataset => "dataset",
            Self::ModelOutput => "model-output",
            Self::MemoryDelta => "memory-delta",
            Self::Config => "config",
            Self::TraceExport => "trace-export",
            Self::Checkpoint => "checkpoint",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Artifact Content
// ============================================================================

/// Artifact payload held inline for hashing and size accounting.
///
/// # Invariants
/// - Text payloads hash over raw UTF-8 bytes; structured payloads hash over
///   canonical JSON bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactContent {
    /// UTF-8 text payload.
    Text(String),
    /// Structured JSON payload.
    Structured(Value),
}

// ============================================================================
// SECTION: Lineage
// ============================================================================

/// Provenance block linking an artifact to its inputs.
///
/// # Invariants
/// - Parents may reference evicted or imported artifacts; traversal is
///   cycle-protected and missing parents only affect completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtifactLineage {
    /// Parent artifacts this artifact was derived from.
    pub parent_artifacts: Vec<ArtifactId>,
    /// Run that produced the artifact.
    pub source_run_id: Option<RunId>,
    /// Opaque reference into the producing trace.
    pub source_trace_ref: Option<String>,
    /// Tool calls that contributed content.
    pub tool_call_ids: Vec<CallId>,
    /// Memory keys read while producing the artifact.
    pub memory_reads: Vec<String>,
}

// ============================================================================
// SECTION: Artifact Record
// ============================================================================

/// Signed artifact record stored in the ledger.
///
/// # Invariants
/// - `content_hash` matches the canonical payload bytes; `content_size` is
///   their UTF-8 byte length.
/// - `signature` covers every field except `signature` and `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact identifier.
    pub artifact_id: ArtifactId,
    /// Run that recorded the artifact.
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
    /// SHA-256 of the canonical payload bytes.
    pub content_hash: String,
    /// Payload size in UTF-8 bytes.
    pub content_size: u64,
    /// Inline payload.
    pub content: ArtifactContent,
    /// Structured caller-provided metadata.
    pub metadata: Value,
    /// Provenance block.
    pub lineage: ArtifactLineage,
    /// HMAC-SHA256 signature over the canonical body.
    pub signature: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Search tags.
    pub tags: Vec<String>,
}

// ============================================================================
// SECTION: Verification Report
// ============================================================================

/// Per-axis verification outcome for one artifact.
///
/// # Invariants
/// - `verified` is the conjunction of the three axes.
/// - A missing artifact reports all axes `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtifactVerification {
    /// Whether the stored signature matches the canonical body.
    pub signature_valid: bool,
    /// Whether the payload still matches `content_hash`.
    pub content_intact: bool,
    /// Whether every lineage parent exists in the ledger.
    pub lineage_complete: bool,
    /// Conjunction of all axes.
    pub verified: bool,
}

// ============================================================================
// SECTION: Search Query
// ============================================================================

/// Multi-axis artifact search query.
///
/// # Invariants
/// - Absent axes do not constrain; `tags` is conjunctive (every queried tag
///   must be present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArtifactQuery {
    /// Restrict to one run.
    pub run_id: Option<RunId>,
    /// Restrict to one cell.
    pub cell_id: Option<CellId>,
    /// Restrict to one tenant.
    pub tenant_id: Option<TenantId>,
    /// Restrict to one kind.
    pub kind: Option<ArtifactKind>,
    /// Require the name to contain this substring.
    pub name_contains: Option<String>,
    /// Require all listed tags to be present.
    pub tags: Vec<String>,
    /// Restrict to artifacts created at or after this time.
    pub created_after: Option<Timestamp>,
    /// Restrict to artifacts created at or before this time.
    pub created_before: Option<Timestamp>,
}
