// crates/warden-contract/src/init.rs
// ============================================================================
// Module: Warden Initializer Contract
// Description: Typed manifest for scaffolding producers.
// Purpose: Describe what an initializer wrote without the core writing files.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Initializers and scaffolding generators are external collaborators. They
//! report what they wrote through this typed manifest; the core consumes the
//! manifest for evidence and never performs the filesystem writes itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Kinds of files an initializer produces.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitFileKind {
    /// Configuration file.
    Config,
    /// Skill definition.
    Skill,
    /// Template file.
    Template,
    /// Tool stub definition.
    ToolStub,
}

/// One file written by an initializer.
///
/// # Invariants
/// - `content_hash` is the lowercase hex SHA-256 of the written bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitFileRecord {
    /// Path written, relative to the scaffold root.
    pub path: String,
    /// File kind.
    pub kind: InitFileKind,
    /// Content hash of the written bytes.
    pub content_hash: String,
}

/// Manifest of one initializer invocation.
///
/// # Invariants
/// - `files` are listed in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitManifest {
    /// Files written.
    pub files: Vec<InitFileRecord>,
    /// ISO-8601 scaffold time.
    pub created_at: String,
}
