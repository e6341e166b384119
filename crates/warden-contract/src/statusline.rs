// crates/warden-contract/src/statusline.rs
// ============================================================================
// Module: Warden Statusline Contract
// Description: Wire-stable statusline stream records and renderer contract.
// Purpose: Define what statusline producers emit and renderers must honor.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The statusline stream is an external boundary: records serialize with
//! camelCase keys and renderers live outside the core. The one behavioral
//! rule renderers must honor is the collision window: columns 15 through 25
//! of the penultimate rendered line stay visually empty so concurrent
//! terminal writers do not overlap. [`collision_window_clear`] is the pure
//! check for that rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Collision Window
// ============================================================================

/// First 1-based column of the reserved collision window.
pub const COLLISION_WINDOW_START_COL: usize = 15;

/// Last 1-based column of the reserved collision window.
pub const COLLISION_WINDOW_END_COL: usize = 25;

/// Returns whether the penultimate line keeps the collision window empty.
///
/// Lines shorter than the window trivially satisfy the rule. Renders of
/// fewer than two lines have no penultimate line and also satisfy it.
#[must_use]
pub fn collision_window_clear(lines: &[String]) -> bool {
    let Some(penultimate) = lines.len().checked_sub(2).and_then(|index| lines.get(index)) else {
        return true;
    };
    penultimate
        .chars()
        .enumerate()
        .filter(|(index, _)| {
            (COLLISION_WINDOW_START_COL - 1 .. COLLISION_WINDOW_END_COL).contains(index)
        })
        .all(|(_, ch)| ch == ' ')
}

// ============================================================================
// SECTION: Stream Sections
// ============================================================================

/// Domain migration progress section.
///
/// # Invariants
/// - `domains_completed <= total_domains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct V3Progress {
    /// Domains fully migrated.
    pub domains_completed: u32,
    /// Total domains in scope.
    pub total_domains: u32,
    /// Domain-driven-design progress in `[0, 1]`.
    pub ddd_progress: f64,
}

/// Security posture section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStatus {
    /// Posture label, e.g. `hardening` or `clear`.
    pub status: String,
    /// CVEs fixed so far.
    pub cves_fixed: u32,
    /// Total CVEs tracked.
    pub total_cves: u32,
}

/// Swarm coordination section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SwarmStatus {
    /// Agents currently active.
    pub active_agents: u32,
    /// Maximum concurrent agents.
    pub max_agents: u32,
    /// Whether cross-agent coordination is running.
    pub coordination_active: bool,
}

/// Hook routing section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HooksStatus {
    /// Hook system status label.
    pub status: String,
    /// Routing patterns learned.
    pub patterns_learned: u32,
    /// Routing accuracy in `[0, 1]`.
    pub routing_accuracy: f64,
    /// Total routed operations.
    pub total_operations: u64,
}

/// Performance section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStatus {
    /// Flash-attention throughput target label.
    pub flash_attention_target: String,
    /// Search improvement label, e.g. `3.2x`.
    pub search_improvement: String,
    /// Memory reduction label, e.g. `41%`.
    pub memory_reduction: String,
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// One statusline stream record.
///
/// # Invariants
/// - `last_updated` is an ISO-8601 string rendered by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatuslineSnapshot {
    /// Migration progress section.
    pub v3_progress: V3Progress,
    /// Security posture section.
    pub security: SecurityStatus,
    /// Swarm coordination section.
    pub swarm: SwarmStatus,
    /// Hook routing section.
    pub hooks: HooksStatus,
    /// Performance section.
    pub performance: PerformanceStatus,
    /// ISO-8601 render time.
    pub last_updated: String,
}

// ============================================================================
// SECTION: Renderer Contract
// ============================================================================

/// Renderer contract for statusline consumers.
///
/// Implementations live outside the core (single-line, multi-line, JSON).
/// Every implementation must keep the collision window of the penultimate
/// rendered line empty; [`collision_window_clear`] checks compliance.
pub trait StatuslineRenderer {
    /// Renders a snapshot into terminal lines.
    fn render(&self, snapshot: &StatuslineSnapshot) -> Vec<String>;
}
