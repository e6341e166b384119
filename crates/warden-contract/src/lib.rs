// crates/warden-contract/src/lib.rs
// ============================================================================
// Module: Warden Contract Library
// Description: Typed boundary contracts for external collaborators.
// Purpose: Keep producer/consumer wire formats stable without core coupling.
// Dependencies: crate::{init, statusline}
// ============================================================================

//! ## Overview
//! Boundary contracts for the surfaces that live outside the Warden core:
//! the statusline stream consumed by terminal renderers and the initializer
//! manifest produced by scaffolding tools. These types define wire shape and
//! behavioral rules only; no rendering or filesystem logic lives here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod init;
pub mod statusline;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use init::InitFileKind;
pub use init::InitFileRecord;
pub use init::InitManifest;
pub use statusline::COLLISION_WINDOW_END_COL;
pub use statusline::COLLISION_WINDOW_START_COL;
pub use statusline::HooksStatus;
pub use statusline::PerformanceStatus;
pub use statusline::SecurityStatus;
pub use statusline::StatuslineRenderer;
pub use statusline::StatuslineSnapshot;
pub use statusline::SwarmStatus;
pub use statusline::V3Progress;
pub use statusline::collision_window_clear;
