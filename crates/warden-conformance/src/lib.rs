// crates/warden-conformance/src/lib.rs
// ============================================================================
// Module: Warden Conformance Library
// Description: Simulated runtime, memory clerk cell, and replay verifier.
// Purpose: Provide the canonical acceptance scenario for the control plane.
// Dependencies: crate::{clerk, replay, runtime}
// ============================================================================

//! ## Overview
//! The conformance kit exercises the whole control plane in-process: the
//! simulated runtime implements the cell seam over real gates, governor,
//! ledgers, and chain; the memory clerk produces the canonical acceptance
//! trace; and the replay verifier re-derives every recorded decision from
//! trace data alone.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clerk;
pub mod replay;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clerk::MemoryClerkCell;
pub use replay::ReplayDivergence;
pub use replay::ReplayReport;
pub use replay::ReplayVerifier;
pub use runtime::AssemblyError;
pub use runtime::RunOutcome;
pub use runtime::RunReport;
pub use runtime::RuntimeConfig;
pub use runtime::SimulatedRuntime;
