// crates/warden-core/src/lib.rs
// ============================================================================
// Module: Warden Core Library
// Description: Public API surface for the Warden governance control plane.
// Purpose: Expose the core model, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Warden is a governance control plane for autonomous agent execution. It
//! mediates memory writes, tool invocations, and inference against policy
//! gates, derives privilege from a runtime coherence score, meters an
//! economic budget, and seals every run into an HMAC-signed, hash-chained
//! evidence trail that replays deterministically. The core decides and
//! records; it never executes real commands, runs real models, or touches
//! the network.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CellRuntime;
pub use interfaces::Clock;
pub use interfaces::EvaluatorResult;
pub use interfaces::ManualClock;
pub use interfaces::NoopTelemetry;
pub use interfaces::RunEvaluator;
pub use interfaces::RuntimeError;
pub use interfaces::TelemetryEvent;
pub use interfaces::TelemetrySink;
pub use interfaces::ToolError;
pub use interfaces::ToolExecutor;
pub use interfaces::ToolInvokeOutcome;
pub use interfaces::WriteHook;
pub use interfaces::WriteOutcome;
pub use runtime::AdvanceOutcome;
pub use runtime::ArtifactDraft;
pub use runtime::ArtifactLedger;
pub use runtime::BudgetCounter;
pub use runtime::BudgetVerdict;
pub use runtime::ChainError;
pub use runtime::ChainExport;
pub use runtime::CoherenceScheduler;
pub use runtime::CompareVerdict;
pub use runtime::CounterLimit;
pub use runtime::DestructiveOpsGate;
pub use runtime::DiffSizeGate;
pub use runtime::EconomicGovernor;
pub use runtime::EnforcementConfig;
pub use runtime::EnforcementGates;
pub use runtime::EvolutionConfig;
pub use runtime::EvolutionError;
pub use runtime::EvolutionPipeline;
pub use runtime::GatewayDecision;
pub use runtime::GoldenTrace;
pub use runtime::GovernorLimits;
pub use runtime::LedgerExport;
pub use runtime::MemoryGateConfig;
pub use runtime::MemoryWriteGate;
pub use runtime::PrivilegeShift;
pub use runtime::ProofChain;
pub use runtime::ProposalDraft;
pub use runtime::RunLedger;
pub use runtime::SealedRunEvent;
pub use runtime::SecretsGate;
pub use runtime::SecretsWriteHook;
pub use runtime::ToolAllowlistGate;
pub use runtime::ToolCallRecord;
pub use runtime::ToolGateway;
pub use runtime::TraceEvaluator;
pub use runtime::Variant;
pub use runtime::WriteOp;
pub use runtime::WriteRequest;
pub use runtime::WriteVerdict;
