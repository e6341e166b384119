// crates/warden-core/src/runtime/mod.rs
// ============================================================================
// Module: Warden Runtime Components
// Description: Ledgers, chains, gates, governors, and the evolution pipeline.
// Purpose: Re-export the control-plane components built on the core model.
// Dependencies: crate::runtime::*
// ============================================================================

//! ## Overview
//! Runtime components own all mutable control-plane state. Each component is
//! single-owner: mutation goes through the owning value and readers receive
//! copies or shared references. Multiple runs proceed in parallel only in
//! distinct runtime instances.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifact_ledger;
pub mod coherence;
pub mod evolution;
pub mod gates;
pub mod gateway;
pub mod governor;
pub mod memory_gate;
pub mod proof_chain;
pub mod run_ledger;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifact_ledger::ArtifactDraft;
pub use artifact_ledger::ArtifactLedger;
pub use artifact_ledger::DEFAULT_MAX_ARTIFACTS;
pub use artifact_ledger::LEDGER_EXPORT_VERSION;
pub use artifact_ledger::LedgerError;
pub use artifact_ledger::LedgerExport;
pub use coherence::CoherenceScheduler;
pub use coherence::PrivilegeShift;
pub use evolution::AdvanceOutcome;
pub use evolution::CompareVerdict;
pub use evolution::EvaluationOutput;
pub use evolution::EvolutionConfig;
pub use evolution::EvolutionError;
pub use evolution::EvolutionPipeline;
pub use evolution::GoldenTrace;
pub use evolution::ProposalDraft;
pub use evolution::TraceEvaluator;
pub use evolution::Variant;
pub use gates::DEFAULT_DIFF_SIZE_THRESHOLD;
pub use gates::DestructiveOpsGate;
pub use gates::DiffSizeGate;
pub use gates::EnforcementConfig;
pub use gates::EnforcementGates;
pub use gates::SecretsGate;
pub use gates::SecretsWriteHook;
pub use gates::ToolAllowlistGate;
pub use gates::redact;
pub use gateway::GatewayDecision;
pub use gateway::ToolCallRecord;
pub use gateway::ToolGateway;
pub use governor::BudgetCounter;
pub use governor::BudgetVerdict;
pub use governor::CounterLimit;
pub use governor::EconomicGovernor;
pub use governor::GovernorError;
pub use governor::GovernorLimits;
pub use memory_gate::ContradictionRecord;
pub use memory_gate::ContradictionSeverity;
pub use memory_gate::MemoryGateConfig;
pub use memory_gate::MemoryWriteGate;
pub use memory_gate::RATE_WINDOW_MS;
pub use memory_gate::WRITE_COMMITTED;
pub use memory_gate::WriteOp;
pub use memory_gate::WriteRequest;
pub use memory_gate::WriteVerdict;
pub use proof_chain::CHAIN_EXPORT_VERSION;
pub use proof_chain::ChainError;
pub use proof_chain::ChainExport;
pub use proof_chain::ProofChain;
pub use run_ledger::DurationThresholdEvaluator;
pub use run_ledger::RunLedger;
pub use run_ledger::RunLedgerError;
pub use run_ledger::SealedRunEvent;
pub use run_ledger::ViolationCountEvaluator;
