// crates/warden-conformance/src/runtime.rs
// ============================================================================
// Module: Warden Simulated Runtime
// Description: Deterministic CellRuntime implementation for conformance runs.
// Purpose: Exercise gates, governor, ledger, and chain without external I/O.
// Dependencies: warden-core, serde_json
// ============================================================================

//! ## Overview
//! The simulated runtime is a complete, deterministic [`CellRuntime`]: a
//! logical clock advances one millisecond per emitted event, memory lives in
//! an in-process store, and every operation flows through the same gates,
//! governor, and ledgers a production runtime would use. Ending a run seals
//! the run event and appends exactly one proof envelope carrying the memory
//! lineage and tool-call hashes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use warden_core::Artifact;
use warden_core::ArtifactContent;
use warden_core::ArtifactDraft;
use warden_core::ArtifactKind;
use warden_core::ArtifactLedger;
use warden_core::ArtifactLineage;
use warden_core::BudgetSnapshot;
use warden_core::CellId;
use warden_core::CellRuntime;
use warden_core::CoherenceScheduler;
use warden_core::CoherenceThresholds;
use warden_core::EnforcementConfig;
use warden_core::EnforcementGates;
use warden_core::EnvelopeMetadata;
use warden_core::EventId;
use warden_core::MemoryAuthority;
use warden_core::MemoryEntry;
use warden_core::MemoryGateConfig;
use warden_core::MemoryLineageEntry;
use warden_core::MemoryOp;
use warden_core::MemoryWriteGate;
use warden_core::PrivilegeLevel;
use warden_core::ProofChain;
use warden_core::ProofEnvelope;
use warden_core::RunEvent;
use warden_core::RunId;
use warden_core::RunLedger;
use warden_core::RuntimeError;
use warden_core::SecretsWriteHook;
use warden_core::SessionId;
use warden_core::SigningKey;
use warden_core::TaskId;
use warden_core::TenantId;
use warden_core::Timestamp;
use warden_core::ToolGateway;
use warden_core::ToolInvokeOutcome;
use warden_core::TraceEvent;
use warden_core::TraceEventType;
use warden_core::WriteOutcome;
use warden_core::WriteRequest;
use warden_core::core::crypto::CryptoError;
use warden_core::core::crypto::sha256_canonical_hex;
use warden_core::runtime::EconomicGovernor;
use warden_core::runtime::GovernorLimits;
use warden_core::runtime::WriteOp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while assembling a simulated runtime.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The signing key material was rejected.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The coherence thresholds were invalid.
    #[error("invalid thresholds: {0}")]
    Thresholds(String),
    /// The governor limits were invalid.
    #[error("invalid governor limits: {0}")]
    Limits(String),
    /// The memory authority was invalid.
    #[error("invalid authority: {0}")]
    Authority(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Assembly configuration for a simulated runtime.
///
/// # Invariants
/// - `signing_key` is non-empty; assembly fails otherwise.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Memory authority for the run.
    pub authority: MemoryAuthority,
    /// Coherence thresholds.
    pub thresholds: CoherenceThresholds,
    /// Governor limits.
    pub limits: GovernorLimits,
    /// Memory write gate configuration.
    pub memory_gate: MemoryGateConfig,
    /// Enforcement gate configuration.
    pub enforcement: EnforcementConfig,
    /// Initial coherence score.
    pub initial_coherence: f64,
    /// Opaque policy guidance hash.
    pub guidance_hash: String,
    /// HMAC signing key material.
    pub signing_key: Vec<u8>,
    /// Session the runs belong to.
    pub session_id: SessionId,
    /// Cell identifier for produced artifacts.
    pub cell_id: CellId,
    /// Tenant owning the runs.
    pub tenant_id: TenantId,
    /// Logical clock origin in epoch milliseconds.
    pub clock_origin_ms: i64,
}

impl RuntimeConfig {
    /// Creates a configuration with conformance defaults for one authority.
    #[must_use]
    pub fn new(authority: MemoryAuthority, guidance_hash: impl Into<String>) -> Self {
        Self {
            authority,
            thresholds: CoherenceThresholds::default(),
            limits: GovernorLimits::default(),
            memory_gate: MemoryGateConfig::default(),
            enforcement: EnforcementConfig::default(),
            initial_coherence: 0.9,
            guidance_hash: guidance_hash.into(),
            signing_key: b"warden-conformance-key".to_vec(),
            session_id: SessionId::uuid(),
            cell_id: CellId::uuid(),
            tenant_id: TenantId::new("conformance"),
            clock_origin_ms: 1_700_000_000_000,
        }
    }
}

// ============================================================================
// SECTION: Run Reports
// ============================================================================

/// Aggregate outcome of a sealed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every attempted write committed.
    Accepted,
    /// Some writes committed and some were blocked.
    Restricted,
    /// Every attempted write was blocked.
    Blocked,
}

impl RunOutcome {
    /// Returns the stable lowercase label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Restricted => "restricted",
            Self::Blocked => "blocked",
        }
    }
}

/// Report returned when a run is sealed.
///
/// # Invariants
/// - Counters reflect the sealed trace exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Sealed run event identifier.
    pub event_id: EventId,
    /// Envelope appended for the run.
    pub envelope: ProofEnvelope,
    /// Aggregate run outcome.
    pub outcome: RunOutcome,
    /// Memory reads performed.
    pub memory_reads: usize,
    /// Memory writes attempted.
    pub memory_writes_attempted: usize,
    /// Memory writes committed.
    pub memory_writes_committed: usize,
    /// Memory writes blocked.
    pub memory_writes_blocked: usize,
}

// ============================================================================
// SECTION: Simulated Runtime
// ============================================================================

/// Deterministic in-process [`CellRuntime`] implementation.
///
/// # Invariants
/// - `seq` is dense 0-based; the logical clock advances one millisecond per
///   emitted event, so timestamps never decrease.
/// - Cells hold no cross-run state: create one runtime per run.
pub struct SimulatedRuntime {
    /// Memory authority for the run.
    authority: MemoryAuthority,
    /// Opaque policy guidance hash.
    guidance_hash: String,
    /// Session identifier.
    session_id: SessionId,
    /// Cell identifier for produced artifacts.
    cell_id: CellId,
    /// Tenant owning the runs.
    tenant_id: TenantId,
    /// Coherence scheduler.
    scheduler: CoherenceScheduler,
    /// Economic governor.
    governor: EconomicGovernor,
    /// Memory write gate.
    memory_gate: MemoryWriteGate,
    /// Tool gateway.
    gateway: ToolGateway,
    /// Run ledger sealing events.
    run_ledger: RunLedger,
    /// Proof chain for sealed envelopes.
    chain: ProofChain,
    /// Artifact ledger for production outputs.
    artifacts: ArtifactLedger,
    /// In-process memory store.
    store: BTreeMap<(String, String), MemoryEntry>,
    /// Emitted trace events.
    trace: Vec<TraceEvent>,
    /// Memory lineage accumulated for the envelope.
    lineage: Vec<MemoryLineageEntry>,
    /// Logical clock position in epoch milliseconds.
    clock_ms: i64,
    /// Timestamp of the current run's start.
    run_started_at: Timestamp,
    /// Open run event, if a run is active.
    open_event: Option<RunEvent>,
    /// Reads performed in the current run.
    reads: usize,
    /// Writes attempted in the current run.
    writes_attempted: usize,
    /// Writes committed in the current run.
    writes_committed: usize,
    /// Writes blocked in the current run.
    writes_blocked: usize,
}

impl SimulatedRuntime {
    /// Assembles a runtime from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when the key, thresholds, limits, or
    /// authority fail validation.
    pub fn new(config: RuntimeConfig) -> Result<Self, AssemblyError> {
        config
            .authority
            .validate()
            .map_err(|err| AssemblyError::Authority(err.to_string()))?;
        let key = SigningKey::new(&config.signing_key)?;
        let scheduler = CoherenceScheduler::new(config.thresholds, config.initial_coherence)
            .map_err(|err| AssemblyError::Thresholds(err.to_string()))?;
        let governor = EconomicGovernor::new(config.limits)
            .map_err(|err| AssemblyError::Limits(err.to_string()))?;
        let mut memory_gate = MemoryWriteGate::new(config.memory_gate);
        memory_gate.register_hook(Box::new(SecretsWriteHook));
        Ok(Self {
            authority: config.authority,
            guidance_hash: config.guidance_hash,
            session_id: config.session_id,
            cell_id: config.cell_id,
            tenant_id: config.tenant_id,
            scheduler,
            governor,
            memory_gate,
            gateway: ToolGateway::new(EnforcementGates::new(&config.enforcement)),
            run_ledger: RunLedger::new(),
            chain: ProofChain::new(key.clone()),
            artifacts: ArtifactLedger::with_default_capacity(key),
            store: BTreeMap::new(),
            trace: Vec::new(),
            lineage: Vec::new(),
            clock_ms: config.clock_origin_ms,
            run_started_at: Timestamp::from_millis(config.clock_origin_ms),
            open_event: None,
            reads: 0,
            writes_attempted: 0,
            writes_committed: 0,
            writes_blocked: 0,
        })
    }

    /// Seeds a memory entry before a run, bypassing gating.
    ///
    /// Provisioning is not part of a run: nothing is traced and no lineage
    /// is recorded.
    pub fn seed_entry(&mut self, namespace: &str, key: &str, value: Value) {
        let entry = MemoryEntry {
            key: key.to_string(),
            namespace: namespace.to_string(),
            value,
            author: self.authority.agent_id.clone(),
            created_at: Timestamp::from_millis(self.clock_ms),
        };
        self.store.insert((namespace.to_string(), key.to_string()), entry);
    }

    /// Starts a run, emitting the `run_start` event.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RunAlreadyStarted`] when a run is open.
    pub fn start_run(&mut self, task_id: TaskId, intent: &str) -> Result<EventId, RuntimeError> {
        if self.open_event.is_some() {
            return Err(RuntimeError::RunAlreadyStarted);
        }
        let event = self.run_ledger.create_event(
            task_id,
            intent,
            self.guidance_hash.clone(),
            self.session_id.clone(),
        );
        let event_id = event.event_id.clone();
        self.run_started_at = Timestamp::from_millis(self.clock_ms);
        self.trace.clear();
        self.reads = 0;
        self.writes_attempted = 0;
        self.writes_committed = 0;
        self.writes_blocked = 0;
        self.lineage.clear();
        self.open_event = Some(event);
        self.emit(
            TraceEventType::RunStart,
            json!({
                "intent": intent,
                "initial_coherence": self.scheduler.score(),
            }),
            "start".to_string(),
        );
        Ok(event_id)
    }

    /// Ends the run: emits `run_end`, seals the run event, and appends one
    /// proof envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active or sealing fails.
    pub fn end_run(&mut self) -> Result<RunReport, RuntimeError> {
        let mut event = self.open_event.take().ok_or(RuntimeError::NoActiveRun)?;

        let outcome = if self.writes_attempted == 0 || self.writes_blocked == 0 {
            RunOutcome::Accepted
        } else if self.writes_committed == 0 {
            RunOutcome::Blocked
        } else {
            RunOutcome::Restricted
        };

        self.emit(
            TraceEventType::RunEnd,
            json!({
                "outcome": outcome.as_str(),
                "reads": self.reads,
                "writes_attempted": self.writes_attempted,
                "writes_committed": self.writes_committed,
                "writes_blocked": self.writes_blocked,
            }),
            "end".to_string(),
        );

        let now = Timestamp::from_millis(self.clock_ms);
        let tool_calls = self.gateway.take_calls();
        event.tools_used = tool_calls.iter().map(|call| call.tool_name.clone()).collect();
        event.duration_ms = now.millis_since(self.run_started_at);
        event.outcome_accepted = outcome == RunOutcome::Accepted;

        let sealed = self
            .run_ledger
            .finalize_event(event)
            .map_err(|err| RuntimeError::Seal(err.to_string()))?;
        let sealed_event = sealed.event.clone();

        let metadata = EnvelopeMetadata {
            agent_id: self.authority.agent_id.clone(),
            session_id: self.session_id.clone(),
            parent_envelope_id: None,
        };
        let envelope = self
            .chain
            .append(&sealed_event, &tool_calls, &self.lineage, metadata, now)
            .map_err(|err| RuntimeError::Seal(err.to_string()))?;

        Ok(RunReport {
            event_id: sealed_event.event_id,
            envelope,
            outcome,
            memory_reads: self.reads,
            memory_writes_attempted: self.writes_attempted,
            memory_writes_committed: self.writes_committed,
            memory_writes_blocked: self.writes_blocked,
        })
    }

    /// Returns the emitted trace.
    #[must_use]
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Returns the proof chain.
    #[must_use]
    pub const fn chain(&self) -> &ProofChain {
        &self.chain
    }

    /// Returns the memory lineage accumulated for the current run.
    #[must_use]
    pub fn lineage(&self) -> &[MemoryLineageEntry] {
        &self.lineage
    }

    /// Returns the coherence thresholds in force.
    #[must_use]
    pub const fn thresholds(&self) -> &CoherenceThresholds {
        self.scheduler.thresholds()
    }

    /// Returns the artifact ledger.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactLedger {
        &self.artifacts
    }

    /// Records a production artifact with lineage back to the open run.
    ///
    /// The lineage captures the run's event identifier, the memory keys read
    /// so far, and every tool call recorded by the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when no run is active or signing fails.
    pub fn record_artifact(
        &mut self,
        kind: ArtifactKind,
        name: &str,
        description: &str,
        content: ArtifactContent,
        tags: Vec<String>,
    ) -> Result<Artifact, RuntimeError> {
        let event = self.open_event.as_ref().ok_or(RuntimeError::NoActiveRun)?;
        let memory_reads = self
            .lineage
            .iter()
            .filter(|entry| entry.op == MemoryOp::Read)
            .map(|entry| format!("{}/{}", entry.namespace, entry.key))
            .collect();
        let draft = ArtifactDraft {
            run_id: RunId::new(event.event_id.as_str()),
            cell_id: self.cell_id.clone(),
            tenant_id: self.tenant_id.clone(),
            kind,
            name: name.to_string(),
            description: description.to_string(),
            content,
            metadata: json!({}),
            lineage: ArtifactLineage {
                parent_artifacts: Vec::new(),
                source_run_id: Some(RunId::new(event.event_id.as_str())),
                source_trace_ref: Some(format!("trace:{}", self.trace.len())),
                tool_call_ids: self.gateway.calls().iter().map(|call| call.call_id.clone()).collect(),
                memory_reads,
            },
            tags,
        };
        let created_at = Timestamp::from_millis(self.clock_ms);
        self.artifacts
            .record(draft, created_at)
            .map_err(|err| RuntimeError::Internal(err.to_string()))
    }

    /// Emits one trace event, advancing the logical clock.
    fn emit(&mut self, event_type: TraceEventType, payload: Value, decision: String) {
        self.clock_ms += 1;
        let ts = Timestamp::from_millis(self.clock_ms);
        let elapsed = ts.millis_since(self.run_started_at);
        self.governor.record_elapsed(elapsed);
        let budget: BudgetSnapshot = self.governor.snapshot();
        let seq = self.trace.len() as u64;
        self.trace.push(TraceEvent {
            seq,
            ts,
            event_type,
            payload,
            decision,
            budget,
        });
    }

    /// Hashes a value for lineage entries; canonicalization failures map to
    /// the null hash so tracing never aborts a run.
    fn value_hash(value: &Value) -> String {
        sha256_canonical_hex(value)
            .unwrap_or_else(|_| sha256_canonical_hex(&Value::Null).unwrap_or_default())
    }
}

// ============================================================================
// SECTION: CellRuntime Implementation
// ============================================================================

impl CellRuntime for SimulatedRuntime {
    fn memory_read(&mut self, namespace: &str, key: &str) -> Result<Option<Value>, RuntimeError> {
        if self.open_event.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        let value = self
            .store
            .get(&(namespace.to_string(), key.to_string()))
            .map(|entry| entry.value.clone());
        let hashed = value.clone().unwrap_or(Value::Null);
        let value_hash = Self::value_hash(&hashed);

        self.lineage.push(MemoryLineageEntry {
            key: key.to_string(),
            namespace: namespace.to_string(),
            op: MemoryOp::Read,
            value_hash: value_hash.clone(),
        });
        self.reads += 1;
        self.emit(
            TraceEventType::MemoryRead,
            json!({
                "namespace": namespace,
                "key": key,
                "found": value.is_some(),
                "value_hash": value_hash.clone(),
            }),
            "allow".to_string(),
        );
        Ok(value)
    }

    fn memory_write(
        &mut self,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<WriteOutcome, RuntimeError> {
        if self.open_event.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        self.writes_attempted += 1;
        let value_hash = Self::value_hash(&value);

        self.emit(
            TraceEventType::MemoryWriteProposed,
            json!({
                "namespace": namespace,
                "key": key,
                "value_hash": value_hash.clone(),
            }),
            "evaluate".to_string(),
        );

        let level = self.scheduler.level();
        self.emit(
            TraceEventType::CoherenceCheck,
            json!({
                "score": self.scheduler.score(),
                "namespace": namespace,
                "key": key,
            }),
            level.as_str().to_string(),
        );

        if !level.permits_writes() {
            let reason =
                format!("Privilege level '{}' denies memory writes", level.as_str());
            self.writes_blocked += 1;
            self.emit(
                TraceEventType::MemoryWriteBlocked,
                json!({
                    "namespace": namespace,
                    "key": key,
                    "reason_kind": "privilege",
                    "reason": reason.clone(),
                }),
                "block".to_string(),
            );
            return Ok(WriteOutcome {
                committed: false,
                reason,
            });
        }

        let now = Timestamp::from_millis(self.clock_ms);
        let existing = self.store.get(&(namespace.to_string(), key.to_string()));
        let request = WriteRequest {
            authority: &self.authority,
            namespace,
            key,
            value: &value,
            existing,
            now,
        };
        let verdict = self.memory_gate.evaluate_write(&request, WriteOp::Create);

        if verdict.allowed {
            let entry = MemoryEntry {
                key: key.to_string(),
                namespace: namespace.to_string(),
                value: value.clone(),
                author: self.authority.agent_id.clone(),
                created_at: now,
            };
            self.store.insert((namespace.to_string(), key.to_string()), entry);
            self.lineage.push(MemoryLineageEntry {
                key: key.to_string(),
                namespace: namespace.to_string(),
                op: MemoryOp::Write,
                value_hash: value_hash.clone(),
            });
            self.governor.record_storage(value.to_string().len() as u64);
            self.writes_committed += 1;
            self.emit(
                TraceEventType::MemoryWriteCommitted,
                json!({
                    "namespace": namespace,
                    "key": key,
                    "value_hash": value_hash.clone(),
                }),
                "allow".to_string(),
            );
        } else {
            self.writes_blocked += 1;
            self.emit(
                TraceEventType::MemoryWriteBlocked,
                json!({
                    "namespace": namespace,
                    "key": key,
                    "reason_kind": "gate",
                    "reason": verdict.reason.clone(),
                }),
                "block".to_string(),
            );
        }
        Ok(WriteOutcome {
            committed: verdict.allowed,
            reason: verdict.reason,
        })
    }

    fn model_infer(&mut self, prompt: &str) -> Result<String, RuntimeError> {
        if self.open_event.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        let tokens = prompt.split_whitespace().count() as u64 + 16;
        self.governor.record_tokens(tokens);
        let prompt_hash = warden_core::sha256_hex(prompt.as_bytes());
        self.emit(
            TraceEventType::ModelInfer,
            json!({
                "prompt_hash": prompt_hash,
                "tokens": tokens,
            }),
            "allow".to_string(),
        );
        Ok(format!("inference:{}", &prompt_hash[.. 12]))
    }

    fn tool_invoke(
        &mut self,
        tool_name: &str,
        params: Value,
    ) -> Result<ToolInvokeOutcome, RuntimeError> {
        if self.open_event.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        if !self.governor.verdict().permits_continuation() {
            self.emit(
                TraceEventType::ToolInvoke,
                json!({
                    "tool": tool_name,
                    "allowed": false,
                    "reason": "budget-exceeded",
                }),
                "block".to_string(),
            );
            return Ok(ToolInvokeOutcome {
                allowed: false,
                gate: None,
                result: None,
            });
        }

        let decision = self.gateway.evaluate(tool_name, &params);
        if !decision.allowed {
            self.emit(
                TraceEventType::ToolInvoke,
                json!({
                    "tool": tool_name,
                    "allowed": false,
                }),
                "block".to_string(),
            );
            return Ok(ToolInvokeOutcome {
                allowed: false,
                gate: decision.gate,
                result: None,
            });
        }

        self.governor.record_tool_call();
        let result = json!({
            "status": "simulated",
            "tool": tool_name,
        });
        let now = Timestamp::from_millis(self.clock_ms);
        self.gateway.record(tool_name, params, result.clone(), now, 1);
        self.emit(
            TraceEventType::ToolInvoke,
            json!({
                "tool": tool_name,
                "allowed": true,
            }),
            "allow".to_string(),
        );
        Ok(ToolInvokeOutcome {
            allowed: true,
            gate: decision.gate,
            result: Some(result),
        })
    }

    fn set_coherence(&mut self, score: f64) -> Result<(), RuntimeError> {
        if self.open_event.is_none() {
            return Err(RuntimeError::NoActiveRun);
        }
        if let Some(shift) = self.scheduler.set_score(score) {
            let decision = shift.decision();
            self.emit(
                TraceEventType::PrivilegeChange,
                json!({
                    "previous_level": shift.previous.as_str(),
                    "new_level": shift.new_level.as_str(),
                    "score": shift.score,
                }),
                decision,
            );
        }
        Ok(())
    }

    fn privilege(&self) -> PrivilegeLevel {
        self.scheduler.level()
    }
}

impl std::fmt::Debug for SimulatedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedRuntime")
            .field("agent", &self.authority.agent_id)
            .field("trace_len", &self.trace.len())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}
