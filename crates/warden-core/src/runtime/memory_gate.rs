// crates/warden-core/src/runtime/memory_gate.rs
// ============================================================================
// Module: Warden Memory Write Gate
// Description: Authority checks, rate limits, capability and contradiction gating.
// Purpose: Decide whether a proposed memory write may commit.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Every proposed memory write is evaluated against an ordered rule set:
//! namespace authorization, a sliding 60 second rate window, overwrite and
//! delete capabilities, contradiction tracking, and finally any external
//! hooks (the secrets gate in the default assembly). The first failing rule
//! determines the outcome; a fully passing write answers `"Write committed"`.
//!
//! The privilege check required by the write-acceptance invariant is the
//! runtime's responsibility and happens before this gate is consulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::authority::MemoryAuthority;
use crate::core::authority::MemoryEntry;
use crate::core::crypto::sha256_canonical_hex;
use crate::core::gate::GateDecision;
use crate::core::identifiers::AgentId;
use crate::core::time::Timestamp;
use crate::interfaces::WriteHook;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sliding rate-limit window in milliseconds.
pub const RATE_WINDOW_MS: i64 = 60_000;

/// Success explanation for a committed write.
pub const WRITE_COMMITTED: &str = "Write committed";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Memory write gate configuration.
///
/// # Invariants
/// - `low_trust_threshold` lies within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryGateConfig {
    /// Whether contradiction tracking is enabled.
    pub track_contradictions: bool,
    /// Trust level below which contradictions escalate and deny.
    pub low_trust_threshold: f64,
}

impl Default for MemoryGateConfig {
    fn default() -> Self {
        Self {
            track_contradictions: true,
            low_trust_threshold: 0.5,
        }
    }
}

// ============================================================================
// SECTION: Write Operations
// ============================================================================

/// Kind of mutation proposed against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    /// Create a new entry.
    Create,
    /// Replace an existing entry.
    Overwrite,
    /// Remove an existing entry.
    Delete,
}

/// One proposed write presented to the gate.
///
/// # Invariants
/// - `existing` carries the current entry when the key is already present.
#[derive(Debug)]
pub struct WriteRequest<'a> {
    /// Authority proposing the write.
    pub authority: &'a MemoryAuthority,
    /// Target namespace.
    pub namespace: &'a str,
    /// Target key.
    pub key: &'a str,
    /// Proposed value.
    pub value: &'a Value,
    /// Current entry at `(namespace, key)` when present.
    pub existing: Option<&'a MemoryEntry>,
    /// Evaluation time for the rate window.
    pub now: Timestamp,
}

// ============================================================================
// SECTION: Verdicts and Contradictions
// ============================================================================

/// Severity of a recorded contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionSeverity {
    /// Competing value from a trusted authority; recorded, write proceeds.
    Normal,
    /// Competing value from a low-trust authority; write is denied.
    Escalated,
}

/// A recorded contradiction between competing values for one key.
///
/// # Invariants
/// - `prior_hash` and `proposed_hash` differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionRecord {
    /// Namespace of the contested key.
    pub namespace: String,
    /// Contested key.
    pub key: String,
    /// Hash of the previously stored value.
    pub prior_hash: String,
    /// Hash of the newly proposed value.
    pub proposed_hash: String,
    /// Contradiction severity.
    pub severity: ContradictionSeverity,
    /// Agent proposing the competing value.
    pub agent_id: AgentId,
    /// When the contradiction was recorded.
    pub recorded_at: Timestamp,
}

/// Gate verdict for one proposed write.
///
/// # Invariants
/// - `reason` names the first failing rule, or [`WRITE_COMMITTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteVerdict {
    /// Whether the write may commit.
    pub allowed: bool,
    /// Explanation of the outcome.
    pub reason: String,
}

impl WriteVerdict {
    /// Creates a passing verdict.
    fn committed() -> Self {
        Self {
            allowed: true,
            reason: WRITE_COMMITTED.to_string(),
        }
    }

    /// Creates a failing verdict with the given reason.
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Memory Write Gate
// ============================================================================

/// Authority-scoped write gate with rate limiting and contradiction history.
pub struct MemoryWriteGate {
    /// Gate configuration.
    config: MemoryGateConfig,
    /// Committed-write timestamps per agent for the rate window.
    write_log: BTreeMap<AgentId, VecDeque<i64>>,
    /// Value-hash history per `(namespace, key)`.
    value_history: BTreeMap<(String, String), Vec<String>>,
    /// Recorded contradictions in arrival order.
    contradictions: Vec<ContradictionRecord>,
    /// External hooks consulted after the built-in rules.
    hooks: Vec<Box<dyn WriteHook>>,
}

impl MemoryWriteGate {
    /// Creates a gate with the given configuration and no hooks.
    #[must_use]
    pub fn new(config: MemoryGateConfig) -> Self {
        Self {
            config,
            write_log: BTreeMap::new(),
            value_history: BTreeMap::new(),
            contradictions: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Registers an external hook consulted for every passing write.
    pub fn register_hook(&mut self, hook: Box<dyn WriteHook>) {
        self.hooks.push(hook);
    }

    /// Evaluates a proposed write and, when allowed, records it against the
    /// rate window and value history.
    ///
    /// Rules run in order: namespace authorization, rate limit, capability,
    /// contradiction tracking, external hooks. The first failure wins.
    pub fn evaluate_write(&mut self, request: &WriteRequest<'_>, op: WriteOp) -> WriteVerdict {
        if !request.authority.authorizes_namespace(request.namespace) {
            return WriteVerdict::denied(format!(
                "Namespace '{}' is not granted to agent '{}'",
                request.namespace,
                request.authority.agent_id.as_str()
            ));
        }

        if self.rate_exceeded(request) {
            return WriteVerdict::denied(format!(
                "Rate limit exceeded: more than {} writes in the last 60s",
                request.authority.max_writes_per_minute
            ));
        }

        let effective_op = if op == WriteOp::Delete {
            WriteOp::Delete
        } else if request.existing.is_some() {
            WriteOp::Overwrite
        } else {
            op
        };
        if effective_op == WriteOp::Overwrite && !request.authority.can_overwrite {
            return WriteVerdict::denied("Authority does not permit overwriting existing entries");
        }
        if effective_op == WriteOp::Delete && !request.authority.can_delete {
            return WriteVerdict::denied("Authority does not permit deleting entries");
        }

        let proposed_hash = match sha256_canonical_hex(request.value) {
            Ok(hash) => hash,
            Err(err) => {
                return WriteVerdict::denied(format!("Value cannot be canonicalized: {err}"));
            }
        };

        if self.config.track_contradictions
            && let Some(record) = self.detect_contradiction(request, &proposed_hash)
        {
            let escalated = record.severity == ContradictionSeverity::Escalated;
            self.contradictions.push(record);
            if escalated {
                return WriteVerdict::denied(format!(
                    "Contradicting value for '{}/{}' from low-trust authority",
                    request.namespace, request.key
                ));
            }
        }

        if let Some(result) = self.consult_hooks(request) {
            return WriteVerdict::denied(result);
        }

        self.record_commit(request, proposed_hash);
        WriteVerdict::committed()
    }

    /// Returns the recorded contradictions for one `(namespace, key)`.
    #[must_use]
    pub fn contradictions_for(&self, namespace: &str, key: &str) -> Vec<&ContradictionRecord> {
        self.contradictions
            .iter()
            .filter(|record| record.namespace == namespace && record.key == key)
            .collect()
    }

    /// Returns every recorded contradiction in arrival order.
    #[must_use]
    pub fn contradictions(&self) -> &[ContradictionRecord] {
        &self.contradictions
    }

    /// Returns the committed value-hash history for one `(namespace, key)`.
    #[must_use]
    pub fn value_history(&self, namespace: &str, key: &str) -> &[String] {
        self.value_history
            .get(&(namespace.to_string(), key.to_string()))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns whether the authority's rate window is already full.
    fn rate_exceeded(&mut self, request: &WriteRequest<'_>) -> bool {
        let cutoff = request.now.as_millis() - RATE_WINDOW_MS;
        let window = self.write_log.entry(request.authority.agent_id.clone()).or_default();
        while window.front().is_some_and(|&at| at < cutoff) {
            window.pop_front();
        }
        window.len() >= request.authority.max_writes_per_minute as usize
    }

    /// Detects a contradiction against the committed value history.
    fn detect_contradiction(
        &self,
        request: &WriteRequest<'_>,
        proposed_hash: &str,
    ) -> Option<ContradictionRecord> {
        let history = self
            .value_history
            .get(&(request.namespace.to_string(), request.key.to_string()))?;
        let prior = history.iter().rev().find(|hash| hash.as_str() != proposed_hash)?;
        let severity = if request.authority.trust_level < self.config.low_trust_threshold {
            ContradictionSeverity::Escalated
        } else {
            ContradictionSeverity::Normal
        };
        Some(ContradictionRecord {
            namespace: request.namespace.to_string(),
            key: request.key.to_string(),
            prior_hash: prior.clone(),
            proposed_hash: proposed_hash.to_string(),
            severity,
            agent_id: request.authority.agent_id.clone(),
            recorded_at: request.now,
        })
    }

    /// Runs external hooks; returns a denial reason when any hook blocks.
    fn consult_hooks(&self, request: &WriteRequest<'_>) -> Option<String> {
        let serialized = request.value.to_string();
        for hook in &self.hooks {
            if let Some(result) = hook.inspect(request.namespace, request.key, &serialized)
                && result.decision == GateDecision::Block
            {
                return Some(format!("{}: {}", result.gate_name, result.reason));
            }
        }
        None
    }

    /// Records a committed write in the rate window and value history.
    fn record_commit(&mut self, request: &WriteRequest<'_>, proposed_hash: String) {
        self.write_log
            .entry(request.authority.agent_id.clone())
            .or_default()
            .push_back(request.now.as_millis());
        self.value_history
            .entry((request.namespace.to_string(), request.key.to_string()))
            .or_default()
            .push(proposed_hash);
    }
}

impl std::fmt::Debug for MemoryWriteGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWriteGate")
            .field("config", &self.config)
            .field("contradictions", &self.contradictions.len())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}
