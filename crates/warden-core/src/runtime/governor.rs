// crates/warden-core/src/runtime/governor.rs
// ============================================================================
// Module: Warden Economic Governor
// Description: Monotone budget counters with soft warnings and hard stops.
// Purpose: Meter tokens, tool calls, storage, time, and cost per run.
// Dependencies: crate::core::trace, serde
// ============================================================================

//! ## Overview
//! The governor accumulates five monotone counters for a run. Soft limits
//! produce warnings the runtime forwards to telemetry; hard limits produce a
//! budget-exceeded verdict that aggregates to a blocking decision. Pricing
//! is injected by the host: the governor meters whatever cost increments the
//! caller records and never computes prices itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::trace::BudgetSnapshot;

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Budget counter labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCounter {
    /// Tokens consumed by inference.
    Tokens,
    /// Tool calls dispatched.
    ToolCalls,
    /// Bytes committed to storage.
    StorageBytes,
    /// Milliseconds elapsed.
    TimeMs,
    /// Accumulated cost in USD.
    CostUsd,
}

impl BudgetCounter {
    /// Returns the stable snake_case label for the counter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::ToolCalls => "tool_calls",
            Self::StorageBytes => "storage_bytes",
            Self::TimeMs => "time_ms",
            Self::CostUsd => "cost_usd",
        }
    }
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Soft and hard limit pair for one counter.
///
/// # Invariants
/// - `soft <= hard` after validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterLimit {
    /// Threshold that produces a warning.
    pub soft: f64,
    /// Threshold that produces a hard stop.
    pub hard: f64,
}

/// Limit configuration for the governor; absent limits never trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GovernorLimits {
    /// Token limits.
    pub tokens: Option<CounterLimit>,
    /// Tool call limits.
    pub tool_calls: Option<CounterLimit>,
    /// Storage byte limits.
    pub storage_bytes: Option<CounterLimit>,
    /// Elapsed time limits.
    pub time_ms: Option<CounterLimit>,
    /// Cost limits.
    pub cost_usd: Option<CounterLimit>,
}

/// Errors raised when limit configuration is invalid.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// A soft limit exceeded its hard limit.
    #[error("{counter} soft limit {soft} exceeds hard limit {hard}")]
    InvertedLimit {
        /// Offending counter label.
        counter: &'static str,
        /// Configured soft limit.
        soft: f64,
        /// Configured hard limit.
        hard: f64,
    },
}

impl GovernorLimits {
    /// Validates that every configured pair satisfies `soft <= hard`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernorError::InvertedLimit`] naming the first offending
    /// counter.
    pub fn validate(&self) -> Result<(), GovernorError> {
        let pairs: [(&'static str, Option<CounterLimit>); 5] = [
            ("tokens", self.tokens),
            ("tool_calls", self.tool_calls),
            ("storage_bytes", self.storage_bytes),
            ("time_ms", self.time_ms),
            ("cost_usd", self.cost_usd),
        ];
        for (counter, limit) in pairs {
            if let Some(limit) = limit
                && limit.soft > limit.hard
            {
                return Err(GovernorError::InvertedLimit {
                    counter,
                    soft: limit.soft,
                    hard: limit.hard,
                });
            }
        }
        Ok(())
    }

    /// Returns the limit pair for one counter.
    #[must_use]
    pub const fn for_counter(&self, counter: BudgetCounter) -> Option<CounterLimit> {
        match counter {
            BudgetCounter::Tokens => self.tokens,
            BudgetCounter::ToolCalls => self.tool_calls,
            BudgetCounter::StorageBytes => self.storage_bytes,
            BudgetCounter::TimeMs => self.time_ms,
            BudgetCounter::CostUsd => self.cost_usd,
        }
    }
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Budget verdict after recording usage.
///
/// # Invariants
/// - `HardExceeded` dominates `SoftExceeded` when both apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetVerdict {
    /// All counters within limits.
    Within,
    /// One or more counters crossed a soft limit.
    SoftExceeded(Vec<BudgetCounter>),
    /// One or more counters crossed a hard limit; the run must stop.
    HardExceeded(Vec<BudgetCounter>),
}

impl BudgetVerdict {
    /// Returns whether the run may continue.
    #[must_use]
    pub const fn permits_continuation(&self) -> bool {
        !matches!(self, Self::HardExceeded(_))
    }
}

// ============================================================================
// SECTION: Economic Governor
// ============================================================================

/// Cumulative budget governor for one run.
///
/// # Invariants
/// - Counters only increase; there is no reset short of dropping the
///   governor with its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicGovernor {
    /// Configured limits.
    limits: GovernorLimits,
    /// Accumulated usage.
    usage: BudgetSnapshot,
}

impl EconomicGovernor {
    /// Creates a governor with validated limits.
    ///
    /// # Errors
    ///
    /// Returns [`GovernorError`] when a soft limit exceeds its hard limit.
    pub fn new(limits: GovernorLimits) -> Result<Self, GovernorError> {
        limits.validate()?;
        Ok(Self {
            limits,
            usage: BudgetSnapshot::default(),
        })
    }

    /// Records inference tokens.
    pub fn record_tokens(&mut self, tokens: u64) -> BudgetVerdict {
        self.usage.tokens = self.usage.tokens.saturating_add(tokens);
        self.verdict()
    }

    /// Records one dispatched tool call.
    pub fn record_tool_call(&mut self) -> BudgetVerdict {
        self.usage.tool_calls = self.usage.tool_calls.saturating_add(1);
        self.verdict()
    }

    /// Records bytes committed to storage.
    pub fn record_storage(&mut self, bytes: u64) -> BudgetVerdict {
        self.usage.storage_bytes = self.usage.storage_bytes.saturating_add(bytes);
        self.verdict()
    }

    /// Advances the elapsed-time counter to the given value.
    ///
    /// Regressions are ignored so the counter stays monotone.
    pub fn record_elapsed(&mut self, elapsed_ms: u64) -> BudgetVerdict {
        self.usage.time_ms = self.usage.time_ms.max(elapsed_ms);
        self.verdict()
    }

    /// Records a host-priced cost increment.
    pub fn record_cost(&mut self, cost_usd: f64) -> BudgetVerdict {
        if cost_usd > 0.0 {
            self.usage.cost_usd += cost_usd;
        }
        self.verdict()
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub const fn snapshot(&self) -> BudgetSnapshot {
        self.usage
    }

    /// Computes the current verdict across every configured limit.
    #[must_use]
    pub fn verdict(&self) -> BudgetVerdict {
        let mut soft = Vec::new();
        let mut hard = Vec::new();
        for (counter, value) in self.counter_values() {
            if let Some(limit) = self.limits.for_counter(counter) {
                if value > limit.hard {
                    hard.push(counter);
                } else if value > limit.soft {
                    soft.push(counter);
                }
            }
        }
        if !hard.is_empty() {
            BudgetVerdict::HardExceeded(hard)
        } else if !soft.is_empty() {
            BudgetVerdict::SoftExceeded(soft)
        } else {
            BudgetVerdict::Within
        }
    }

    /// Returns the soft limit for a counter, for telemetry reporting.
    #[must_use]
    pub fn soft_limit(&self, counter: BudgetCounter) -> Option<f64> {
        self.limits.for_counter(counter).map(|limit| limit.soft)
    }

    /// Returns each counter paired with its current value as `f64`.
    fn counter_values(&self) -> [(BudgetCounter, f64); 5] {
        [
            (BudgetCounter::Tokens, self.usage.tokens as f64),
            (BudgetCounter::ToolCalls, self.usage.tool_calls as f64),
            (BudgetCounter::StorageBytes, self.usage.storage_bytes as f64),
            (BudgetCounter::TimeMs, self.usage.time_ms as f64),
            (BudgetCounter::CostUsd, self.usage.cost_usd),
        ]
    }
}
