// crates/warden-conformance/src/clerk.rs
// ============================================================================
// Module: Warden Memory Clerk Cell
// Description: The canonical traced cell exercising the full control plane.
// Purpose: Produce the acceptance trace: reads, inference, gated writes, and
//          a mid-run coherence collapse.
// Dependencies: crate::runtime, warden-core, serde_json
// ============================================================================

//! ## Overview
//! The memory clerk reads twenty facts, performs one inference, and proposes
//! five writes. Its coherence collapses to 0.2 before the third write, so
//! the first two writes commit and the remaining three are blocked at the
//! suspended tier. The sealed run carries exactly one envelope whose memory
//! lineage holds the twenty reads and two commits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;
use warden_core::CellRuntime;
use warden_core::RuntimeError;
use warden_core::TaskId;

use crate::runtime::RunReport;
use crate::runtime::SimulatedRuntime;

// ============================================================================
// SECTION: Memory Clerk
// ============================================================================

/// The canonical conformance cell.
///
/// # Invariants
/// - Parameter defaults reproduce the acceptance scenario exactly.
#[derive(Debug, Clone, Copy)]
pub struct MemoryClerkCell {
    /// Number of facts to read.
    pub reads: usize,
    /// Number of writes to propose.
    pub writes: usize,
    /// 1-based write index before which coherence collapses.
    pub collapse_before_write: usize,
    /// Coherence score after the collapse.
    pub collapse_score: f64,
}

impl Default for MemoryClerkCell {
    fn default() -> Self {
        Self {
            reads: 20,
            writes: 5,
            collapse_before_write: 3,
            collapse_score: 0.2,
        }
    }
}

impl MemoryClerkCell {
    /// Runs the clerk scenario against a simulated runtime and seals it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when runtime operations or sealing fail.
    pub fn run(&self, runtime: &mut SimulatedRuntime) -> Result<RunReport, RuntimeError> {
        for index in 0 .. self.reads {
            runtime.seed_entry(
                "knowledge",
                &fact_key(index),
                json!({ "fact": index, "source": "intake" }),
            );
        }

        runtime.start_run(TaskId::new("memory-clerk"), "catalog intake facts into notes")?;
        self.execute(runtime)?;
        runtime.end_run()
    }

    /// Executes the clerk behavior against any cell runtime.
    fn execute<R: CellRuntime>(&self, runtime: &mut R) -> Result<(), RuntimeError> {
        for index in 0 .. self.reads {
            runtime.memory_read("knowledge", &fact_key(index))?;
        }

        runtime.model_infer("summarize the collected facts into filing notes")?;

        for write_number in 1 ..= self.writes {
            if write_number == self.collapse_before_write {
                runtime.set_coherence(self.collapse_score)?;
            }
            runtime.memory_write(
                "notes",
                &note_key(write_number),
                json!({
                    "note": write_number,
                    "summary": format!("filing note {write_number}"),
                }),
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Key Helpers
// ============================================================================

/// Returns the knowledge key for one fact index.
fn fact_key(index: usize) -> String {
    format!("fact-{index:02}")
}

/// Returns the notes key for one write number.
fn note_key(write_number: usize) -> String {
    format!("note-{write_number}")
}
