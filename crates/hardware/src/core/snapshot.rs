//! Observer snapshots of the core state.
//!
//! A [`CoreSnapshot`] is an owned copy of everything a front end may want to
//! render after a tick. Building one only reads the core.

use serde::Serialize;

use crate::core::units::{BranchResolution, CacheLine};
use crate::isa::{Instruction, Word};

/// An instruction held by a stage, with its address and rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedInstruction {
    /// Instruction address.
    pub pc: u64,
    /// The instruction.
    pub instruction: Instruction,
    /// Assembly rendering, e.g. `ADD r3, r1, r2`.
    pub text: String,
}

impl StagedInstruction {
    /// Pairs an instruction with its address.
    pub fn new(pc: u64, instruction: Instruction) -> Self {
        Self {
            pc,
            instruction,
            text: instruction.to_string(),
        }
    }
}

impl From<(u64, Instruction)> for StagedInstruction {
    fn from((pc, instruction): (u64, Instruction)) -> Self {
        Self::new(pc, instruction)
    }
}

/// Per-tick summary returned by `SisdCore::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Index of the tick, starting at 0.
    pub cycle: u64,
    /// Instructions retired during the tick.
    pub retired: u32,
    /// Branch resolved during the tick, if any.
    pub branch: Option<BranchResolution>,
}

/// Immutable copy of the core state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreSnapshot {
    /// Ticks completed.
    pub cycle: u64,
    /// Next fetch address.
    pub pc: u64,
    /// Core clock frequency.
    pub core_hz: u32,
    /// IF/ID latch.
    pub fetch_latch: Option<StagedInstruction>,
    /// Instruction waiting in the decoder.
    pub decode_slot: Option<StagedInstruction>,
    /// Instruction held by the ALU.
    pub alu: Option<StagedInstruction>,
    /// ALU is between the two phases of a branch.
    pub alu_branch_stalling: bool,
    /// Memory instruction held by the I/O interface.
    pub io: Option<StagedInstruction>,
    /// Register file contents.
    pub registers: Vec<Word>,
    /// Working memory contents.
    pub memory: Vec<Word>,
    /// Buffered instruction window, lowest address first.
    pub buffer: Vec<StagedInstruction>,
    /// Lowest address of the buffer window.
    pub buffer_floor: u64,
    /// Buffer is replaying a loop.
    pub iterating: bool,
    /// Instruction cache lines, head first; empty when the cache is disabled.
    pub cache_lines: Vec<CacheLine>,
    /// Instructions retired by the last tick.
    pub retired_this_tick: u32,
    /// Instructions retired since construction.
    pub retired_total: u64,
    /// Moving-average instructions per cycle.
    pub ipc: f64,
    /// Moving-average instructions per second at the core clock.
    pub ips: f64,
}
