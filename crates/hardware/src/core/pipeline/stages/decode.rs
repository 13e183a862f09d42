//! Instruction Decode (ID) Stage.
//!
//! This module implements the dispatch stage of the single-issue pipeline. The
//! `Decoder` holds one instruction taken from the fetch latch and routes it:
//! 1. **Classification:** Arithmetic instructions and branches go to the ALU, LOAD and
//!    STORE go to the I/O interface.
//! 2. **Structural Hazards:** A busy ALU blocks only ALU-bound instructions; a memory
//!    instruction is still accepted while the I/O interface is free.
//! 3. **Data Hazards:** The instruction waits while it depends on an in-flight one.
//! 4. **Control Hazards:** After dispatching a branch, decode stalls until the ALU
//!    delivers the resolution through `take_branch`.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::common::SimResult;
use crate::config::Config;
use crate::core::pipeline::hazards::{self, Hazard};
use crate::core::pipeline::stages::fetch::InstructionFetcher;
use crate::core::units::{Alu, AddressedInstructionBuffer, BranchResolution, IoInterface};
use crate::isa::{Instruction, InstructionClass};

/// Why the decoder did not dispatch this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StallReason {
    /// The unit the instruction needs is occupied.
    Structural,
    /// The instruction depends on an in-flight one.
    Data(Hazard),
    /// A dispatched branch has not resolved yet.
    Control,
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => f.write_str("structural"),
            Self::Data(hazard) => write!(f, "data ({hazard})"),
            Self::Control => f.write_str("control"),
        }
    }
}

/// Result of one decode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Nothing to decode.
    Idle,
    /// The held instruction was handed to the ALU or the I/O interface.
    Dispatched {
        /// Its address.
        pc: u64,
        /// The instruction.
        instruction: Instruction,
    },
    /// The held instruction stays in the decoder.
    Stalled(StallReason),
}

/// Single-issue decoder.
#[derive(Debug, Clone)]
pub struct Decoder {
    slot: Option<(u64, Instruction)>,
    awaiting_branch: Option<u64>,
    register_count: usize,
    memory_size: usize,
    zero_register: Option<usize>,
}

impl Decoder {
    /// Creates an empty decoder validating operands against the given spaces.
    pub const fn new(register_count: usize, memory_size: usize, zero_register: Option<usize>) -> Self {
        Self {
            slot: None,
            awaiting_branch: None,
            register_count,
            memory_size,
            zero_register,
        }
    }

    /// Builds the decoder for the machine described by `config`.
    pub const fn from_config(config: &Config) -> Self {
        Self::new(
            config.registers.count,
            config.memory_size(),
            config.registers.zero_register,
        )
    }

    /// Instruction waiting for dispatch.
    pub const fn current(&self) -> Option<(u64, Instruction)> {
        self.slot
    }

    /// Address of the dispatched branch that has not resolved yet.
    pub const fn awaiting_branch(&self) -> Option<u64> {
        self.awaiting_branch
    }

    /// Executes one decode cycle.
    ///
    /// Pulls from the fetch latch when the slot is empty, then tries to dispatch.
    ///
    /// # Returns
    ///
    /// `SimError::MalformedInstruction` for an operand outside the configured spaces.
    pub fn decode(
        &mut self,
        fetcher: &mut InstructionFetcher,
        alu: &mut Alu,
        io: &mut IoInterface,
    ) -> SimResult<DecodeOutcome> {
        if self.awaiting_branch.is_some() {
            return Ok(DecodeOutcome::Stalled(StallReason::Control));
        }
        if self.slot.is_none() {
            self.slot = fetcher.take();
        }
        let Some((pc, instruction)) = self.slot else {
            return Ok(DecodeOutcome::Idle);
        };
        instruction.validate(pc, self.register_count, self.memory_size)?;

        let class = instruction.class();
        let unit_free = match class {
            InstructionClass::Arithmetic | InstructionClass::Branch => !alu.is_busy(),
            InstructionClass::Memory => io.is_ready(),
        };
        if !unit_free {
            return Ok(DecodeOutcome::Stalled(StallReason::Structural));
        }

        let in_flight: Vec<Instruction> = [alu.current(), io.current()]
            .into_iter()
            .flatten()
            .map(|(_, inst)| inst)
            .collect();
        if let Some(hazard) = hazards::detect(&instruction, &in_flight, self.zero_register) {
            return Ok(DecodeOutcome::Stalled(StallReason::Data(hazard)));
        }

        match class {
            InstructionClass::Memory => io.enqueue(pc, instruction)?,
            InstructionClass::Arithmetic => alu.dispatch(pc, instruction)?,
            InstructionClass::Branch => {
                alu.dispatch(pc, instruction)?;
                self.awaiting_branch = Some(pc);
            }
        }
        self.slot = None;
        trace!(pc, %instruction, "dispatch");
        Ok(DecodeOutcome::Dispatched { pc, instruction })
    }

    /// Applies a branch resolution delivered by the ALU.
    ///
    /// A taken branch redirects fetch to its target. A branch that falls through
    /// tells the instruction buffer the loop it closes has finished.
    pub fn take_branch(
        &mut self,
        resolution: BranchResolution,
        fetcher: &mut InstructionFetcher,
        buffer: &mut AddressedInstructionBuffer,
    ) {
        self.awaiting_branch = None;
        debug!(
            pc = resolution.pc,
            target = resolution.target,
            taken = resolution.taken,
            "branch resolved"
        );
        if resolution.taken {
            fetcher.redirect(resolution.target);
        } else {
            let _ = buffer.clear_jump_instruction(resolution.pc);
        }
    }
}
