//! I/O interface between the core and working memory.
//!
//! The `IoInterface` executes LOAD and STORE instructions. It holds at most one
//! in-flight memory instruction; a second one is refused until the first retires.
//! Completion is gated on the target bank's own readiness countdown:
//! - **LOAD:** request the bank, read the cell, release the bank, then write the
//!   value into the result register.
//! - **STORE:** request the bank, then read the source register and write the cell.
//!
//! Memory instructions proceed independently of the ALU and are never cancelled:
//! a taken branch does not abort an access already started.

use tracing::trace;

use crate::common::{Requester, SimError, SimResult};
use crate::core::arch::RegisterBank;
use crate::isa::{Instruction, InstructionClass, Word};
use crate::soc::WorkingMemory;

#[derive(Debug, Clone, Copy)]
struct IoSlot {
    pc: u64,
    instruction: Instruction,
    loaded: Option<Word>,
}

/// One-slot memory instruction queue.
#[derive(Debug, Clone)]
pub struct IoInterface {
    slot: Option<IoSlot>,
    frequency: u32,
}

impl IoInterface {
    /// Creates an empty interface issuing requests at `frequency` (the core clock).
    pub const fn new(frequency: u32) -> Self {
        Self {
            slot: None,
            frequency,
        }
    }

    /// Returns `true` when the one-slot queue is empty.
    pub const fn is_ready(&self) -> bool {
        self.slot.is_none()
    }

    /// The in-flight instruction and its address.
    pub fn current(&self) -> Option<(u64, Instruction)> {
        self.slot.map(|s| (s.pc, s.instruction))
    }

    /// Changes the frequency used for bank requests.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }

    /// Accepts a LOAD or STORE.
    ///
    /// # Returns
    ///
    /// `SimError::IoOccupied` while another memory instruction is in flight.
    pub fn enqueue(&mut self, pc: u64, instruction: Instruction) -> SimResult<()> {
        if !self.is_ready() {
            return Err(SimError::IoOccupied);
        }
        if instruction.class() != InstructionClass::Memory {
            return Err(SimError::MalformedInstruction {
                pc,
                reason: "non-memory instruction enqueued to the I/O interface".into(),
            });
        }
        trace!(pc, %instruction, "io enqueue");
        self.slot = Some(IoSlot {
            pc,
            instruction,
            loaded: None,
        });
        Ok(())
    }

    /// Advances the in-flight access by one core cycle.
    ///
    /// # Returns
    ///
    /// The retired instruction and its address once the access completed.
    pub fn update(
        &mut self,
        memory: &mut WorkingMemory,
        registers: &mut RegisterBank,
    ) -> SimResult<Option<(u64, Instruction)>> {
        let frequency = self.frequency;
        let Some(slot) = self.slot.as_mut() else {
            return Ok(None);
        };

        match slot.instruction {
            Instruction::Load { rd, address } => {
                if slot.loaded.is_none() {
                    if !memory.acquire(Requester::Io, frequency, address)? {
                        return Ok(None);
                    }
                    slot.loaded = Some(memory.read(address)?);
                    memory.release(address)?;
                }
                if !registers.acquire(Requester::Io, frequency, rd)? {
                    return Ok(None);
                }
                let value = slot.loaded.unwrap_or_default();
                registers.write(rd, u64::from(value))?;
                registers.release();
            }
            Instruction::Store { rs, address } => {
                if !memory.acquire(Requester::Io, frequency, address)? {
                    return Ok(None);
                }
                if !registers.acquire(Requester::Io, frequency, rs)? {
                    return Ok(None);
                }
                let value = registers.read(rs)?;
                registers.release();
                memory.write(address, u64::from(value))?;
                memory.release(address)?;
            }
            _ => {
                return Err(SimError::MalformedInstruction {
                    pc: slot.pc,
                    reason: "non-memory instruction held by the I/O interface".into(),
                });
            }
        }

        let done = (slot.pc, slot.instruction);
        self.slot = None;
        trace!(pc = done.0, instruction = %done.1, "io retire");
        Ok(Some(done))
    }
}
