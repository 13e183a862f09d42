//! Instruction Fetch (IF) Stage.
//!
//! This module implements the first stage of the pipeline. The
//! `InstructionFetcher` owns the program counter and a one-entry latch towards
//! decode. Each cycle it performs the following:
//! 1. **Latch Check:** A full latch stalls fetch.
//! 2. **Lookup:** The instruction at the pc is requested from the instruction cache,
//!    or straight from the addressed instruction buffer when the cache is disabled.
//! 3. **Advance:** Once the instruction arrives it is latched and the pc incremented.
//!
//! The pc only ever moves backwards through `redirect`, called by the decoder
//! when a branch resolves taken.

use tracing::{debug, trace};

use crate::common::{Requester, SimResult};
use crate::core::units::{AddressedInstructionBuffer, InstructionCache};
use crate::isa::Instruction;

/// Result of one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// An instruction was latched.
    Fetched {
        /// Its address.
        pc: u64,
        /// The instruction.
        instruction: Instruction,
    },
    /// The latch is still full.
    Stalled,
    /// The cache or buffer has not delivered yet.
    Waiting,
}

/// Program counter and IF/ID latch.
#[derive(Debug, Clone)]
pub struct InstructionFetcher {
    pc: u64,
    latch: Option<(u64, Instruction)>,
    frequency: u32,
}

impl InstructionFetcher {
    /// Creates a fetcher starting at address 0.
    ///
    /// `frequency` is the core clock, used for cross-domain requests.
    pub const fn new(frequency: u32) -> Self {
        Self {
            pc: 0,
            latch: None,
            frequency,
        }
    }

    /// Address of the next instruction to fetch.
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Latched instruction awaiting decode.
    pub const fn latch(&self) -> Option<(u64, Instruction)> {
        self.latch
    }

    /// Hands the latched instruction to decode.
    pub const fn take(&mut self) -> Option<(u64, Instruction)> {
        self.latch.take()
    }

    /// Changes the frequency used for cross-domain requests.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }

    /// Moves the pc to `target` and drops the latched fall-through instruction.
    pub fn redirect(&mut self, target: u64) {
        debug!(from = self.pc, to = target, "fetch redirect");
        self.latch = None;
        self.pc = target;
    }

    /// Executes one fetch cycle.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Addressed instruction buffer.
    /// * `cache` - Instruction cache, `None` when disabled.
    pub fn fetch(
        &mut self,
        buffer: &mut AddressedInstructionBuffer,
        cache: Option<&mut InstructionCache>,
    ) -> SimResult<FetchOutcome> {
        if self.latch.is_some() {
            return Ok(FetchOutcome::Stalled);
        }
        let pc = self.pc;
        let fetched = match cache {
            Some(cache) => {
                cache.ask_for_instruction_at(pc, buffer, self.frequency)?;
                if cache.is_ready(pc) {
                    Some(cache.fetch_instruction_at(pc)?)
                } else {
                    None
                }
            }
            None => {
                let _ = buffer.ask_for_instructions_at(Requester::Fetcher, self.frequency, pc);
                if buffer.is_ready(pc) {
                    buffer.fetch_instruction_at(pc)?
                } else {
                    None
                }
            }
        };

        let Some(instruction) = fetched else {
            return Ok(FetchOutcome::Waiting);
        };
        trace!(pc, %instruction, "fetch");
        self.latch = Some((pc, instruction));
        self.pc += 1;
        Ok(FetchOutcome::Fetched { pc, instruction })
    }
}
