//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the single ALU of the core. It executes register and
//! immediate arithmetic in one cycle and resolves branches in two phases:
//! 1. **Phase 1:** The comparison is computed and the ALU is marked branch-stalling.
//! 2. **Phase 2:** On the next update the resolution is handed to the decoder and the
//!    ALU becomes free.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Add, Sub, Mul (wrapped into the word range)
//! - [`logic`]:      And, Or, Gt, Lt
//!
//! With a delayed register file every operand read and the writeback go through the
//! file's request port, so one instruction may hold the ALU for several cycles.

/// Wrapped integer arithmetic (add, subtract, multiply).
pub mod arithmetic;

/// Bitwise logical and comparison operations.
pub mod logic;

use serde::Serialize;
use tracing::trace;

use self::arithmetic::ArithmeticOp;
use self::logic::LogicOp;
use crate::common::{Requester, SimError, SimResult};
use crate::core::arch::RegisterBank;
use crate::isa::{AluOp, Instruction, InstructionClass, Word};

/// Outcome of a resolved branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchResolution {
    /// Address of the branch.
    pub pc: u64,
    /// Address jumped to when taken.
    pub target: u64,
    /// Whether the comparison held.
    pub taken: bool,
}

/// Result of one ALU update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutcome {
    /// No instruction held.
    Idle,
    /// Instruction in progress (operand wait, writeback wait or branch phase 1).
    Busy,
    /// An arithmetic instruction wrote back.
    Retired {
        /// Address of the instruction.
        pc: u64,
        /// The instruction.
        instruction: Instruction,
    },
    /// Branch phase 2: the ALU is free again.
    BranchResolved(BranchResolution),
}

#[derive(Debug, Clone, Copy)]
struct AluSlot {
    pc: u64,
    instruction: Instruction,
    operands: [Option<Word>; 2],
    result: Option<u64>,
}

/// Arithmetic Logic Unit with a single instruction slot.
#[derive(Debug, Clone)]
pub struct Alu {
    slot: Option<AluSlot>,
    resolved: Option<BranchResolution>,
    word_modulus: u64,
    frequency: u32,
}

impl Alu {
    /// Creates an idle ALU.
    ///
    /// # Arguments
    ///
    /// * `word_modulus` - Results are reduced into `[0, word_modulus)`.
    /// * `frequency` - Core clock, used when requesting register file ports.
    pub fn new(word_modulus: u32, frequency: u32) -> Self {
        Self {
            slot: None,
            resolved: None,
            word_modulus: u64::from(word_modulus),
            frequency,
        }
    }

    /// Executes an ALU operation on two operands.
    ///
    /// # Examples
    ///
    /// ```
    /// use sisd_core::core::units::alu::Alu;
    /// use sisd_core::isa::AluOp;
    ///
    /// assert_eq!(Alu::execute(AluOp::Add, 15, 3, 16), 2);
    /// assert_eq!(Alu::execute(AluOp::Sub, 1, 2, 16), 15);
    /// assert_eq!(Alu::execute(AluOp::Lt, 1, 2, 16), 1);
    /// ```
    pub fn execute(op: AluOp, a: u64, b: u64, modulus: u64) -> u64 {
        match op {
            AluOp::Add => arithmetic::execute(ArithmeticOp::Add, a, b, modulus),
            AluOp::Sub => arithmetic::execute(ArithmeticOp::Sub, a, b, modulus),
            AluOp::Mul => arithmetic::execute(ArithmeticOp::Mul, a, b, modulus),
            AluOp::And => logic::execute(LogicOp::And, a, b),
            AluOp::Or => logic::execute(LogicOp::Or, a, b),
            AluOp::Gt => logic::execute(LogicOp::Gt, a, b),
            AluOp::Lt => logic::execute(LogicOp::Lt, a, b),
        }
    }

    /// Returns `true` while an instruction occupies the ALU.
    pub const fn is_busy(&self) -> bool {
        self.slot.is_some()
    }

    /// Returns `true` between the two phases of a branch resolution.
    pub const fn is_branch_stalling(&self) -> bool {
        self.resolved.is_some()
    }

    /// The held instruction and its address.
    pub fn current(&self) -> Option<(u64, Instruction)> {
        self.slot.map(|s| (s.pc, s.instruction))
    }

    /// Changes the frequency used for register file requests.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }

    /// Accepts an arithmetic instruction or a branch.
    ///
    /// # Returns
    ///
    /// `SimError::AluOccupied` if busy, `SimError::MalformedInstruction` for a
    /// memory instruction.
    pub fn dispatch(&mut self, pc: u64, instruction: Instruction) -> SimResult<()> {
        if self.is_busy() {
            return Err(SimError::AluOccupied);
        }
        if instruction.class() == InstructionClass::Memory {
            return Err(SimError::MalformedInstruction {
                pc,
                reason: "memory instruction dispatched to the ALU".into(),
            });
        }
        trace!(pc, %instruction, "alu dispatch");
        self.slot = Some(AluSlot {
            pc,
            instruction,
            operands: [None; 2],
            result: None,
        });
        Ok(())
    }

    /// Advances the held instruction by one ALU cycle.
    pub fn update(&mut self, registers: &mut RegisterBank) -> SimResult<AluOutcome> {
        if let Some(resolution) = self.resolved.take() {
            self.slot = None;
            return Ok(AluOutcome::BranchResolved(resolution));
        }
        let frequency = self.frequency;
        let modulus = self.word_modulus;
        let Some(slot) = self.slot.as_mut() else {
            return Ok(AluOutcome::Idle);
        };

        for (operand, source) in slot.operands.iter_mut().zip(slot.instruction.sources()) {
            let Some(reg) = source else { continue };
            if operand.is_some() {
                continue;
            }
            if !registers.acquire(Requester::Alu, frequency, reg)? {
                return Ok(AluOutcome::Busy);
            }
            *operand = Some(registers.read(reg)?);
            registers.release();
        }

        let a = u64::from(slot.operands[0].unwrap_or(0));
        let b = u64::from(slot.operands[1].unwrap_or(0));
        let (rd, value) = match slot.instruction {
            Instruction::Branch { op, target, .. } => {
                let taken = Self::execute(op, a, b, modulus) != 0;
                self.resolved = Some(BranchResolution {
                    pc: slot.pc,
                    target,
                    taken,
                });
                return Ok(AluOutcome::Busy);
            }
            Instruction::Alu { op, rd, .. } => {
                (rd, *slot.result.get_or_insert_with(|| Self::execute(op, a, b, modulus)))
            }
            Instruction::AluImm { op, rd, imm, .. } => {
                let imm = u64::from(imm);
                (rd, *slot.result.get_or_insert_with(|| Self::execute(op, a, imm, modulus)))
            }
            Instruction::Load { .. } | Instruction::Store { .. } => {
                return Err(SimError::MalformedInstruction {
                    pc: slot.pc,
                    reason: "memory instruction held by the ALU".into(),
                });
            }
        };

        if !registers.acquire(Requester::Alu, frequency, rd)? {
            return Ok(AluOutcome::Busy);
        }
        registers.write(rd, value)?;
        registers.release();
        let (pc, instruction) = (slot.pc, slot.instruction);
        self.slot = None;
        trace!(pc, %instruction, value, "alu writeback");
        Ok(AluOutcome::Retired { pc, instruction })
    }
}
