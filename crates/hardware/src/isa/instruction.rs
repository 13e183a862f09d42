//! Instruction value types.
//!
//! The instruction set is closed and small: register-register ALU operations,
//! ALU operations with an immediate, LOAD/STORE against working memory and a
//! compare-and-branch. Instructions are immutable values; they are built once by
//! the workload generator and copied through the pipeline.

use serde::Serialize;

use crate::common::{SimError, SimResult};

/// Unsigned machine word held by registers and memory cells.
pub type Word = u32;

/// Operation performed by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AluOp {
    /// Addition.
    Add,
    /// Subtraction (negative results wrap back into the word range).
    Sub,
    /// Multiplication.
    Mul,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Greater-than comparison, producing 1 or 0.
    Gt,
    /// Less-than comparison, producing 1 or 0.
    Lt,
}

impl AluOp {
    /// Operations the generator may use in register-register ALU instructions.
    pub const ARITHMETIC: [Self; 5] = [Self::Add, Self::Sub, Self::Mul, Self::And, Self::Or];

    /// Operations that have an immediate form (`ADDI`, `SUBI`, `MULI`).
    pub const IMMEDIATE: [Self; 3] = [Self::Add, Self::Sub, Self::Mul];

    /// Comparisons used exclusively by branch resolution.
    pub const COMPARISONS: [Self; 2] = [Self::Gt, Self::Lt];

    /// Returns `true` for `Gt` and `Lt`.
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Gt | Self::Lt)
    }

    /// Returns `true` if the operation has an immediate form.
    pub const fn has_immediate_form(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul)
    }

    /// Upper-case mnemonic of the register-register form.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Gt => "GT",
            Self::Lt => "LT",
        }
    }
}

/// Pipeline routing class of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstructionClass {
    /// Executed by the ALU and written back to the register file.
    Arithmetic,
    /// Executed by the I/O interface against working memory.
    Memory,
    /// Resolved by the ALU in two phases, then redirects fetch if taken.
    Branch,
}

/// A single immutable instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Instruction {
    /// `rd <- rs1 op rs2`.
    Alu {
        /// Operation.
        op: AluOp,
        /// Result register.
        rd: usize,
        /// First operand register.
        rs1: usize,
        /// Second operand register.
        rs2: usize,
    },
    /// `rd <- rs1 op imm`.
    AluImm {
        /// Operation (`Add`, `Sub` or `Mul`).
        op: AluOp,
        /// Result register.
        rd: usize,
        /// Operand register.
        rs1: usize,
        /// Immediate operand.
        imm: Word,
    },
    /// `rd <- memory[address]`.
    Load {
        /// Result register.
        rd: usize,
        /// Working memory address.
        address: usize,
    },
    /// `memory[address] <- rs`.
    Store {
        /// Register whose value is stored.
        rs: usize,
        /// Working memory address.
        address: usize,
    },
    /// Jump to `target` when `rs1 op rs2` holds.
    Branch {
        /// Comparison (`Gt` or `Lt`).
        op: AluOp,
        /// First compared register.
        rs1: usize,
        /// Second compared register.
        rs2: usize,
        /// Instruction address jumped to when the comparison holds.
        target: u64,
    },
}

impl Instruction {
    /// Pipeline routing class.
    pub const fn class(&self) -> InstructionClass {
        match self {
            Self::Alu { .. } | Self::AluImm { .. } => InstructionClass::Arithmetic,
            Self::Load { .. } | Self::Store { .. } => InstructionClass::Memory,
            Self::Branch { .. } => InstructionClass::Branch,
        }
    }

    /// The instruction's result register: written for ALU forms and LOAD, read
    /// and stored for STORE. Branches have none.
    pub const fn result_reg(&self) -> Option<usize> {
        match *self {
            Self::Alu { rd, .. } | Self::AluImm { rd, .. } | Self::Load { rd, .. } => Some(rd),
            Self::Store { rs, .. } => Some(rs),
            Self::Branch { .. } => None,
        }
    }

    /// Register written by this instruction, if any.
    pub const fn destination(&self) -> Option<usize> {
        match *self {
            Self::Alu { rd, .. } | Self::AluImm { rd, .. } | Self::Load { rd, .. } => Some(rd),
            Self::Store { .. } | Self::Branch { .. } => None,
        }
    }

    /// Registers read by this instruction.
    pub const fn sources(&self) -> [Option<usize>; 2] {
        match *self {
            Self::Alu { rs1, rs2, .. } | Self::Branch { rs1, rs2, .. } => [Some(rs1), Some(rs2)],
            Self::AluImm { rs1, .. } => [Some(rs1), None],
            Self::Store { rs, .. } => [Some(rs), None],
            Self::Load { .. } => [None, None],
        }
    }

    /// Returns `true` if this instruction reads register `reg`.
    pub fn reads(&self, reg: usize) -> bool {
        self.sources().contains(&Some(reg))
    }

    /// Working memory address of a LOAD or STORE.
    pub const fn memory_address(&self) -> Option<usize> {
        match *self {
            Self::Load { address, .. } | Self::Store { address, .. } => Some(address),
            _ => None,
        }
    }

    /// Target address of a branch.
    pub const fn branch_target(&self) -> Option<u64> {
        match *self {
            Self::Branch { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Checks that every operand lies inside the configured register and memory spaces.
    ///
    /// # Arguments
    ///
    /// * `pc` - Address of the instruction, used for error reporting.
    /// * `register_count` - Size of the core register file.
    /// * `memory_size` - Number of addressable working memory cells.
    ///
    /// # Returns
    ///
    /// `SimError::MalformedInstruction` describing the first bad operand.
    pub fn validate(&self, pc: u64, register_count: usize, memory_size: usize) -> SimResult<()> {
        let registers = self.sources().into_iter().flatten().chain(self.destination());
        for reg in registers {
            if reg >= register_count {
                return Err(SimError::MalformedInstruction {
                    pc,
                    reason: format!("register r{reg} outside register file of {register_count}"),
                });
            }
        }
        if let Some(address) = self.memory_address().filter(|&a| a >= memory_size) {
            return Err(SimError::MalformedInstruction {
                pc,
                reason: format!("address {address} outside working memory of {memory_size}"),
            });
        }
        match *self {
            Self::Branch { op, .. } if !op.is_comparison() => Err(SimError::MalformedInstruction {
                pc,
                reason: format!("branch with non-comparison operation {}", op.mnemonic()),
            }),
            Self::Alu { op, .. } | Self::AluImm { op, .. } if op.is_comparison() => {
                Err(SimError::MalformedInstruction {
                    pc,
                    reason: format!("comparison {} outside a branch", op.mnemonic()),
                })
            }
            Self::AluImm { op, .. } if !op.has_immediate_form() => {
                Err(SimError::MalformedInstruction {
                    pc,
                    reason: format!("{} has no immediate form", op.mnemonic()),
                })
            }
            _ => Ok(()),
        }
    }
}
