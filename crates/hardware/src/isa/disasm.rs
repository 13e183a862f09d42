//! Instruction disassembler.
//!
//! Renders instructions as assembler-like text for tracing, logging and test
//! diagnostics, e.g. `ADD r3, r1, r2`, `SUBI r2, r2, 1`, `LOAD r4, [12]` or
//! `BRANCH LT r1, r5 -> 40`.

use std::fmt;

use crate::isa::instruction::Instruction;

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Alu { op, rd, rs1, rs2 } => {
                write!(f, "{} r{rd}, r{rs1}, r{rs2}", op.mnemonic())
            }
            Self::AluImm { op, rd, rs1, imm } => {
                write!(f, "{}I r{rd}, r{rs1}, {imm}", op.mnemonic())
            }
            Self::Load { rd, address } => write!(f, "LOAD r{rd}, [{address}]"),
            Self::Store { rs, address } => write!(f, "STORE r{rs}, [{address}]"),
            Self::Branch {
                op,
                rs1,
                rs2,
                target,
            } => write!(f, "BRANCH {} r{rs1}, r{rs2} -> {target}", op.mnemonic()),
        }
    }
}
