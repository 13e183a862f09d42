//! Instruction Set Architecture (ISA) Definitions.
//!
//! The instruction set is fixed: ALU and ALU-immediate arithmetic, LOAD/STORE
//! against working memory and a two-register compare-and-branch. All arithmetic
//! is bounded unsigned integer with wraparound.

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Instruction value types, ALU operations and routing classes.
pub mod instruction;

pub use instruction::{AluOp, Instruction, InstructionClass, Word};
