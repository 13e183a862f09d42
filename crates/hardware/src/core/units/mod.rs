//! Execution units and functional components.
//!
//! This module contains the units the pipeline stages drive: the ALU, the I/O
//! interface to working memory, the instruction cache and the addressed
//! instruction buffer that prefetches from the workload generator.

/// Arithmetic Logic Unit, including two-phase branch resolution.
pub mod alu;

/// Single-instruction-line FIFO instruction cache.
pub mod cache;

/// One-slot LOAD/STORE interface to working memory.
pub mod lsu;

/// Addressed instruction buffer with loop replay.
pub mod prefetch;

pub use alu::{Alu, AluOutcome, BranchResolution};
pub use cache::{CacheLine, InstructionCache};
pub use lsu::IoInterface;
pub use prefetch::AddressedInstructionBuffer;
