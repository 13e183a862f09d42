//! Pipeline stage implementations.
//!
//! The core runs two front-end stages; execution happens inside the units they
//! dispatch to:
//! 1. **Fetch:** Owns the program counter and pulls instructions through the cache
//!    or the addressed instruction buffer into the IF/ID latch.
//! 2. **Decode:** Dispatches the latched instruction to the ALU or the I/O interface,
//!    stalling on structural, data and control hazards.

/// Instruction decode and dispatch stage.
pub mod decode;

/// Instruction fetch stage.
pub mod fetch;

pub use decode::{DecodeOutcome, Decoder, StallReason};
pub use fetch::{FetchOutcome, InstructionFetcher};
