//! System-on-Chip (SoC) Components.
//!
//! Everything outside the core proper that the core talks to through timed
//! ports. Only the banked working memory lives here.

/// Banked data memory for LOAD/STORE.
pub mod memory;

pub use memory::WorkingMemory;
