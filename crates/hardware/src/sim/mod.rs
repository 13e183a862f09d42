//! Workload synthesis.
//!
//! Provides the deterministic random source and the code generator that feeds
//! the addressed instruction buffer with an unbounded instruction stream.

/// Synthetic instruction stream generator.
pub mod generator;

/// Seeded xorshift random source.
pub mod rng;

pub use generator::{CodeGenerator, LoopShape, SequenceShape};
