//! Architectural state of the core.
//!
//! The SISD core's only architectural storage is its register file; working
//! memory banks reuse the same [`RegisterBank`] type.

/// Addressable word storage with optional access latency and a zero slot.
pub mod register_bank;

pub use register_bank::{DataCellArray, RegisterBank};
