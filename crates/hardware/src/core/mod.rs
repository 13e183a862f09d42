//! Core processor implementation.
//!
//! This module contains the single-issue core: the storage types of the
//! architectural state, the fetch/decode pipeline, the execution units, the tick
//! driver that coordinates them and the snapshots observers read.

/// Architectural storage (register banks).
pub mod arch;

/// The tick driver and clock domain control.
pub mod cpu;

/// Fetch and decode stages plus hazard detection.
pub mod pipeline;

/// Observer snapshots and per-tick reports.
pub mod snapshot;

/// Execution units (ALU, I/O interface, instruction cache, instruction buffer).
pub mod units;

pub use self::cpu::{ClockDomain, SisdCore};
pub use self::snapshot::{CoreSnapshot, StagedInstruction, TickReport};
