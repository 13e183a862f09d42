//! Error definitions for the simulator core.
//!
//! This module defines the error taxonomy of the simulator. It provides:
//! 1. **Invariant Violations:** Bounds, readiness, buffer and occupancy errors raised by the core.
//! 2. **Configuration Exhaustion:** Workload generator failures caused by impossible register budgets.
//! 3. **Configuration Errors:** Parse, I/O and validation failures when loading a `Config`.
//!
//! None of the `SimError` variants is recoverable at runtime. They signal a defect in the
//! caller (reading a bank before it reported ready) or in the core itself, and a run that
//! observes one must stop.

use thiserror::Error;

/// Fatal simulation error raised by a core operation.
///
/// Every fallible operation on the core returns `Result<_, SimError>`. The
/// driver (`SisdCore::tick`) propagates the first error it sees and the
/// simulation must not be advanced afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// An address or index outside the addressable range of a component.
    #[error("{component}: address {address} out of bounds (size {size})")]
    OutOfBounds {
        /// Component that rejected the access.
        component: &'static str,
        /// Offending address.
        address: usize,
        /// Number of addressable cells.
        size: usize,
    },

    /// An access was made before the component reported readiness.
    #[error("{component}: access to address {address} before it reported ready")]
    NotReady {
        /// Component that rejected the access.
        component: &'static str,
        /// Address of the premature access.
        address: u64,
    },

    /// More instructions were written into the instruction buffer than it has room for.
    #[error("instruction buffer overflow: {requested} requested, {available} free")]
    BufferOverflow {
        /// Number of slots requested by the writer.
        requested: usize,
        /// Number of free slots at the time of the write.
        available: usize,
    },

    /// An instruction address below the instruction buffer window was requested.
    #[error("instruction address {address} already evicted (window floor {floor})")]
    Evicted {
        /// Requested instruction address.
        address: u64,
        /// Lowest address currently held by the window.
        floor: u64,
    },

    /// A memory instruction was enqueued while the I/O interface was occupied.
    #[error("I/O interface already holds an in-flight memory instruction")]
    IoOccupied,

    /// An instruction was dispatched into an occupied ALU.
    #[error("ALU already holds an instruction")]
    AluOccupied,

    /// An instruction whose operands fall outside the configured register or memory space.
    #[error("malformed instruction at pc {pc}: {reason}")]
    MalformedInstruction {
        /// Address of the instruction.
        pc: u64,
        /// Human-readable description of the defect.
        reason: String,
    },

    /// The workload generator could not satisfy its configuration.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Workload generator failure.
///
/// Raised when the register space is too small to allocate a working set that
/// avoids the registers held live by an enclosing loop or branch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// No window of consecutive registers avoided the excepted set.
    #[error(
        "cannot allocate {needed} consecutive registers avoiding {excepted} excepted \
         registers after {attempts} attempts"
    )]
    RegisterExhaustion {
        /// Size of the requested register window.
        needed: usize,
        /// Number of registers that had to be avoided.
        excepted: usize,
        /// Number of random starting points tried.
        attempts: usize,
    },

    /// An explicitly requested shape exceeds the configured sequence bound, so a
    /// loop built from it might not fit the instruction buffer window.
    #[error("sequence part of {length} instructions exceeds the bound of {limit}")]
    ShapeTooLarge {
        /// Requested number of loads, ALU operations or stores.
        length: usize,
        /// Configured `max_sequence_length`.
        limit: usize,
    },
}

/// Error raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for the `Config` schema.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration parsed but describes an impossible machine.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience alias used throughout the core.
pub type SimResult<T> = Result<T, SimError>;
