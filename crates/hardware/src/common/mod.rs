//! Common utilities and types used throughout the simulator.
//!
//! This module provides fundamental building blocks shared by every component.
//! It includes:
//! 1. **Clock Domains:** The cross-frequency readiness gate used by all timed components.
//! 2. **Constants:** Fixed properties of the instruction set and internal bounds.
//! 3. **Error Handling:** The fatal error taxonomy of the core and configuration errors.

/// Cross-frequency readiness gate and requester identities.
pub mod clock;

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types.
pub mod error;

pub use clock::{ClockGate, Requester, frequency_ratio};
pub use error::{ConfigError, GeneratorError, SimError, SimResult};
