//! Cycle-accurate SISD processor simulator library.
//!
//! This crate implements a single-issue core whose components run on independent clocks:
//! 1. **Core:** Fetch and decode stages, a two-phase branch ALU and a one-slot I/O interface.
//! 2. **Instruction Supply:** A synthetic code generator feeding an addressed instruction
//!    buffer with loop replay, fronted by a small FIFO instruction cache.
//! 3. **Storage:** A timed register file and banked working memory.
//! 4. **Timing:** Cross-frequency readiness gates shared by every timed component.
//! 5. **Simulation:** Configuration, statistics and observer snapshots.
//!
//! ```
//! use sisd_core::{Config, SisdCore};
//!
//! let mut core = SisdCore::new(Config::default()).unwrap();
//! core.run(100).unwrap();
//! assert_eq!(core.cycle(), 100);
//! ```

/// Common types and constants (errors, clock gates, fixed limits).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures, validation).
pub mod config;
/// SISD core (pipeline, units, arch storage, tick driver, snapshots).
pub mod core;
/// Instruction set (instruction values and assembly rendering).
pub mod isa;
/// Workload synthesis (code generator and its random source).
pub mod sim;
/// Memory system outside the core (banked working memory).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load JSON.
pub use crate::config::Config;
/// The simulated core; construct with `SisdCore::new`.
pub use crate::core::{ClockDomain, CoreSnapshot, SisdCore, TickReport};
/// Fatal simulation error and configuration error.
pub use crate::common::{ConfigError, SimError, SimResult};
