//! Instruction pipeline implementation.
//!
//! This module contains the front end of the single-issue pipeline:
//! 1. **Hazards:** Data dependency checks between the decode slot and in-flight instructions.
//! 2. **Stages:** The fetch and decode stages.

/// Data hazard detection (RAW, WAW, WAR).
pub mod hazards;

/// Pipeline stage implementations (fetch, decode).
pub mod stages;

pub use hazards::Hazard;
pub use stages::{DecodeOutcome, Decoder, FetchOutcome, InstructionFetcher, StallReason};
