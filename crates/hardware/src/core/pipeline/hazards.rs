//! Data Hazard Detection.
//!
//! This module decides whether an instruction waiting in the decode slot may be
//! dispatched while other instructions are still in flight in the ALU or the I/O
//! interface. There is no forwarding: a dependent instruction simply waits.
//! 1. **RAW:** The candidate reads a register an in-flight instruction will write.
//! 2. **WAW:** The candidate writes a register an in-flight instruction will write.
//! 3. **WAR:** The candidate writes a register an in-flight instruction has yet to read
//!    (a STORE reads its source only when its bank becomes ready).
//!
//! The zero register never carries a dependency.

use std::fmt;

use serde::Serialize;

use crate::isa::Instruction;

/// A data dependency that blocks dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hazard {
    /// Read-after-write on the register.
    ReadAfterWrite(usize),
    /// Write-after-write on the register.
    WriteAfterWrite(usize),
    /// Write-after-read on the register.
    WriteAfterRead(usize),
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadAfterWrite(r) => write!(f, "RAW on r{r}"),
            Self::WriteAfterWrite(r) => write!(f, "WAW on r{r}"),
            Self::WriteAfterRead(r) => write!(f, "WAR on r{r}"),
        }
    }
}

/// Checks `candidate` against every in-flight instruction.
///
/// # Arguments
///
/// * `candidate` - Instruction waiting for dispatch.
/// * `in_flight` - Instructions held by the ALU and the I/O interface.
/// * `zero_register` - Register hard-wired to zero, ignored by the checks.
///
/// # Returns
///
/// The first hazard found, or `None` if the candidate may be dispatched.
pub fn detect(
    candidate: &Instruction,
    in_flight: &[Instruction],
    zero_register: Option<usize>,
) -> Option<Hazard> {
    let live = |r: &usize| Some(*r) != zero_register;
    let writes = candidate.destination().filter(live);

    for older in in_flight {
        if let Some(w) = older.destination().filter(live) {
            if candidate.reads(w) {
                return Some(Hazard::ReadAfterWrite(w));
            }
            if writes == Some(w) {
                return Some(Hazard::WriteAfterWrite(w));
            }
        }
        if let Some(w) = writes.filter(|&w| older.reads(w)) {
            return Some(Hazard::WriteAfterRead(w));
        }
    }
    None
}
