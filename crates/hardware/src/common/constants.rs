//! System-wide constants for the simulator core.
//!
//! These values are not configurable at runtime; they bound internal search
//! loops and describe fixed properties of the instruction set.

/// Default modulus applied to every register and memory word (2^16).
pub const DEFAULT_WORD_MODULUS: u32 = 1 << 16;

/// Number of random starting points tried before register allocation gives up.
pub const REGISTER_ALLOCATION_RETRIES: usize = 64;

/// Minimum number of loads emitted by a plain sequence.
pub const MIN_SEQUENCE_LOADS: usize = 2;

/// Number of extra instructions a for-loop adds around its body
/// (induction init, increment and the closing branch).
pub const LOOP_OVERHEAD: usize = 3;

/// Instructions a doubled loop adds inside the outer loop around the inner body
/// (inner init, inner increment, inner branch, outer increment, outer branch).
pub const DOUBLED_LOOP_SPAN_OVERHEAD: usize = 5;

/// Free slots the instruction buffer must keep beyond the largest loop span,
/// so the fall-through instruction after a loop branch can still be admitted.
pub const LOOP_WINDOW_SLACK: usize = 2;

/// Clock ratio a supplier must keep below the core: `RATIO * supplier <= core`.
pub const SUPPLIER_CLOCK_RATIO: u32 = 3;
