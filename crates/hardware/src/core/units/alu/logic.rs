//! ALU logical and comparison operations.
//!
//! Bitwise AND/OR and the `Gt`/`Lt` comparisons. Comparisons return 1 or 0 and
//! are only issued by branch resolution.

/// Bitwise and comparison operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// `a > b` as 1 or 0.
    Gt,
    /// `a < b` as 1 or 0.
    Lt,
}

/// Executes a logical or comparison operation.
pub fn execute(op: LogicOp, a: u64, b: u64) -> u64 {
    match op {
        LogicOp::And => a & b,
        LogicOp::Or => a | b,
        LogicOp::Gt => u64::from(a > b),
        LogicOp::Lt => u64::from(a < b),
    }
}
