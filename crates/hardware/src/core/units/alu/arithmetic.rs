//! ALU arithmetic operations.
//!
//! Addition, subtraction and multiplication over unsigned words. Every result
//! is reduced into `[0, modulus)`; a negative difference wraps back from the top.

/// Operations that wrap into the word range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
}

/// Executes an arithmetic operation modulo `modulus`.
///
/// # Arguments
///
/// * `op` - The operation.
/// * `a` - First operand.
/// * `b` - Second operand (register value or immediate).
/// * `modulus` - Word modulus; results lie in `[0, modulus)`.
///
/// # Returns
///
/// The wrapped result.
pub fn execute(op: ArithmeticOp, a: u64, b: u64, modulus: u64) -> u64 {
    let m = modulus.max(1);
    let (a, b) = (a % m, b % m);
    match op {
        ArithmeticOp::Add => (a + b) % m,
        ArithmeticOp::Sub => (a as i128 - b as i128).rem_euclid(m as i128) as u64,
        ArithmeticOp::Mul => ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64,
    }
}
