//! This module defines the traits used to describe operations on superpositional integers.
//!
//! There are 2 traits:
//!
//! - `HomomorphicOperation1` for unary operations
//! - `HomomorphicOperation2` for binary operations
//!
//! Besides the circuit itself (`apply`), an operation carries its plaintext
//! counterpart (`reference`). This is what allows `crate::verify` to check a circuit
//! exhaustively: every key index is decoded and compared against the plaintext result.
//!
//! Plaintext results are compared modulo `2^width`, so `reference` may use wrapping
//! arithmetic on `i64` freely.

use crate::SuperInt;

/// A unary operation on superpositional integers.
///
/// ## Example
///
/// ```rust
/// use supercomp::prelude::*;
///
/// struct Double;
///
/// impl HomomorphicOperation1 for Double {
///     const SYMBOL: &'static str = "2*";
///
///     fn reference(a: i64) -> i64 {
///         a.wrapping_mul(2)
///     }
///
///     fn apply<'k>(a: &SuperInt<'k>) -> SuperInt<'k> {
///         a.shift_left(1)
///     }
/// }
///
/// let key_set = KeySet::empty();
/// let a = SuperInt::from_i64(3, 4, &key_set);
/// assert_eq!(Double::apply(&a).width(), 4);
/// ```
pub trait HomomorphicOperation1 {
    /// Short name used in reports.
    const SYMBOL: &'static str;

    /// The plaintext operation.
    fn reference(a: i64) -> i64;

    /// The circuit.
    fn apply<'k>(a: &SuperInt<'k>) -> SuperInt<'k>;
}

/// A binary operation between two superpositional integers of the same width.
///
/// ## Example
///
/// ```rust
/// use supercomp::prelude::*;
///
/// struct AddTwice;
///
/// impl HomomorphicOperation2 for AddTwice {
///     const SYMBOL: &'static str = "+2*";
///
///     fn reference(a: i64, b: i64) -> i64 {
///         a.wrapping_add(b.wrapping_mul(2))
///     }
///
///     fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
///         a.wrapping_add(&b.shift_left(1))
///     }
/// }
/// ```
pub trait HomomorphicOperation2 {
    /// Short name used in reports.
    const SYMBOL: &'static str;

    /// Whether the result is defined when the right operand is zero.
    /// Key indices where it is not are skipped by verification.
    const ALLOW_ZERO_RHS: bool = true;

    /// The plaintext operation.
    fn reference(a: i64, b: i64) -> i64;

    /// The circuit.
    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k>;
}
