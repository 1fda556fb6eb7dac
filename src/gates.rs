//! Logic gates on superpositional bits.
//!
//! A superpositional bit is a single integer whose residue modulo each key,
//! taken modulo 2, is the value of the bit under that key's input assignment.
//! XOR is integer addition and AND is integer multiplication: both commute with
//! reduction modulo any key, so the gates act on every assignment at once.
//!
//! Results stay exact under a key as long as the plain integer evaluation of the
//! circuit stays below that key. Nothing here detects when it does not, except the
//! optional watch on a single key (see `KeySet::watch_key`).

use crate::KeySet;

use num_bigint::BigUint;
use num_traits::One;
use tracing::warn;

/// Returns the residue of the gate under the watched key if it wrapped around that key.
fn watched_overflow(
    key_set: &KeySet,
    a: &BigUint,
    b: &BigUint,
    combine: fn(BigUint, BigUint) -> BigUint,
) -> Option<BigUint> {
    let key = &key_set.keys()[key_set.watched_key()?];
    let residue = combine(a % key, b % key);
    (&residue >= key).then_some(residue)
}

fn gate(
    name: &'static str,
    a: &BigUint,
    b: &BigUint,
    key_set: &KeySet,
    combine: fn(BigUint, BigUint) -> BigUint,
) -> BigUint {
    if let Some(residue) = watched_overflow(key_set, a, b, combine) {
        warn!(
            gate = name,
            key_index = key_set.watched_key(),
            %residue,
            "residue overflow on watched key"
        );
    }
    key_set.reduce_value(combine(a.clone(), b.clone()))
}

#[must_use]
/// XOR gate: `a + b`.
///
/// ## Examples
///
/// ```
/// use num_bigint::BigUint;
/// use supercomp::{gates, KeySet};
///
/// let key_set = KeySet::calculate(2, &BigUint::from(11u32), |_| {});
/// let c = gates::xor(&key_set.bits()[0], &key_set.bits()[1], &key_set);
/// for i in 0..4 {
///     assert_eq!(key_set.decode_bit(&c, i), (i & 1 == 1) ^ (i & 2 == 2));
/// }
/// ```
pub fn xor(a: &BigUint, b: &BigUint, key_set: &KeySet) -> BigUint {
    gate("xor", a, b, key_set, |a, b| a + b)
}

#[must_use]
/// AND gate: `a * b`.
pub fn and(a: &BigUint, b: &BigUint, key_set: &KeySet) -> BigUint {
    gate("and", a, b, key_set, |a, b| a * b)
}

#[must_use]
/// NOT gate: `a XOR 1`.
pub fn not(a: &BigUint, key_set: &KeySet) -> BigUint {
    xor(a, &BigUint::one(), key_set)
}

#[must_use]
/// OR gate: `(a XOR b) XOR (a AND b)`.
pub fn or(a: &BigUint, b: &BigUint, key_set: &KeySet) -> BigUint {
    xor(&xor(a, b, key_set), &and(a, b, key_set), key_set)
}

#[must_use]
/// One bit of a ripple carry adder.
///
/// ## Returns
///
/// `(sum, carry_out)` where `sum = a ^ b ^ carry` and `carry_out = (a & b) ^ (carry & (a ^ b))`.
pub fn full_adder(
    a: &BigUint,
    b: &BigUint,
    carry: &BigUint,
    key_set: &KeySet,
) -> (BigUint, BigUint) {
    let a_xor_b = xor(a, b, key_set);
    let sum = xor(&a_xor_b, carry, key_set);
    let carry = xor(
        &and(a, b, key_set),
        &and(carry, &a_xor_b, key_set),
        key_set,
    );
    (sum, carry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(i: usize, b: usize) -> bool {
        (i >> b) & 1 == 1
    }

    #[test]
    fn test_gates() {
        let key_set = KeySet::calculate(2, &BigUint::from(11u32), |_| {});
        let (a, b) = (&key_set.bits()[0], &key_set.bits()[1]);

        let xor = xor(a, b, &key_set);
        let and = and(a, b, &key_set);
        let or = or(a, b, &key_set);
        let not = not(a, &key_set);
        for i in 0..key_set.key_count() {
            assert_eq!(key_set.decode_bit(&xor, i), input(i, 0) ^ input(i, 1));
            assert_eq!(key_set.decode_bit(&and, i), input(i, 0) & input(i, 1));
            assert_eq!(key_set.decode_bit(&or, i), input(i, 0) | input(i, 1));
            assert_eq!(key_set.decode_bit(&not, i), !input(i, 0));
        }
    }

    #[test]
    fn test_full_adder() {
        let key_set = KeySet::calculate(3, &BigUint::from(11u32), |_| {});
        let bits = key_set.bits();
        let (sum, carry) = full_adder(&bits[0], &bits[1], &bits[2], &key_set);
        for i in 0..key_set.key_count() {
            let total = usize::from(input(i, 0)) + usize::from(input(i, 1)) + usize::from(input(i, 2));
            assert_eq!(key_set.decode_bit(&sum, i), total & 1 == 1);
            assert_eq!(key_set.decode_bit(&carry, i), total >= 2);
        }
    }

    #[test]
    fn test_reduction_keeps_residues() {
        let mut key_set = KeySet::calculate(2, &BigUint::from(11u32), |_| {});
        let (a, b) = (key_set.bits()[0].clone(), key_set.bits()[1].clone());
        let reduced = and(&a, &b, &key_set);
        assert!(&reduced < key_set.lcm());

        key_set.set_reduce(false);
        let raw = and(&a, &b, &key_set);
        assert_eq!(raw, &a * &b);
        for i in 0..key_set.key_count() {
            assert_eq!(key_set.decode_bit(&raw, i), key_set.decode_bit(&reduced, i));
        }
    }

    #[test]
    fn test_watched_overflow() {
        let mut key_set = KeySet::calculate(1, &BigUint::from(3u32), |_| {});
        let (one, two) = (BigUint::from(1u32), BigUint::from(2u32));
        assert_eq!(watched_overflow(&key_set, &two, &two, |a, b| a + b), None);

        key_set.watch_key(Some(0));
        assert_eq!(watched_overflow(&key_set, &one, &one, |a, b| a + b), None);
        assert_eq!(
            watched_overflow(&key_set, &two, &two, |a, b| a * b),
            Some(BigUint::from(4u32))
        );
        // residues are taken first: 5 is 2 under key 3
        assert_eq!(
            watched_overflow(&key_set, &BigUint::from(5u32), &one, |a, b| a + b),
            Some(BigUint::from(3u32))
        );
    }
}
