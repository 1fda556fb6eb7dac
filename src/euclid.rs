//! Extended Euclidean algorithm over arbitrary precision integers.
//!
//! Key generation relies on it twice: to test that a candidate key is coprime
//! with every key already chosen, and to find the modular inverses used by
//! the CRT reconstruction of packed bits.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Result of the extended Euclidean algorithm.
///
/// ## Fields
///
/// * `gcd` - The greatest common divisor of both inputs.
/// * `s` - Coefficient of `larger`.
/// * `t` - Coefficient of `smaller`.
///
/// The identity `s * larger + t * smaller == gcd` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bezout {
    pub gcd: BigUint,
    pub s: BigInt,
    pub t: BigInt,
}

#[must_use]
/// Runs the extended Euclidean algorithm.
///
/// ## Arguments
///
/// * `smaller` - The value whose coefficient is `t`.
/// * `larger` - The value whose coefficient is `s`.
///
/// Arguments given in the wrong order are swapped internally,
/// the coefficients still refer to the arguments as passed.
///
/// ## Returns
///
/// The gcd and Bézout coefficients. When `t` would be negative it is moved into
/// `[0, larger)` by adding `larger` (and `s` is corrected by subtracting `smaller`),
/// so that `t` is directly usable as the inverse of `smaller` modulo `larger`.
///
/// ## Examples
///
/// ```
/// use num_bigint::{BigInt, BigUint};
/// use supercomp::euclid::extended_euclid;
///
/// let r = extended_euclid(&BigUint::from(3u32), &BigUint::from(7u32));
/// assert_eq!(r.gcd, BigUint::from(1u32));
/// assert_eq!(r.t, BigInt::from(5));
/// ```
pub fn extended_euclid(smaller: &BigUint, larger: &BigUint) -> Bezout {
    if smaller.is_zero() {
        return Bezout {
            gcd: larger.clone(),
            s: BigInt::one(),
            t: BigInt::zero(),
        };
    }
    if larger.is_zero() {
        return Bezout {
            gcd: smaller.clone(),
            s: BigInt::zero(),
            t: BigInt::one(),
        };
    }

    let swapped = larger < smaller;
    let (a, b) = if swapped {
        (smaller, larger)
    } else {
        (larger, smaller)
    };

    let mut old_r = BigInt::from_biguint(Sign::Plus, a.clone());
    let mut r = BigInt::from_biguint(Sign::Plus, b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let (q, rem) = old_r.div_rem(&r);
        old_r = core::mem::replace(&mut r, rem);
        let next_s = &old_s - &q * &s;
        old_s = core::mem::replace(&mut s, next_s);
        let next_t = &old_t - &q * &t;
        old_t = core::mem::replace(&mut t, next_t);
    }

    // old_s multiplies `a`, old_t multiplies `b`
    let (mut s, mut t) = if swapped {
        (old_t, old_s)
    } else {
        (old_s, old_t)
    };

    if t.is_negative() {
        t += BigInt::from_biguint(Sign::Plus, larger.clone());
        s -= BigInt::from_biguint(Sign::Plus, smaller.clone());
    }

    Bezout {
        gcd: old_r.magnitude().clone(),
        s,
        t,
    }
}

#[must_use]
/// Returns `true` if `a` and `b` share no factor other than 1.
pub fn is_coprime(a: &BigUint, b: &BigUint) -> bool {
    extended_euclid(a, b).gcd.is_one()
}

#[must_use]
/// Computes the inverse of `value` modulo `modulus`.
///
/// ## Returns
///
/// `None` if `value` is not invertible modulo `modulus`.
///
/// ## Examples
///
/// ```
/// use num_bigint::BigUint;
/// use supercomp::euclid::inverse_mod;
///
/// let inv = inverse_mod(&BigUint::from(10u32), &BigUint::from(7u32)).unwrap();
/// assert_eq!(inv, BigUint::from(5u32));
/// ```
pub fn inverse_mod(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus.is_zero() {
        return None;
    }
    let bezout = extended_euclid(value, modulus);
    if !bezout.gcd.is_one() {
        return None;
    }
    let modulus = BigInt::from_biguint(Sign::Plus, modulus.clone());
    bezout.t.mod_floor(&modulus).to_biguint()
}
