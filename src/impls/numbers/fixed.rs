use super::{HomomorphicFixedDivision, HomomorphicFixedMultiplication};
use crate::operations::HomomorphicOperation2;
use crate::{SuperFixed, SuperInt};

use core::ops::{Add, Div, Mul, Neg, Sub};
use num_bigint::BigUint;
use tracing::trace_span;

impl<'k> SuperFixed<'k> {
    fn assert_same_format(&self, other: &Self) {
        assert_eq!(
            self.fraction_bits(),
            other.fraction_bits(),
            "Operands must have the same number of fraction bits"
        );
    }

    fn with_int(&self, int: SuperInt<'k>) -> Self {
        Self::from_int(int, self.fraction_bits())
    }

    #[must_use]
    pub fn wrapping_add(&self, other: &Self) -> Self {
        self.assert_same_format(other);
        self.with_int(self.as_int().wrapping_add(other.as_int()))
    }

    #[must_use]
    pub fn wrapping_sub(&self, other: &Self) -> Self {
        self.assert_same_format(other);
        self.with_int(self.as_int().wrapping_sub(other.as_int()))
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        self.with_int(self.as_int().negate())
    }

    #[must_use]
    pub fn negate_conditional(&self, condition: &BigUint) -> Self {
        self.with_int(self.as_int().negate_conditional(condition))
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        self.with_int(self.as_int().abs())
    }

    #[must_use]
    /// Fixed point multiplication, rounding toward negative infinity.
    ///
    /// Both operands are sign extended to `2 * width - 1` bits so that the full
    /// product is available before it is shifted back by `fraction_bits`.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands do not share their format or key set.
    pub fn wrapping_mul(&self, other: &Self) -> Self {
        self.assert_same_format(other);
        let _span = trace_span!("fixed_multiply", width = self.width()).entered();
        let width = self.width();
        let wide = 2 * width - 1;

        let product = self
            .as_int()
            .sign_extend(wide)
            .wrapping_mul(&other.as_int().sign_extend(wide));
        self.with_int(
            product
                .signed_shift_right(self.fraction_bits())
                .truncate(width),
        )
    }

    #[must_use]
    /// Fixed point division, truncating toward zero.
    ///
    /// The dividend is sign extended to `width + fraction_bits` bits and scaled up
    /// by `2^fraction_bits` before the integer division, so no bit is lost.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands do not share their format or key set.
    pub fn wrapping_div(&self, other: &Self) -> Self {
        self.assert_same_format(other);
        let _span = trace_span!("fixed_divide", width = self.width()).entered();
        let width = self.width();
        let wide = width + self.fraction_bits();

        let dividend = self
            .as_int()
            .sign_extend(wide)
            .shift_left(self.fraction_bits());
        let divisor = other.as_int().sign_extend(wide);
        let (quotient, _) = dividend.div_rem(&divisor);
        self.with_int(quotient.truncate(width))
    }
}

impl<'k> Add for &SuperFixed<'k> {
    type Output = SuperFixed<'k>;

    fn add(self, rhs: Self) -> SuperFixed<'k> {
        self.wrapping_add(rhs)
    }
}

impl<'k> Sub for &SuperFixed<'k> {
    type Output = SuperFixed<'k>;

    fn sub(self, rhs: Self) -> SuperFixed<'k> {
        self.wrapping_sub(rhs)
    }
}

impl<'k> Mul for &SuperFixed<'k> {
    type Output = SuperFixed<'k>;

    fn mul(self, rhs: Self) -> SuperFixed<'k> {
        self.wrapping_mul(rhs)
    }
}

impl<'k> Div for &SuperFixed<'k> {
    type Output = SuperFixed<'k>;

    fn div(self, rhs: Self) -> SuperFixed<'k> {
        self.wrapping_div(rhs)
    }
}

impl<'k> Neg for &SuperFixed<'k> {
    type Output = SuperFixed<'k>;

    fn neg(self) -> SuperFixed<'k> {
        self.negate()
    }
}

// The plaintext references work on the scaled integers
impl<const F: usize> HomomorphicOperation2 for HomomorphicFixedMultiplication<F> {
    const SYMBOL: &'static str = "*";

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_mul(b) >> F
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        let a = SuperFixed::from_int(a.clone(), F);
        let b = SuperFixed::from_int(b.clone(), F);
        a.wrapping_mul(&b).into_int()
    }
}

impl<const F: usize> HomomorphicOperation2 for HomomorphicFixedDivision<F> {
    const SYMBOL: &'static str = "/";
    const ALLOW_ZERO_RHS: bool = false;

    fn reference(a: i64, b: i64) -> i64 {
        (a << F).wrapping_div(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        let a = SuperFixed::from_int(a.clone(), F);
        let b = SuperFixed::from_int(b.clone(), F);
        a.wrapping_div(&b).into_int()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superint::{binary_from_int, int_from_binary};
    use crate::KeySet;

    fn check<Op: HomomorphicOperation2>(integer_bits: usize, fraction_bits: usize) {
        let width = integer_bits + fraction_bits;
        let empty = KeySet::empty();
        let ones = SuperInt::all_ones(width, &empty);
        let min_key = Op::apply(&ones, &ones)
            .into_bits()
            .into_iter()
            .max()
            .unwrap_or_default();
        let key_set = KeySet::calculate(2 * width, &min_key, |_| {});

        let a = SuperFixed::from_key_set(&key_set, 0, integer_bits, fraction_bits).unwrap();
        let b = SuperFixed::from_key_set(&key_set, width, integer_bits, fraction_bits).unwrap();
        let c = Op::apply(a.as_int(), b.as_int());

        for (i, key) in key_set.keys().iter().enumerate() {
            let (x, y) = (a.decode_raw(key), b.decode_raw(key));
            if y == 0 && !Op::ALLOW_ZERO_RHS {
                continue;
            }
            let expected = int_from_binary(binary_from_int(Op::reference(x, y), width), width);
            assert_eq!(c.decode_at(i), expected, "{x} {} {y}", Op::SYMBOL);
        }
    }

    #[test]
    fn test_fixed_multiplication() {
        check::<HomomorphicFixedMultiplication<1>>(1, 1);
        check::<HomomorphicFixedMultiplication<1>>(2, 1);
        check::<HomomorphicFixedMultiplication<2>>(2, 2);
    }

    #[test]
    fn test_fixed_division() {
        check::<HomomorphicFixedDivision<1>>(1, 1);
        check::<HomomorphicFixedDivision<1>>(2, 1);
    }

    #[test]
    #[ignore = "Long test"]
    fn test_fixed_division_extensive() {
        check::<HomomorphicFixedDivision<2>>(1, 2);
    }

    #[test]
    fn test_fixed_add_sub() {
        let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
        let a = SuperFixed::from_key_set(&key_set, 0, 1, 1).unwrap();
        let b = SuperFixed::from_key_set(&key_set, 2, 1, 1).unwrap();
        let sum = (&a + &b).into_int();
        let wide_a = a.as_int().sign_extend(3);
        let wide_b = b.as_int().sign_extend(3);
        let wide_sum = wide_a.wrapping_add(&wide_b);
        let wide_diff = wide_a.wrapping_sub(&wide_b);
        for i in 0..key_set.key_count() {
            let (x, y) = (a.decode_f64_at(i), b.decode_f64_at(i));
            assert!((wide_sum.decode_at(i) as f64 / 2.0 - (x + y)).abs() < f64::EPSILON);
            assert!((wide_diff.decode_at(i) as f64 / 2.0 - (x - y)).abs() < f64::EPSILON);
            assert_eq!(sum.decode_binary_at(i), wide_sum.truncate(2).decode_binary_at(i));
        }
    }

    #[test]
    fn test_fixed_constants() {
        // plaintext circuits still accumulate noise
        let key_set = KeySet::calculate(1, &BigUint::from(1_000_000u32), |_| {});
        let a = SuperFixed::from_f64(1.5, 3, 2, &key_set);
        let b = SuperFixed::from_f64(-0.75, 3, 2, &key_set);
        for i in 0..key_set.key_count() {
            assert!(((&a + &b).decode_f64_at(i) - 0.75).abs() < f64::EPSILON);
            assert!(((&a - &b).decode_f64_at(i) - 2.25).abs() < f64::EPSILON);
            assert!(((-&b).decode_f64_at(i) - 0.75).abs() < f64::EPSILON);
            assert!((b.abs().decode_f64_at(i) - 0.75).abs() < f64::EPSILON);
        }
    }

    #[test]
    #[should_panic = "Operands must have the same number of fraction bits"]
    fn test_format_mismatch() {
        let key_set = KeySet::empty();
        let a = SuperFixed::zero(2, 1, &key_set);
        let b = SuperFixed::zero(1, 2, &key_set);
        let _ = a.wrapping_add(&b);
    }
}
