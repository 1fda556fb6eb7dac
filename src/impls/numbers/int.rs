use super::{
    HomomorphicAbsolute, HomomorphicAddition, HomomorphicDivision, HomomorphicMultiplication,
    HomomorphicNegation, HomomorphicRemainder, HomomorphicSubtraction,
};
use crate::operations::{HomomorphicOperation1, HomomorphicOperation2};
use crate::{gates, KeySet, SuperInt};

use core::ops::{Add, Div, Mul, Neg, Rem, Sub};
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::trace_span;

fn ripple_add(a: &[BigUint], b: &[BigUint], key_set: &KeySet) -> (Vec<BigUint>, BigUint) {
    let mut result = Vec::with_capacity(a.len() + 1);
    // The carry into bit 0 is a true zero under every key
    let mut carry = BigUint::zero();

    for (p1, p2) in a.iter().zip(b) {
        let (sum, carry_out) = gates::full_adder(p1, p2, &carry, key_set);
        result.push(sum);
        carry = carry_out;
    }

    (result, carry)
}

impl<'k> SuperInt<'k> {
    #[must_use]
    /// Ripple carry addition, wrapping on overflow.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands have different widths or key sets.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::{KeySet, SuperInt};
    ///
    /// let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
    /// let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap().zero_extend(3);
    /// let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap().zero_extend(3);
    /// let c = a.wrapping_add(&b);
    /// for i in 0..16 {
    ///     assert_eq!(c.decode_binary_at(i), (i as u64 & 3) + (i as u64 >> 2));
    /// }
    /// ```
    pub fn wrapping_add(&self, other: &Self) -> Self {
        self.assert_compatible(other);
        let _span = trace_span!("add", width = self.width()).entered();
        let (bits, _) = ripple_add(self.bits(), other.bits(), self.key_set());
        Self::from_bits(bits, self.key_set())
    }

    #[must_use]
    /// Addition of unsigned operands keeping the final carry: the result is one bit wider.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands have different widths or key sets.
    pub fn widening_add(&self, other: &Self) -> Self {
        self.assert_compatible(other);
        let _span = trace_span!("widening_add", width = self.width()).entered();
        let (mut bits, carry) = ripple_add(self.bits(), other.bits(), self.key_set());
        bits.push(carry);
        Self::from_bits(bits, self.key_set())
    }

    #[must_use]
    /// Two's complement negation: every bit inverted, then plus one.
    pub fn negate(&self) -> Self {
        let _span = trace_span!("negate", width = self.width()).entered();
        let inverted = self.map_bits(|bit| gates::not(bit, self.key_set()));
        inverted.wrapping_add(&Self::from_pattern(1, self.width(), self.key_set()))
    }

    #[must_use]
    /// Negates the value under the keys where `condition` decodes to `1`.
    ///
    /// No branch is taken: every bit is XORed with `condition`,
    /// then `condition` itself is added as the least significant bit.
    pub fn negate_conditional(&self, condition: &BigUint) -> Self {
        let _span = trace_span!("negate_conditional", width = self.width()).entered();
        let inverted = self.xor_all(condition);
        let addend = Self::from_low_bit(condition.clone(), self.width(), self.key_set());
        inverted.wrapping_add(&addend)
    }

    #[must_use]
    /// Absolute value. The most negative value stays unchanged.
    pub fn abs(&self) -> Self {
        self.negate_conditional(self.is_negative())
    }

    #[must_use]
    /// `self + (-other)`, wrapping on overflow.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands have different widths or key sets.
    pub fn wrapping_sub(&self, other: &Self) -> Self {
        self.assert_compatible(other);
        self.wrapping_add(&other.negate())
    }

    #[must_use]
    /// Shift-and-add multiplication, wrapping on overflow.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands have different widths or key sets.
    pub fn wrapping_mul(&self, other: &Self) -> Self {
        self.assert_compatible(other);
        let _span = trace_span!("multiply", width = self.width()).entered();
        let key_set = self.key_set();

        let mut result = Self::zero(self.width(), key_set);
        for (i, bit) in self.bits().iter().enumerate() {
            let row = other
                .map_bits(|other_bit| gates::and(other_bit, bit, key_set))
                .shift_left(i);
            result = result.wrapping_add(&row);
        }
        result
    }

    /// `self >= other` computed on `width` bits, as the divider needs it.
    fn wrapping_ge(&self, other: &Self) -> BigUint {
        gates::not(self.wrapping_sub(other).is_negative(), self.key_set())
    }

    #[must_use]
    /// Restoring division, truncating toward zero.
    ///
    /// ## Returns
    ///
    /// `(quotient, remainder)` with `self == quotient * other + remainder`
    /// and the remainder carrying the sign of `self`.
    ///
    /// ## Panics
    ///
    /// This function will panic if the operands have different widths or key sets.
    ///
    /// ## Note
    ///
    /// The result is meaningless under the keys where `other` decodes to zero.
    /// The circuit never branches: the comparison result is multiplied into the
    /// subtraction and stored as the quotient bit.
    pub fn div_rem(&self, other: &Self) -> (Self, Self) {
        self.assert_compatible(other);
        let _span = trace_span!("divide", width = self.width()).entered();
        let key_set = self.key_set();
        let width = self.width();

        let dividend_negative = self.is_negative().clone();
        let divisor_negative = other.is_negative().clone();
        let dividend = self.abs();
        let divisor = other.abs();

        let mut quotient = Self::zero(width, key_set);
        let mut remainder = Self::zero(width, key_set);
        for i in (0..width).rev() {
            remainder = remainder.shift_left(1);
            remainder.set_bit(0, dividend.bit(i).clone());

            let fits = remainder.wrapping_ge(&divisor);
            let mask = Self::from_low_bit(fits.clone(), width, key_set);
            remainder = remainder.wrapping_sub(&divisor.wrapping_mul(&mask));
            quotient.set_bit(i, fits);
        }

        let remainder_negative = remainder.is_negative().clone();
        let remainder = remainder.negate_conditional(&gates::xor(
            &dividend_negative,
            &remainder_negative,
            key_set,
        ));
        let quotient = quotient.negate_conditional(&gates::xor(
            &dividend_negative,
            &divisor_negative,
            key_set,
        ));
        (quotient, remainder)
    }

    /// Sign of `self - other` without overflow: both are sign extended by one bit first.
    fn less_than(&self, other: &Self) -> BigUint {
        self.assert_compatible(other);
        let width = self.width() + 1;
        self.sign_extend(width)
            .wrapping_sub(&other.sign_extend(width))
            .is_negative()
            .clone()
    }

    #[must_use]
    /// `self < other` as a superpositional bit.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::{KeySet, SuperInt};
    ///
    /// let key_set = KeySet::calculate(2, &BigUint::from(101u32), |_| {});
    /// let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
    /// let one = SuperInt::from_i64(1, 2, &key_set);
    /// let lt = a.lt(&one);
    /// // a decodes to 0, 1, -2, -1
    /// let expected = [true, false, true, true];
    /// for (i, &e) in expected.iter().enumerate() {
    ///     assert_eq!(key_set.decode_bit(&lt, i), e);
    /// }
    /// ```
    pub fn lt(&self, other: &Self) -> BigUint {
        let _span = trace_span!("lt", width = self.width()).entered();
        self.less_than(other)
    }

    #[must_use]
    /// `self > other` as a superpositional bit.
    pub fn gt(&self, other: &Self) -> BigUint {
        let _span = trace_span!("gt", width = self.width()).entered();
        other.less_than(self)
    }

    #[must_use]
    /// `self <= other` as a superpositional bit.
    pub fn le(&self, other: &Self) -> BigUint {
        gates::not(&self.gt(other), self.key_set())
    }

    #[must_use]
    /// `self >= other` as a superpositional bit.
    pub fn ge(&self, other: &Self) -> BigUint {
        gates::not(&self.lt(other), self.key_set())
    }

    #[must_use]
    /// `self == other` as a superpositional bit.
    pub fn equals(&self, other: &Self) -> BigUint {
        let key_set = self.key_set();
        gates::and(&self.ge(other), &self.le(other), key_set)
    }

    #[must_use]
    /// `self != other` as a superpositional bit.
    pub fn not_equals(&self, other: &Self) -> BigUint {
        gates::or(&self.lt(other), &self.gt(other), self.key_set())
    }
}

impl<'k> Add for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn add(self, rhs: Self) -> SuperInt<'k> {
        self.wrapping_add(rhs)
    }
}

impl<'k> Sub for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn sub(self, rhs: Self) -> SuperInt<'k> {
        self.wrapping_sub(rhs)
    }
}

impl<'k> Mul for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn mul(self, rhs: Self) -> SuperInt<'k> {
        self.wrapping_mul(rhs)
    }
}

impl<'k> Div for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn div(self, rhs: Self) -> SuperInt<'k> {
        self.div_rem(rhs).0
    }
}

impl<'k> Rem for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn rem(self, rhs: Self) -> SuperInt<'k> {
        self.div_rem(rhs).1
    }
}

impl<'k> Neg for &SuperInt<'k> {
    type Output = SuperInt<'k>;

    fn neg(self) -> SuperInt<'k> {
        self.negate()
    }
}

impl HomomorphicOperation2 for HomomorphicAddition {
    const SYMBOL: &'static str = "+";

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        a.wrapping_add(b)
    }
}

impl HomomorphicOperation2 for HomomorphicSubtraction {
    const SYMBOL: &'static str = "-";

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_sub(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        a.wrapping_sub(b)
    }
}

impl HomomorphicOperation2 for HomomorphicMultiplication {
    const SYMBOL: &'static str = "*";

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_mul(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        a.wrapping_mul(b)
    }
}

impl HomomorphicOperation2 for HomomorphicDivision {
    const SYMBOL: &'static str = "/";
    const ALLOW_ZERO_RHS: bool = false;

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_div(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        a.div_rem(b).0
    }
}

impl HomomorphicOperation2 for HomomorphicRemainder {
    const SYMBOL: &'static str = "%";
    const ALLOW_ZERO_RHS: bool = false;

    fn reference(a: i64, b: i64) -> i64 {
        a.wrapping_rem(b)
    }

    fn apply<'k>(a: &SuperInt<'k>, b: &SuperInt<'k>) -> SuperInt<'k> {
        a.div_rem(b).1
    }
}

impl HomomorphicOperation1 for HomomorphicNegation {
    const SYMBOL: &'static str = "-";

    fn reference(a: i64) -> i64 {
        a.wrapping_neg()
    }

    fn apply<'k>(a: &SuperInt<'k>) -> SuperInt<'k> {
        a.negate()
    }
}

impl HomomorphicOperation1 for HomomorphicAbsolute {
    const SYMBOL: &'static str = "abs";

    fn reference(a: i64) -> i64 {
        a.wrapping_abs()
    }

    fn apply<'k>(a: &SuperInt<'k>) -> SuperInt<'k> {
        a.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superint::{binary_from_int, int_from_binary};

    fn wrap(value: i64, width: usize) -> i64 {
        int_from_binary(binary_from_int(value, width), width)
    }

    /// Key set packing two `width` bit operands, keyed from the all-ones probe of `circuit`.
    fn probed_key_set(
        width: usize,
        circuit: impl for<'k> Fn(&SuperInt<'k>, &SuperInt<'k>) -> Vec<BigUint>,
    ) -> KeySet {
        let empty = KeySet::empty();
        let ones = SuperInt::all_ones(width, &empty);
        let min_key = circuit(&ones, &ones).into_iter().max().unwrap_or_default();
        KeySet::calculate(2 * width, &min_key, |_| {})
    }

    fn check_binary<Op: HomomorphicOperation2>(width: usize) {
        let key_set = probed_key_set(width, |a, b| Op::apply(a, b).into_bits());
        let a = SuperInt::from_key_set(&key_set, 0, width).unwrap();
        let b = SuperInt::from_key_set(&key_set, width, width).unwrap();
        let c = Op::apply(&a, &b);

        for i in 0..key_set.key_count() {
            let (x, y) = (a.decode_at(i), b.decode_at(i));
            if y == 0 && !Op::ALLOW_ZERO_RHS {
                continue;
            }
            assert_eq!(
                c.decode_at(i),
                wrap(Op::reference(x, y), width),
                "{x} {} {y}",
                Op::SYMBOL
            );
        }
    }

    fn check_unary<Op: HomomorphicOperation1>(width: usize) {
        let empty = KeySet::empty();
        let probe = Op::apply(&SuperInt::all_ones(width, &empty)).into_bits();
        let min_key = probe.into_iter().max().unwrap_or_default();
        let key_set = KeySet::calculate(width, &min_key, |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, width).unwrap();
        let c = Op::apply(&a);

        for i in 0..key_set.key_count() {
            let x = a.decode_at(i);
            assert_eq!(c.decode_at(i), wrap(Op::reference(x), width), "{}({x})", Op::SYMBOL);
        }
    }

    #[test]
    fn test_two_bit_sum_scenario() {
        let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
        let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap();

        let extended = a.zero_extend(3).wrapping_add(&b.zero_extend(3));
        let widened = a.widening_add(&b);
        assert_eq!(widened.width(), 3);
        for x in 0..4u64 {
            for y in 0..4u64 {
                let index = (y * 4 + x) as usize;
                assert_eq!(extended.decode_binary_at(index), x + y);
                assert_eq!(widened.decode_binary_at(index), x + y);
            }
        }
    }

    #[test]
    fn test_homomorphic_addition() {
        check_binary::<HomomorphicAddition>(2);
        check_binary::<HomomorphicAddition>(3);
    }

    #[test]
    fn test_homomorphic_subtraction() {
        check_binary::<HomomorphicSubtraction>(2);
        check_binary::<HomomorphicSubtraction>(3);
    }

    #[test]
    fn test_homomorphic_multiplication() {
        check_binary::<HomomorphicMultiplication>(2);
        check_binary::<HomomorphicMultiplication>(3);
    }

    #[test]
    fn test_homomorphic_division() {
        check_binary::<HomomorphicDivision>(2);
        check_binary::<HomomorphicDivision>(3);
    }

    #[test]
    fn test_homomorphic_remainder() {
        check_binary::<HomomorphicRemainder>(2);
        check_binary::<HomomorphicRemainder>(3);
    }

    #[test]
    #[ignore = "Long test"]
    fn test_homomorphic_arithmetic_extensive() {
        check_binary::<HomomorphicAddition>(4);
        check_binary::<HomomorphicSubtraction>(4);
        check_binary::<HomomorphicMultiplication>(4);
    }

    #[test]
    fn test_division_identity() {
        let width = 3;
        let key_set = division_key_set(width);
        let a = SuperInt::from_key_set(&key_set, 0, width).unwrap();
        let b = SuperInt::from_key_set(&key_set, width, width).unwrap();
        let (q, r) = a.div_rem(&b);

        for i in 0..key_set.key_count() {
            let (n, d) = (a.decode_at(i), b.decode_at(i));
            if d == 0 {
                continue;
            }
            let (q, r) = (q.decode_at(i), r.decode_at(i));
            assert_eq!(wrap(q * d + r, width), n, "{n} / {d}");
            assert!(r == 0 || (r < 0) == (n < 0), "{n} % {d} = {r}");
        }
    }

    #[test]
    fn test_homomorphic_negation() {
        check_unary::<HomomorphicNegation>(2);
        check_unary::<HomomorphicNegation>(3);
        check_unary::<HomomorphicNegation>(4);
    }

    #[test]
    fn test_homomorphic_absolute() {
        check_unary::<HomomorphicAbsolute>(3);
        check_unary::<HomomorphicAbsolute>(4);
    }

    #[test]
    fn test_negate_conditional() {
        let key_set = KeySet::calculate(3, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap().sign_extend(3);
        let condition = key_set.bits()[2].clone();
        let c = a.negate_conditional(&condition);
        for i in 0..key_set.key_count() {
            let x = a.decode_at(i);
            let expected = if i & 0b100 == 0 { x } else { -x };
            assert_eq!(c.decode_at(i), expected);
        }
    }

    #[test]
    fn test_comparisons() {
        type Compare = for<'k> fn(&SuperInt<'k>, &SuperInt<'k>) -> BigUint;
        let cases: [(&str, Compare, fn(&i64, &i64) -> bool); 6] = [
            ("<", |a, b| a.lt(b), i64::lt),
            ("<=", |a, b| a.le(b), i64::le),
            (">", |a, b| a.gt(b), i64::gt),
            (">=", |a, b| a.ge(b), i64::ge),
            ("==", |a, b| a.equals(b), i64::eq),
            ("!=", |a, b| a.not_equals(b), i64::ne),
        ];

        for width in [2, 3] {
            for (symbol, circuit, reference) in cases {
                let key_set = probed_key_set(width, |a, b| vec![circuit(a, b)]);
                let a = SuperInt::from_key_set(&key_set, 0, width).unwrap();
                let b = SuperInt::from_key_set(&key_set, width, width).unwrap();
                let c = circuit(&a, &b);
                for i in 0..key_set.key_count() {
                    let (x, y) = (a.decode_at(i), b.decode_at(i));
                    assert_eq!(key_set.decode_bit(&c, i), reference(&x, &y), "{x} {symbol} {y}");
                }
            }
        }
    }

    fn division_key_set(width: usize) -> KeySet {
        probed_key_set(width, |a, b| {
            let (q, r) = a.div_rem(b);
            let mut bits = q.into_bits();
            bits.extend(r.into_bits());
            bits
        })
    }

    #[test]
    fn test_operators() {
        let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
        let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap();

        assert_eq!((&a + &b).bits(), a.wrapping_add(&b).bits());
        assert_eq!((&a - &b).bits(), a.wrapping_sub(&b).bits());
        assert_eq!((&a * &b).bits(), a.wrapping_mul(&b).bits());
        assert_eq!((&a / &b).bits(), a.div_rem(&b).0.bits());
        assert_eq!((&a % &b).bits(), a.div_rem(&b).1.bits());
        assert_eq!((-&a).bits(), a.negate().bits());
    }

    #[test]
    fn test_minimum_value_wraps() {
        let key_set = division_key_set(3);
        let min = SuperInt::from_i64(-4, 3, &key_set);
        let minus_one = SuperInt::from_i64(-1, 3, &key_set);
        let (q, r) = min.div_rem(&minus_one);
        for i in 0..key_set.key_count() {
            assert_eq!(min.negate().decode_at(i), -4);
            assert_eq!(min.abs().decode_at(i), -4);
            assert_eq!(q.decode_at(i), -4);
            assert_eq!(r.decode_at(i), 0);
        }
    }

    #[test]
    #[should_panic = "Operands must have the same width"]
    fn test_width_mismatch() {
        let key_set = KeySet::empty();
        let a = SuperInt::zero(2, &key_set);
        let b = SuperInt::zero(3, &key_set);
        let _ = a.wrapping_add(&b);
    }
}
