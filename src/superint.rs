use crate::{gates, Error, KeySet, Result};

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

/// The widest value that can be decoded into a plaintext integer.
pub const MAX_WIDTH: usize = 64;

const fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

#[must_use]
/// Interprets the low `width` bits of `value` as a two's complement integer.
///
/// ## Panics
///
/// This function will panic if `width` is null or greater than `MAX_WIDTH`.
///
/// ## Examples
///
/// ```
/// use supercomp::superint::int_from_binary;
///
/// assert_eq!(int_from_binary(0b111, 3), -1);
/// assert_eq!(int_from_binary(0b011, 3), 3);
/// ```
pub const fn int_from_binary(value: u64, width: usize) -> i64 {
    assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
    let value = value & mask(width);
    if (value >> (width - 1)) & 1 == 1 {
        (value | !mask(width)) as i64
    } else {
        value as i64
    }
}

#[must_use]
/// Two's complement encoding of `value` on `width` bits.
///
/// ## Panics
///
/// This function will panic if `width` is null or greater than `MAX_WIDTH`.
pub const fn binary_from_int(value: i64, width: usize) -> u64 {
    assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
    value as u64 & mask(width)
}

#[must_use]
/// Smallest integer representable on `width` bits.
pub const fn min_value(width: usize) -> i64 {
    assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
    int_from_binary(1 << (width - 1), width)
}

#[must_use]
/// Largest integer representable on `width` bits.
pub const fn max_value(width: usize) -> i64 {
    assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
    int_from_binary(mask(width - 1), width)
}

#[must_use]
/// `(value mod key) / key`, how far the residue of `value` has drifted toward `key`.
pub fn error_ratio(value: &BigUint, key: &BigUint) -> f64 {
    let shift = key.bits().saturating_sub(64);
    match (((value % key) >> shift).to_f64(), (key >> shift).to_f64()) {
        (Some(residue), Some(key)) if key > 0.0 => residue / key,
        _ => 0.0,
    }
}

/// A two's complement integer whose value depends on the key used to decode it.
///
/// Bit 0 is the least significant bit and the last bit is the sign bit.
/// Every bit is a superpositional bit of the borrowed key set, so one value
/// holds the result of a circuit for all `2^n` input assignments at once.
///
/// Operands of a binary operation must borrow the same key set instance.
#[derive(Clone, Debug)]
pub struct SuperInt<'k> {
    bits: Vec<BigUint>,
    key_set: &'k KeySet,
}

impl<'k> SuperInt<'k> {
    /// Wraps raw superpositional bits.
    ///
    /// ## Panics
    ///
    /// This function will panic if `bits` is empty.
    pub fn from_bits(bits: Vec<BigUint>, key_set: &'k KeySet) -> Self {
        assert!(!bits.is_empty(), "Width must be strictly positive");
        Self { bits, key_set }
    }

    /// A plaintext constant: every key decodes the low `width` bits of `pattern`.
    pub(crate) fn from_pattern(pattern: u64, width: usize, key_set: &'k KeySet) -> Self {
        let bits = (0..width)
            .map(|i| {
                if i < 64 && (pattern >> i) & 1 == 1 {
                    BigUint::one()
                } else {
                    BigUint::zero()
                }
            })
            .collect();
        Self::from_bits(bits, key_set)
    }

    /// `bit` as the least significant bit, plaintext zeros above.
    pub(crate) fn from_low_bit(bit: BigUint, width: usize, key_set: &'k KeySet) -> Self {
        let mut value = Self::zero(width, key_set);
        value.bits[0] = bit;
        value
    }

    #[must_use]
    /// The plaintext value `0` on `width` bits.
    pub fn zero(width: usize, key_set: &'k KeySet) -> Self {
        Self::from_pattern(0, width, key_set)
    }

    #[must_use]
    /// A plaintext value identical under every key.
    ///
    /// ## Panics
    ///
    /// This function will panic if `value` does not fit in `width` bits.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::{KeySet, SuperInt};
    ///
    /// let key_set = KeySet::empty();
    /// let a = SuperInt::from_i64(-3, 4, &key_set);
    /// assert_eq!(a.width(), 4);
    /// ```
    pub fn from_i64(value: i64, width: usize, key_set: &'k KeySet) -> Self {
        assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
        assert!(
            (min_value(width)..=max_value(width)).contains(&value),
            "Value does not fit in the given width"
        );
        Self::from_pattern(binary_from_int(value, width), width, key_set)
    }

    #[must_use]
    /// Every bit set to plaintext `1`.
    pub fn all_ones(width: usize, key_set: &'k KeySet) -> Self {
        Self::from_bits(vec![BigUint::one(); width], key_set)
    }

    /// Takes `width` consecutive packed input bits of the key set, starting at `offset`.
    ///
    /// ## Errors
    ///
    /// Returns `Error::NotEnoughBits` if the key set holds fewer than `offset + width` bits.
    ///
    /// ## Panics
    ///
    /// This function will panic if `width` is null.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::{KeySet, SuperInt};
    ///
    /// let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
    /// let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
    /// let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap();
    /// // key index 0b10_01 assigns a = 1 and b = 2
    /// assert_eq!(a.decode_at(0b1001), 1);
    /// assert_eq!(b.decode_binary_at(0b1001), 2);
    /// assert!(SuperInt::from_key_set(&key_set, 3, 2).is_err());
    /// ```
    pub fn from_key_set(key_set: &'k KeySet, offset: usize, width: usize) -> Result<Self> {
        let available = key_set.num_bits();
        let requested = offset.saturating_add(width);
        if requested > available {
            return Err(Error::NotEnoughBits {
                requested,
                available,
            });
        }
        Ok(Self::from_bits(
            key_set.bits()[offset..requested].to_vec(),
            key_set,
        ))
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn bits(&self) -> &[BigUint] {
        &self.bits
    }

    #[must_use]
    pub fn into_bits(self) -> Vec<BigUint> {
        self.bits
    }

    #[must_use]
    /// ## Panics
    ///
    /// This function will panic if `index` is out of range.
    pub fn bit(&self, index: usize) -> &BigUint {
        &self.bits[index]
    }

    #[must_use]
    pub const fn key_set(&self) -> &'k KeySet {
        self.key_set
    }

    #[must_use]
    /// The sign bit.
    pub fn is_negative(&self) -> &BigUint {
        &self.bits[self.bits.len() - 1]
    }

    pub(crate) fn assert_compatible(&self, other: &Self) {
        assert!(
            core::ptr::eq(self.key_set, other.key_set),
            "Operands must use the same key set"
        );
        assert_eq!(self.width(), other.width(), "Operands must have the same width");
    }

    pub(crate) fn set_bit(&mut self, index: usize, bit: BigUint) {
        self.bits[index] = bit;
    }

    pub(crate) fn map_bits(&self, f: impl FnMut(&BigUint) -> BigUint) -> Self {
        Self::from_bits(self.bits.iter().map(f).collect(), self.key_set)
    }

    #[must_use]
    /// Decodes the bits under `key` as an unsigned pattern.
    ///
    /// ## Panics
    ///
    /// This function will panic if the width is greater than `MAX_WIDTH`.
    pub fn decode_binary(&self, key: &BigUint) -> u64 {
        assert!(self.width() <= MAX_WIDTH, "Invalid width");
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| (*bit % key).bit(0))
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }

    #[must_use]
    /// Decodes the bits under `key` as a two's complement integer.
    pub fn decode_int(&self, key: &BigUint) -> i64 {
        int_from_binary(self.decode_binary(key), self.width())
    }

    #[must_use]
    /// Decodes the unsigned pattern under the key at `key_index`.
    pub fn decode_binary_at(&self, key_index: usize) -> u64 {
        self.decode_binary(&self.key_set.keys()[key_index])
    }

    #[must_use]
    /// Decodes the integer under the key at `key_index`.
    ///
    /// ## Panics
    ///
    /// This function will panic if `key_index` is out of range.
    pub fn decode_at(&self, key_index: usize) -> i64 {
        self.decode_int(&self.key_set.keys()[key_index])
    }

    #[must_use]
    /// Highest `residue / key` ratio over the bits, in `[0, 1)`.
    ///
    /// The closer to `1`, the closer the value is to decoding wrongly under `key`
    /// once more gates are applied.
    pub fn max_error(&self, key: &BigUint) -> f64 {
        self.bits
            .iter()
            .map(|bit| error_ratio(bit, key))
            .fold(0.0, f64::max)
    }

    #[must_use]
    /// Moves bits towards the most significant end, shifting in plaintext zeros.
    ///
    /// No gate is evaluated, so no noise is added.
    pub fn shift_left(&self, amount: usize) -> Self {
        let width = self.width();
        let amount = amount.min(width);
        let bits = core::iter::repeat_with(BigUint::zero)
            .take(amount)
            .chain(self.bits[..width - amount].iter().cloned())
            .collect();
        Self::from_bits(bits, self.key_set)
    }

    #[must_use]
    /// Moves bits towards the least significant end, repeating the sign bit.
    pub fn signed_shift_right(&self, amount: usize) -> Self {
        let width = self.width();
        let amount = amount.min(width);
        let sign = self.is_negative().clone();
        let bits = self.bits[amount..]
            .iter()
            .cloned()
            .chain(core::iter::repeat(sign).take(amount))
            .collect();
        Self::from_bits(bits, self.key_set)
    }

    #[must_use]
    /// Widens to `width` bits, filling with plaintext zeros.
    ///
    /// ## Panics
    ///
    /// This function will panic if `width` is smaller than the current width.
    pub fn zero_extend(&self, width: usize) -> Self {
        assert!(width >= self.width(), "Cannot extend to a smaller width");
        let mut bits = self.bits.clone();
        bits.resize_with(width, BigUint::zero);
        Self::from_bits(bits, self.key_set)
    }

    #[must_use]
    /// Widens to `width` bits, repeating the sign bit.
    ///
    /// ## Panics
    ///
    /// This function will panic if `width` is smaller than the current width.
    pub fn sign_extend(&self, width: usize) -> Self {
        assert!(width >= self.width(), "Cannot extend to a smaller width");
        let mut bits = self.bits.clone();
        bits.resize(width, self.is_negative().clone());
        Self::from_bits(bits, self.key_set)
    }

    #[must_use]
    /// Keeps the `width` least significant bits.
    ///
    /// ## Panics
    ///
    /// This function will panic if `width` is null or greater than the current width.
    pub fn truncate(&self, width: usize) -> Self {
        assert!(width <= self.width(), "Cannot truncate to a larger width");
        Self::from_bits(self.bits[..width].to_vec(), self.key_set)
    }

    /// XORs every bit with `condition`, inverting the value wherever it holds.
    pub(crate) fn xor_all(&self, condition: &BigUint) -> Self {
        self.map_bits(|bit| gates::xor(bit, condition, self.key_set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twos_complement_roundtrip() {
        for width in 1..=8 {
            for x in min_value(width)..=max_value(width) {
                assert_eq!(int_from_binary(binary_from_int(x, width), width), x);
            }
        }
        assert_eq!(int_from_binary(binary_from_int(i64::MIN, 64), 64), i64::MIN);
        assert_eq!(min_value(64), i64::MIN);
        assert_eq!(max_value(64), i64::MAX);
        assert_eq!((min_value(1), max_value(1)), (-1, 0));
        assert_eq!((min_value(3), max_value(3)), (-4, 3));
    }

    #[test]
    fn test_constants_decode_everywhere() {
        let key_set = KeySet::calculate(2, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_i64(-5, 4, &key_set);
        let z = SuperInt::zero(4, &key_set);
        let ones = SuperInt::all_ones(4, &key_set);
        for i in 0..key_set.key_count() {
            assert_eq!(a.decode_at(i), -5);
            assert_eq!(z.decode_at(i), 0);
            assert_eq!(ones.decode_at(i), -1);
            assert_eq!(ones.decode_binary_at(i), 0b1111);
        }
    }

    #[test]
    #[should_panic = "Value does not fit in the given width"]
    fn test_constant_out_of_range() {
        let key_set = KeySet::empty();
        let _ = SuperInt::from_i64(8, 4, &key_set);
    }

    #[test]
    #[should_panic = "Invalid width"]
    fn test_min_value_zero_width() {
        let _ = min_value(0);
    }

    #[test]
    #[should_panic = "Invalid width"]
    fn test_max_value_too_wide() {
        let _ = max_value(MAX_WIDTH + 1);
    }

    #[test]
    fn test_from_key_set() {
        let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
        let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap();
        for i in 0..key_set.key_count() {
            let i = i as u64;
            assert_eq!(a.decode_binary_at(i as usize), i & 0b11);
            assert_eq!(b.decode_binary_at(i as usize), i >> 2);
        }

        let err = SuperInt::from_key_set(&key_set, 1, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughBits {
                requested: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn test_shifts() {
        let key_set = KeySet::calculate(3, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 3).unwrap();
        for i in 0..key_set.key_count() {
            let value = a.decode_at(i);
            let doubled = int_from_binary(binary_from_int(value << 1, 3), 3);
            assert_eq!(a.shift_left(1).decode_at(i), doubled);
            assert_eq!(a.signed_shift_right(1).decode_at(i), value >> 1);
            assert_eq!(a.signed_shift_right(5).decode_at(i), value >> 2);
            assert_eq!(a.shift_left(3).decode_at(i), 0);
        }
    }

    #[test]
    fn test_shifts_add_no_noise() {
        let key_set = KeySet::calculate(3, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 3).unwrap();
        let shifted = a.shift_left(1).signed_shift_right(2);
        assert!(shifted
            .bits()
            .iter()
            .all(|bit| bit.is_zero() || key_set.bits().contains(bit)));
    }

    #[test]
    fn test_extend_and_truncate() {
        let key_set = KeySet::calculate(3, &BigUint::from(11u32), |_| {});
        let a = SuperInt::from_key_set(&key_set, 0, 3).unwrap();
        for i in 0..key_set.key_count() {
            let value = a.decode_at(i);
            assert_eq!(a.sign_extend(6).decode_at(i), value);
            assert_eq!(a.zero_extend(6).decode_at(i), value & 0b111);
            assert_eq!(a.truncate(2).decode_binary_at(i), (value as u64) & 0b11);
        }
    }

    #[test]
    fn test_max_error() {
        let key_set = KeySet::calculate(2, &BigUint::from(11u32), |_| {});
        let ones = SuperInt::all_ones(2, &key_set);
        let key = &key_set.keys()[0];
        assert!((ones.max_error(key) - 1.0 / 11.0).abs() < 1e-12);
        assert!(SuperInt::zero(2, &key_set).max_error(key).abs() < f64::EPSILON);

        let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap();
        for key in key_set.keys() {
            let error = a.max_error(key);
            assert!((0.0..1.0).contains(&error));
        }
    }

    #[test]
    #[should_panic = "Operands must use the same key set"]
    fn test_key_set_mismatch() {
        let k1 = KeySet::calculate(1, &BigUint::from(3u32), |_| {});
        let k2 = k1.clone();
        let a = SuperInt::zero(2, &k1);
        let b = SuperInt::zero(2, &k2);
        a.assert_compatible(&b);
    }
}
