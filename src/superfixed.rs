use crate::superint::{max_value, min_value, MAX_WIDTH};
use crate::{KeySet, Result, SuperInt};

use num_bigint::BigUint;

/// A signed fixed point number with `fraction_bits` bits after the binary point.
///
/// The value is stored as a superpositional integer scaled by `2^fraction_bits`.
#[derive(Clone, Debug)]
pub struct SuperFixed<'k> {
    int: SuperInt<'k>,
    fraction_bits: usize,
}

impl<'k> SuperFixed<'k> {
    /// Interprets `int` as a fixed point value.
    ///
    /// ## Panics
    ///
    /// This function will panic if there is no integer bit left for the sign.
    pub fn from_int(int: SuperInt<'k>, fraction_bits: usize) -> Self {
        assert!(
            fraction_bits < int.width(),
            "Fixed point values need at least one integer bit"
        );
        Self { int, fraction_bits }
    }

    #[must_use]
    pub fn zero(integer_bits: usize, fraction_bits: usize, key_set: &'k KeySet) -> Self {
        Self::from_int(
            SuperInt::zero(integer_bits + fraction_bits, key_set),
            fraction_bits,
        )
    }

    #[must_use]
    /// A plaintext value, truncated toward zero to a multiple of `2^-fraction_bits`.
    ///
    /// ## Panics
    ///
    /// This function will panic if the value does not fit.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::{KeySet, SuperFixed};
    ///
    /// let key_set = KeySet::calculate(1, &BigUint::from(3u32), |_| {});
    /// let x = SuperFixed::from_f64(-1.8, 3, 2, &key_set);
    /// assert_eq!(x.decode_f64_at(0), -1.75);
    /// ```
    pub fn from_f64(
        value: f64,
        integer_bits: usize,
        fraction_bits: usize,
        key_set: &'k KeySet,
    ) -> Self {
        let width = integer_bits + fraction_bits;
        assert!(width > 0 && width <= MAX_WIDTH, "Invalid width");
        let scaled = (value * (fraction_bits as f64).exp2()).trunc();
        #[allow(clippy::cast_precision_loss)]
        let in_range = scaled >= min_value(width) as f64 && scaled <= max_value(width) as f64;
        assert!(in_range, "Value does not fit in the given width");
        #[allow(clippy::cast_possible_truncation)]
        let raw = scaled as i64;
        Self::from_int(SuperInt::from_i64(raw, width, key_set), fraction_bits)
    }

    /// Takes `integer_bits + fraction_bits` packed input bits starting at `offset`.
    ///
    /// ## Errors
    ///
    /// See `SuperInt::from_key_set`.
    pub fn from_key_set(
        key_set: &'k KeySet,
        offset: usize,
        integer_bits: usize,
        fraction_bits: usize,
    ) -> Result<Self> {
        let int = SuperInt::from_key_set(key_set, offset, integer_bits + fraction_bits)?;
        Ok(Self::from_int(int, fraction_bits))
    }

    #[must_use]
    pub const fn fraction_bits(&self) -> usize {
        self.fraction_bits
    }

    #[must_use]
    pub fn integer_bits(&self) -> usize {
        self.int.width() - self.fraction_bits
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.int.width()
    }

    #[must_use]
    pub const fn as_int(&self) -> &SuperInt<'k> {
        &self.int
    }

    #[must_use]
    pub fn into_int(self) -> SuperInt<'k> {
        self.int
    }

    #[must_use]
    pub fn is_negative(&self) -> &BigUint {
        self.int.is_negative()
    }

    #[must_use]
    /// The scaled integer decoded under `key`.
    pub fn decode_raw(&self, key: &BigUint) -> i64 {
        self.int.decode_int(key)
    }

    #[must_use]
    /// The value decoded under `key`.
    pub fn decode_f64(&self, key: &BigUint) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let raw = self.decode_raw(key) as f64;
        raw / (self.fraction_bits as f64).exp2()
    }

    #[must_use]
    /// The value decoded under the key at `key_index`.
    ///
    /// ## Panics
    ///
    /// This function will panic if `key_index` is out of range.
    pub fn decode_f64_at(&self, key_index: usize) -> f64 {
        self.decode_f64(&self.int.key_set().keys()[key_index])
    }
}
