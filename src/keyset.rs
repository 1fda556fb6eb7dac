//! Generation of the pairwise coprime keys and of the packed input bits.
//!
//! A key set over `n` packed bits holds `2^n` odd, pairwise coprime keys.
//! Key index `i` stands for the input assignment whose bit `b` is bit `b` of `i`.
//! Packed bit `b` is the unique value modulo the product of all keys whose residue
//! under `keys[i]` has the parity of bit `b` of `i`.

use crate::euclid::{inverse_mod, is_coprime};
use crate::{Error, Result};

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use tracing::{debug, debug_span, info};

/// Tracks a progress callback so that it only ever sees increasing percentages.
struct Progress<F: FnMut(u8)> {
    callback: F,
    last: Option<u8>,
}

impl<F: FnMut(u8)> Progress<F> {
    const fn new(callback: F) -> Self {
        Self {
            callback,
            last: None,
        }
    }

    fn report(&mut self, percent: u8) {
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        (self.callback)(percent);
    }

    /// Each of the three phases covers a third of the range.
    fn phase(&mut self, base: u8, done: usize, total: usize) {
        let step = (33 * done / total.max(1)).min(33);
        #[allow(clippy::cast_possible_truncation)]
        self.report(base + step as u8);
    }
}

/// A set of keys along with the packed input bits they define.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySet {
    bits: Vec<BigUint>,
    keys: Vec<BigUint>,
    lcm: BigUint,
    reduce: bool,
    watched_key: Option<usize>,
}

impl KeySet {
    #[must_use]
    /// Creates a key set without any key.
    ///
    /// Gates evaluated against it are never reduced, which is what the
    /// all-ones probe of `crate::verify::probe_min_key` needs.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            keys: Vec::new(),
            lcm: BigUint::one(),
            reduce: false,
            watched_key: None,
        }
    }

    #[must_use]
    /// Generates the keys and packed bits for `num_bits` input bits.
    ///
    /// ## Arguments
    ///
    /// * `num_bits` - The number of packed input bits. `2^num_bits` keys are generated.
    /// * `min_key` - Lower bound on the smallest key, rounded up to the next odd number.
    /// * `progress` - Receives increasing percentages, the last one being `100`.
    ///
    /// ## Panics
    ///
    /// This function will panic if `2^num_bits` does not fit in a `usize`.
    ///
    /// ## Note
    ///
    /// Cost grows with `4^num_bits`: each key is checked against every previous one.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::KeySet;
    ///
    /// let key_set = KeySet::calculate(2, &BigUint::from(10u32), |_| {});
    /// assert_eq!(key_set.keys(), &[11u32, 13, 15, 17].map(BigUint::from));
    /// ```
    pub fn calculate(num_bits: usize, min_key: &BigUint, progress: impl FnMut(u8)) -> Self {
        assert!(
            num_bits < usize::BITS as usize,
            "Too many packed bits for this platform"
        );
        let key_count = 1usize << num_bits;
        let span = debug_span!("calculate", num_bits, %min_key);
        let _guard = span.enter();

        let mut progress = Progress::new(progress);
        progress.report(0);

        let mut keys: Vec<BigUint> = Vec::with_capacity(key_count);
        keys.push(if min_key.is_even() {
            min_key + 1u32
        } else {
            min_key.clone()
        });
        for i in 1..key_count {
            let mut candidate = &keys[i - 1] + 2u32;
            while !keys.iter().all(|key| is_coprime(&candidate, key)) {
                candidate += 2u32;
            }
            keys.push(candidate);
            progress.phase(0, i + 1, key_count);
        }
        progress.phase(0, key_count, key_count);
        debug!(smallest = %keys[0], largest = %keys[key_count - 1], "key search done");

        let lcm: BigUint = keys.iter().product();

        // coefficient[i] * (coefficient[i]^-1 mod keys[i]) is 1 under keys[i] and 0 under the others
        let mut basis: Vec<BigUint> = Vec::with_capacity(key_count);
        for (i, key) in keys.iter().enumerate() {
            let coefficient = &lcm / key;
            let Some(inverse) = inverse_mod(&(&coefficient % key), key) else {
                unreachable!("keys are pairwise coprime");
            };
            basis.push((coefficient * inverse) % &lcm);
            progress.phase(33, i + 1, key_count);
        }
        debug!(lcm_bits = lcm.bits(), "coefficients done");

        let mut bits: Vec<BigUint> = Vec::with_capacity(num_bits);
        for b in 0..num_bits {
            let mut value = BigUint::zero();
            for (i, term) in basis.iter().enumerate() {
                if (i >> b) & 1 == 1 {
                    value += term;
                    value %= &lcm;
                }
            }
            bits.push(value);
            progress.phase(66, b + 1, num_bits);
        }
        progress.phase(66, num_bits, num_bits);

        let key_set = Self {
            bits,
            keys,
            lcm,
            reduce: true,
            watched_key: None,
        };
        info!(
            num_bits,
            keys = key_count,
            complexity = key_set.complexity_index(),
            "key set generated"
        );
        progress.report(100);
        key_set
    }

    /// Builds a key set out of previously generated packed bits and keys.
    ///
    /// ## Errors
    ///
    /// Returns an error if the number of keys is not `2^bits.len()`,
    /// or if a key is zero or even.
    /// Coprimality is not checked; use `verify_packing` for that.
    pub fn from_parts(bits: Vec<BigUint>, keys: Vec<BigUint>) -> Result<Self> {
        if bits.len() >= usize::BITS as usize {
            return Err(Error::TooManyBits(bits.len()));
        }
        if keys.len() != 1 << bits.len() {
            return Err(Error::Inconsistent("key count is not 2^num_bits"));
        }
        if keys.iter().any(Zero::is_zero) {
            return Err(Error::Inconsistent("keys must be strictly positive"));
        }
        if keys.iter().any(Integer::is_even) {
            return Err(Error::Inconsistent("keys must be odd"));
        }
        let lcm = keys.iter().product();
        Ok(Self {
            bits,
            keys,
            lcm,
            reduce: true,
            watched_key: None,
        })
    }

    #[must_use]
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn bits(&self) -> &[BigUint] {
        &self.bits
    }

    #[must_use]
    pub fn keys(&self) -> &[BigUint] {
        &self.keys
    }

    #[must_use]
    /// Product of every key.
    pub const fn lcm(&self) -> &BigUint {
        &self.lcm
    }

    #[must_use]
    pub const fn reduces(&self) -> bool {
        self.reduce
    }

    #[must_use]
    pub const fn watched_key(&self) -> Option<usize> {
        self.watched_key
    }

    /// Enables or disables reduction modulo `lcm` after every gate.
    ///
    /// Reduction keeps values small and never changes a residue.
    pub fn set_reduce(&mut self, reduce: bool) {
        self.reduce = reduce;
    }

    /// Watches a key index for residue overflow, or stops watching with `None`.
    ///
    /// ## Panics
    ///
    /// This function will panic if the index is out of range.
    pub fn watch_key(&mut self, key_index: Option<usize>) {
        if let Some(index) = key_index {
            assert!(index < self.keys.len(), "Watched key index out of range");
        }
        self.watched_key = key_index;
    }

    #[must_use]
    /// Reduces `value` modulo `lcm` if reduction is enabled.
    pub fn reduce_value(&self, value: BigUint) -> BigUint {
        if self.reduce {
            self.reduce_value_explicit(value)
        } else {
            value
        }
    }

    #[must_use]
    /// Reduces `value` modulo `lcm` regardless of the configuration.
    pub fn reduce_value_explicit(&self, value: BigUint) -> BigUint {
        value % &self.lcm
    }

    #[must_use]
    /// Rough cost indicator of circuits using this key set: `log10` of the sum of the keys.
    ///
    /// Returns `0.0` for an empty key set.
    pub fn complexity_index(&self) -> f64 {
        let sum: BigUint = self.keys.iter().sum();
        if sum.is_zero() {
            return 0.0;
        }
        let shift = sum.bits().saturating_sub(64);
        let head = (sum >> shift).to_f64().unwrap_or(f64::MAX);
        #[allow(clippy::cast_precision_loss)]
        let tail = shift as f64 * core::f64::consts::LOG10_2;
        head.log10() + tail
    }

    #[must_use]
    /// Decodes one value under the given key index.
    ///
    /// ## Panics
    ///
    /// This function will panic if the index is out of range.
    pub fn decode_bit(&self, value: &BigUint, key_index: usize) -> bool {
        (value % &self.keys[key_index]).bit(0)
    }

    #[must_use]
    /// Checks that every packed bit decodes to the right value under every key.
    pub fn verify_packing(&self) -> bool {
        self.bits.iter().enumerate().all(|(b, bit)| {
            (0..self.keys.len()).all(|i| self.decode_bit(bit, i) == ((i >> b) & 1 == 1))
        })
    }
}
