use crate::cache::KeyCache;
use crate::{Error, KeySet, Result};

use num_bigint::BigUint;
use std::path::Path;

/// Parameters for key generation.
///
/// ## Fields
///
/// * `num_bits` - The number of packed input bits. `2^num_bits` keys are generated.
/// * `min_key` - Lower bound on the smallest key.
/// * `reduce` - Whether gates reduce their result modulo the product of the keys.
/// * `watched_key` - Key index whose residues are checked for overflow after every gate.
///
/// ## Examples
///
/// ```
/// use supercomp::Parameters;
///
/// let parameters = Parameters::new(4, 11u32);
/// ```
///
/// ## Note
///
/// Whether circuits decode correctly depends on `min_key`.
/// `supercomp::verify::probe_min_key` gives a starting point for a given circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    num_bits: usize,
    min_key: BigUint,
    reduce: bool,
    watched_key: Option<usize>,
}

impl Parameters {
    #[must_use]
    /// Creates a new set of parameters, with reduction enabled and no watched key.
    ///
    /// ## Arguments
    ///
    /// * `num_bits` - The number of packed input bits.
    /// * `min_key` - Lower bound on the smallest key.
    ///
    /// ## Panics
    ///
    /// This function will panic if `num_bits` is null or if `min_key` is null.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::Parameters;
    ///
    /// let parameters = Parameters::new(6, BigUint::from(10u32).pow(12));
    /// ```
    pub fn new(num_bits: usize, min_key: impl Into<BigUint>) -> Self {
        let min_key = min_key.into();
        assert!(num_bits > 0, "Parameters must be strictly positive");
        assert!(min_key.bits() > 0, "Parameters must be strictly positive");
        Self {
            num_bits,
            min_key,
            reduce: true,
            watched_key: None,
        }
    }

    #[must_use]
    pub const fn with_reduction(mut self, reduce: bool) -> Self {
        self.reduce = reduce;
        self
    }

    #[must_use]
    pub const fn with_watched_key(mut self, key_index: Option<usize>) -> Self {
        self.watched_key = key_index;
        self
    }

    #[must_use]
    pub const fn num_bits(&self) -> usize {
        self.num_bits
    }

    #[must_use]
    pub const fn min_key(&self) -> &BigUint {
        &self.min_key
    }

    #[must_use]
    pub const fn reduce(&self) -> bool {
        self.reduce
    }

    #[must_use]
    pub const fn watched_key(&self) -> Option<usize> {
        self.watched_key
    }
}

/// Owns the key set every superpositional value of a computation borrows.
#[derive(Clone, Debug)]
pub struct Context {
    key_set: Option<KeySet>,
    parameters: Parameters,
}

impl Context {
    #[must_use]
    /// Creates a new context without any key set.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::{Context, Parameters};
    ///
    /// let mut context = Context::new(Parameters::new(2, 11u32));
    /// assert!(context.get_key_set().is_none());
    /// ```
    pub const fn new(parameters: Parameters) -> Self {
        Self {
            key_set: None,
            parameters,
        }
    }

    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    /// Returns a reference to the key set, if any.
    pub const fn get_key_set(&self) -> Option<&KeySet> {
        self.key_set.as_ref()
    }

    /// Returns a reference to the key set.
    ///
    /// ## Errors
    ///
    /// Returns `Error::MissingKeySet` if no key set was generated, loaded or set.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::{Context, Parameters};
    ///
    /// let mut context = Context::new(Parameters::new(2, 11u32));
    /// assert!(context.key_set().is_err());
    /// context.generate_key_set();
    /// assert_eq!(context.key_set().unwrap().key_count(), 4);
    /// ```
    pub fn key_set(&self) -> Result<&KeySet> {
        self.key_set.as_ref().ok_or(Error::MissingKeySet)
    }

    /// Generates a key set from the parameters.
    pub fn generate_key_set(&mut self) {
        self.generate_key_set_with_progress(|_| {});
    }

    /// Generates a key set from the parameters, reporting progress.
    pub fn generate_key_set_with_progress(&mut self, progress: impl FnMut(u8)) {
        let key_set = KeySet::calculate(
            self.parameters.num_bits(),
            self.parameters.min_key(),
            progress,
        );
        self.set_key_set(key_set);
    }

    /// Fetches the key set from `cache`, generating and storing it on a miss.
    ///
    /// ## Errors
    ///
    /// See `KeyCache::calculate_cached`.
    pub fn generate_key_set_cached(
        &mut self,
        cache: &KeyCache,
        progress: impl FnMut(u8),
    ) -> Result<()> {
        let key_set = cache.calculate_cached(
            self.parameters.num_bits(),
            self.parameters.min_key(),
            progress,
        )?;
        self.set_key_set(key_set);
        Ok(())
    }

    /// Loads a key file. The current key set is kept if loading fails.
    ///
    /// ## Errors
    ///
    /// See `KeySet::read`.
    pub fn load_key_set(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let key_set = KeySet::read(path)?;
        self.set_key_set(key_set);
        Ok(())
    }

    /// Explicitly sets the key set.
    ///
    /// The reduction and watch settings of the parameters are applied to it.
    pub fn set_key_set(&mut self, mut key_set: KeySet) {
        key_set.set_reduce(self.parameters.reduce());
        let watched = self
            .parameters
            .watched_key()
            .filter(|&index| index < key_set.key_count());
        key_set.watch_key(watched);
        self.key_set = Some(key_set);
    }
}
