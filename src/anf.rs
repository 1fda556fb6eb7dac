//! Algebraic normal form synthesis.
//!
//! Any function of `k` input bits can be written, for each output bit, as a XOR of
//! AND terms over the inputs. Evaluated on superpositional bits, such a circuit has
//! a single AND layer followed by a single XOR layer, whatever the function is.
//! Depth is what makes noise grow, so this trades a larger number of terms for a
//! much shallower circuit than a bit serial implementation.

use crate::{gates, KeySet, SuperInt};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace_span;

/// The algebraic normal form of every output bit of a lookup table.
///
/// A term is a mask over the input bits: term `0b101` is `x0 AND x2`,
/// term `0` is the constant `1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnfTerms {
    input_bits: usize,
    outputs: Vec<Vec<u64>>,
}

impl AnfTerms {
    /// Computes the terms of a lookup table with `2^input_bits` rows of `output_bits` bits.
    ///
    /// Term `t` belongs to output bit `o` iff the number of rows `x` with `x` a subset
    /// of `t` and bit `o` of `table[x]` set is odd.
    ///
    /// ## Panics
    ///
    /// This function will panic if the table does not have `2^input_bits` rows,
    /// if `output_bits` is zero, or if `input_bits` or `output_bits` is greater than 63.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::anf::AnfTerms;
    ///
    /// // x0 OR x1 == x0 ^ x1 ^ x0.x1
    /// let anf = AnfTerms::from_lookup_table(2, 1, &[0, 1, 1, 1]);
    /// assert_eq!(anf.terms(0), &[0b01, 0b10, 0b11]);
    /// ```
    pub fn from_lookup_table(input_bits: usize, output_bits: usize, table: &[u64]) -> Self {
        assert!(input_bits < 64 && output_bits < 64, "Too many bits");
        assert!(output_bits > 0, "At least one output bit is needed");
        assert_eq!(
            table.len() as u64,
            1 << input_bits,
            "The lookup table must have 2^input_bits rows"
        );

        let outputs = (0..output_bits)
            .map(|output| {
                (0..table.len() as u64)
                    .filter(|&term| {
                        (0..table.len() as u64)
                            .filter(|&row| row & !term == 0)
                            .filter(|&row| (table[row as usize] >> output) & 1 == 1)
                            .count()
                            % 2
                            == 1
                    })
                    .collect()
            })
            .collect();

        Self {
            input_bits,
            outputs,
        }
    }

    /// Computes the terms of `f` evaluated on every input pattern.
    ///
    /// ## Examples
    ///
    /// ```
    /// use supercomp::anf::AnfTerms;
    ///
    /// let adder = AnfTerms::from_fn(4, 3, |x| (x & 3) + (x >> 2));
    /// assert_eq!(adder.terms(0), &[0b0001, 0b0100]);
    /// ```
    pub fn from_fn(input_bits: usize, output_bits: usize, f: impl Fn(u64) -> u64) -> Self {
        let table: Vec<u64> = (0..1u64 << input_bits).map(f).collect();
        Self::from_lookup_table(input_bits, output_bits, &table)
    }

    #[must_use]
    pub const fn input_bits(&self) -> usize {
        self.input_bits
    }

    #[must_use]
    pub fn output_bits(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    /// Terms of output bit `output`, in increasing order.
    ///
    /// ## Panics
    ///
    /// This function will panic if `output` is out of range.
    pub fn terms(&self, output: usize) -> &[u64] {
        &self.outputs[output]
    }

    #[must_use]
    /// Total number of terms over all outputs.
    pub fn term_count(&self) -> usize {
        self.outputs.iter().map(Vec::len).sum()
    }

    #[must_use]
    /// Largest number of inputs ANDed together in a single term.
    pub fn max_degree(&self) -> u32 {
        self.outputs
            .iter()
            .flatten()
            .map(|term| term.count_ones())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    /// Evaluates the terms on a plaintext input pattern.
    pub fn evaluate(&self, input: u64) -> u64 {
        self.outputs
            .iter()
            .enumerate()
            .map(|(output, terms)| {
                let parity = terms.iter().filter(|&&term| input & term == term).count() % 2;
                (parity as u64) << output
            })
            .fold(0, |acc, bit| acc | bit)
    }

    #[must_use]
    /// Builds the circuit on superpositional input bits.
    ///
    /// Output bit `o` is the XOR, over the terms of `o`, of the AND of the inputs in the term.
    ///
    /// ## Panics
    ///
    /// This function will panic if `inputs` does not have `input_bits` bits.
    pub fn build_circuit<'k>(&self, inputs: &SuperInt<'k>) -> SuperInt<'k> {
        assert_eq!(inputs.width(), self.input_bits, "Wrong number of input bits");
        let _span = trace_span!("anf", terms = self.term_count()).entered();
        let key_set = inputs.key_set();

        let bits = self
            .outputs
            .iter()
            .map(|terms| {
                terms.iter().fold(BigUint::zero(), |acc, &term| {
                    gates::xor(&acc, &self.product(term, inputs, key_set), key_set)
                })
            })
            .collect();
        SuperInt::from_bits(bits, key_set)
    }

    fn product(&self, term: u64, inputs: &SuperInt<'_>, key_set: &KeySet) -> BigUint {
        (0..self.input_bits)
            .filter(|&b| (term >> b) & 1 == 1)
            .fold(BigUint::one(), |acc, b| gates::and(&acc, inputs.bit(b), key_set))
    }
}
