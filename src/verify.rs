//! Exhaustive verification of binary circuits.
//!
//! A case packs two `width` bit operands into a key set of `2 * width` bits, runs the
//! circuit once, then decodes the result under every key and compares it with the
//! plaintext reference. Key index `i` holds operand `a = i mod 2^width` and
//! operand `b = i >> width`.

use crate::cache::KeyCache;
use crate::impls::numbers::{
    HomomorphicAddition, HomomorphicDivision, HomomorphicFixedDivision,
    HomomorphicFixedMultiplication, HomomorphicMultiplication, HomomorphicRemainder,
    HomomorphicSubtraction,
};
use crate::operations::HomomorphicOperation2;
use crate::superint::{binary_from_int, error_ratio, int_from_binary};
use crate::{KeySet, Result, SuperInt};

use num_bigint::BigUint;
use tracing::{debug, info, info_span};

/// A binary circuit together with its plaintext reference.
#[derive(Clone, Copy, Debug)]
pub struct OperationCase {
    pub name: &'static str,
    pub symbol: &'static str,
    pub width: usize,
    pub reference: fn(i64, i64) -> i64,
    pub circuit: for<'k> fn(&SuperInt<'k>, &SuperInt<'k>) -> SuperInt<'k>,
    pub allow_zero_rhs: bool,
}

impl OperationCase {
    #[must_use]
    pub fn new<Op: HomomorphicOperation2>(name: &'static str, width: usize) -> Self {
        Self {
            name,
            symbol: Op::SYMBOL,
            width,
            reference: Op::reference,
            circuit: Op::apply,
            allow_zero_rhs: Op::ALLOW_ZERO_RHS,
        }
    }
}

#[must_use]
/// The integer circuits, on `width` bit operands.
pub fn integer_cases(width: usize) -> Vec<OperationCase> {
    vec![
        OperationCase::new::<HomomorphicAddition>("Int_Add", width),
        OperationCase::new::<HomomorphicSubtraction>("Int_Subtract", width),
        OperationCase::new::<HomomorphicMultiplication>("Int_Multiply", width),
        OperationCase::new::<HomomorphicDivision>("Int_Divide", width),
        OperationCase::new::<HomomorphicRemainder>("Int_Modulus", width),
    ]
}

#[must_use]
/// The fixed point circuits, on formats small enough to be checked quickly.
///
/// Operands are the scaled integers, so `width` is integer plus fraction bits.
pub fn fixed_cases() -> Vec<OperationCase> {
    vec![
        OperationCase::new::<HomomorphicFixedMultiplication<1>>("Fixed_Multiply_1_1", 2),
        OperationCase::new::<HomomorphicFixedMultiplication<1>>("Fixed_Multiply_2_1", 3),
        OperationCase::new::<HomomorphicFixedDivision<1>>("Fixed_Divide_1_1", 2),
        OperationCase::new::<HomomorphicFixedDivision<1>>("Fixed_Divide_2_1", 3),
    ]
}

#[must_use]
/// Runs the circuit on all-ones operands without reduction and returns the largest output bit.
///
/// This estimates how large the smallest key must be for the circuit to decode
/// correctly. It is a heuristic: a key below the estimate may still work, and
/// nothing guarantees that a key above it does.
pub fn probe_min_key(case: &OperationCase) -> BigUint {
    let empty = KeySet::empty();
    let ones = SuperInt::all_ones(case.width, &empty);
    (case.circuit)(&ones, &ones)
        .into_bits()
        .into_iter()
        .max()
        .unwrap_or_default()
}

/// One decoded result of a two input circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permutation {
    pub key_index: usize,
    pub a: u64,
    pub b: u64,
    pub result: u64,
}

#[must_use]
/// Decodes `result` under every key, labelled with the operand patterns of the key index.
///
/// ## Panics
///
/// This function will panic if the key set of `result` does not have exactly
/// `width_a + width_b` packed bits.
pub fn permute_results_2_inputs(
    result: &SuperInt<'_>,
    width_a: usize,
    width_b: usize,
) -> Vec<Permutation> {
    let key_set = result.key_set();
    assert_eq!(
        key_set.num_bits(),
        width_a + width_b,
        "The key set must pack exactly both operands"
    );
    let mask_a = (1u64 << width_a) - 1;

    (0..key_set.key_count())
        .map(|key_index| {
            let packed = key_index as u64;
            Permutation {
                key_index,
                a: packed & mask_a,
                b: packed >> width_a,
                result: result.decode_binary_at(key_index),
            }
        })
        .collect()
}

/// A key index whose decoded result differs from the plaintext reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub key_index: usize,
    pub a: i64,
    pub b: i64,
    pub expected: i64,
    pub found: i64,
}

/// Outcome of `run_case`.
#[derive(Clone, Debug)]
pub struct VerificationReport {
    pub name: &'static str,
    pub width: usize,
    pub min_key: BigUint,
    pub key_count: usize,
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
    /// Highest `residue / key` ratio of each output bit over all keys.
    pub bit_errors: Vec<f64>,
}

impl VerificationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Verifies `case` with a key set built from `probe_min_key`.
///
/// ## Errors
///
/// See `run_case_with_min_key`.
pub fn run_case(case: &OperationCase, cache: Option<&KeyCache>) -> Result<VerificationReport> {
    run_case_with_min_key(case, &probe_min_key(case), cache)
}

/// Verifies `case` with the smallest key at least `min_key`.
///
/// Key indices where the right operand is zero are skipped when the operation
/// does not define it.
///
/// ## Errors
///
/// Returns an error if a cache is given and cannot be used.
///
/// ## Panics
///
/// This function will panic if `case.width` is null or greater than 31.
pub fn run_case_with_min_key(
    case: &OperationCase,
    min_key: &BigUint,
    cache: Option<&KeyCache>,
) -> Result<VerificationReport> {
    assert!(case.width > 0 && case.width < 32, "Invalid width");
    let _span = info_span!("verify", case = case.name, width = case.width).entered();
    let num_bits = 2 * case.width;

    let key_set = match cache {
        Some(cache) => cache.calculate_cached(num_bits, min_key, |_| {})?,
        None => KeySet::calculate(num_bits, min_key, |_| {}),
    };
    let a = SuperInt::from_key_set(&key_set, 0, case.width)?;
    let b = SuperInt::from_key_set(&key_set, case.width, case.width)?;
    let result = (case.circuit)(&a, &b);

    let mut checked = 0;
    let mut mismatches = Vec::new();
    for permutation in permute_results_2_inputs(&result, case.width, case.width) {
        let x = int_from_binary(permutation.a, case.width);
        let y = int_from_binary(permutation.b, case.width);
        if y == 0 && !case.allow_zero_rhs {
            continue;
        }
        checked += 1;

        let expected = int_from_binary(
            binary_from_int((case.reference)(x, y), case.width),
            case.width,
        );
        let found = int_from_binary(permutation.result, case.width);
        if found != expected {
            debug!(
                key_index = permutation.key_index,
                "{x} {} {y} = {found}, expected {expected}",
                case.symbol
            );
            mismatches.push(Mismatch {
                key_index: permutation.key_index,
                a: x,
                b: y,
                expected,
                found,
            });
        }
    }

    let bit_errors = bit_errors(&result);
    info!(
        keys = key_set.key_count(),
        checked,
        mismatches = mismatches.len(),
        "{} verified",
        case.name
    );

    Ok(VerificationReport {
        name: case.name,
        width: case.width,
        min_key: min_key.clone(),
        key_count: key_set.key_count(),
        checked,
        mismatches,
        bit_errors,
    })
}

#[must_use]
/// Highest `residue / key` ratio of each bit of `value`, over every key of its key set.
pub fn bit_errors(value: &SuperInt<'_>) -> Vec<f64> {
    let keys = value.key_set().keys();
    value
        .bits()
        .iter()
        .map(|bit| {
            keys.iter()
                .map(|key| error_ratio(bit, key))
                .fold(0.0, f64::max)
        })
        .collect()
}

/// Logs the size and highest error of each bit of `value`.
pub fn report_bits_and_error(value: &SuperInt<'_>) {
    for (index, (bit, error)) in value.bits().iter().zip(bit_errors(value)).enumerate() {
        info!(
            bit = index,
            value_bits = bit.bits(),
            "highest error {:.2}%",
            error * 100.0
        );
    }
}
