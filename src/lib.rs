//! A library for superpositional computation on integers.
//!
//! # Principle
//!
//! A `KeySet` packs `n` input bits into a single big integer per bit, using `2^n`
//! pairwise coprime odd keys. Reduced modulo the key at index `i` (then modulo 2),
//! packed bit `b` decodes to bit `b` of `i`. In other words, key `i` sees the input
//! assignment whose binary encoding is `i`.
//!
//! XOR is an addition and AND a multiplication of plain big integers, so a circuit
//! built from these gates evaluates every input assignment at once. The result is
//! read back by decoding it under each key.
//!
//! There is no secret in any of this. Residues grow with every gate: once the residue
//! of a bit reaches its key, the bit decodes wrongly. Larger keys leave more room,
//! at the price of larger numbers.
//!
//! # Examples
//!
//! ## Basic usage
//!
//! ```
//! use num_bigint::BigUint;
//! use supercomp::{KeySet, SuperInt};
//!
//! // 4 packed bits: two 2-bit operands
//! let key_set = KeySet::calculate(4, &BigUint::from(11u32), |_| {});
//! let a = SuperInt::from_key_set(&key_set, 0, 2).unwrap().zero_extend(3);
//! let b = SuperInt::from_key_set(&key_set, 2, 2).unwrap().zero_extend(3);
//!
//! // 16 additions in one
//! let sum = a.wrapping_add(&b);
//! for i in 0..key_set.key_count() {
//!     assert_eq!(sum.decode_binary_at(i), (i as u64 & 3) + (i as u64 >> 2));
//! }
//! ```
//!
//! ## Context
//!
//! A `Context` holds the parameters of a key set and the key set itself once generated.
//!
//! ```
//! use supercomp::{Context, Parameters, SuperInt};
//!
//! let mut context = Context::new(Parameters::new(2, 5u32));
//! context.generate_key_set();
//! let key_set = context.key_set().unwrap();
//!
//! let x = SuperInt::from_key_set(key_set, 0, 2).unwrap();
//! assert_eq!(x.decode_at(3), -1);
//! ```
//!
//! ## Choosing the keys
//!
//! Running a circuit on all-ones inputs with an empty key set, which never reduces,
//! gives an idea of the largest residue it produces. It is only a hint.
//!
//! ```
//! use supercomp::verify::{integer_cases, probe_min_key, run_case};
//!
//! let case = integer_cases(2)[2];
//! let report = run_case(&case, None).unwrap();
//! assert_eq!(report.min_key, probe_min_key(&case));
//! assert!(report.is_success());
//! ```
//!
//! ## Save keys
//!
//! Key sets are slow to generate for large `n`. They can be stored as text or
//! as bytes, and `cache::KeyCache` does so transparently.
//!
//! ```no_run
//! use num_bigint::BigUint;
//! use supercomp::cache::{CacheFormat, KeyCache};
//!
//! let cache = KeyCache::new("keys").with_format(CacheFormat::Binary);
//! let key_set = cache
//!     .calculate_cached(12, &BigUint::from(1000u32), |p| println!("{p}%"))
//!     .unwrap();
//! ```

pub mod anf;
pub mod cache;
mod context;
mod error;
pub mod euclid;
pub mod gates;
mod keyfile;
pub mod keyset;
pub mod operations;
pub mod prelude;
pub mod superfixed;
pub mod superint;
pub mod verify;

pub mod impls {
    //! Circuits on superpositional numbers.

    pub mod numbers;
}

pub use context::{Context, Parameters};
pub use error::{Error, Result};
pub use keyset::KeySet;
pub use superfixed::SuperFixed;
pub use superint::SuperInt;
