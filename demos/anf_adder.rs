use num_bigint::BigUint;
use supercomp::anf::AnfTerms;
use supercomp::prelude::*;

fn main() {
    // 2-bit + 2-bit adder, as a single AND layer followed by a single XOR layer
    let anf = AnfTerms::from_fn(4, 3, |x| (x & 3) + (x >> 2));
    for output in 0..anf.output_bits() {
        let terms: Vec<String> = anf.terms(output).iter().map(|t| format!("{t:04b}")).collect();
        println!("out{output} = {}", terms.join(" ^ "));
    }
    println!("{} terms, degree {}", anf.term_count(), anf.max_degree());

    // Largest residue of the circuit when nothing is reduced
    let empty = KeySet::empty();
    let probe = anf.build_circuit(&SuperInt::all_ones(4, &empty));
    let min_key = probe.into_bits().into_iter().max().unwrap_or_default();
    println!("Probed minimum key: {min_key}");

    let key_set = KeySet::calculate(4, &min_key.max(BigUint::from(3u32)), |_| {});
    let inputs = SuperInt::from_key_set(&key_set, 0, 4).unwrap();
    let sum = anf.build_circuit(&inputs);
    for i in 0..key_set.key_count() {
        let (a, b) = (i & 3, i >> 2);
        println!("{a} + {b} = {}", sum.decode_binary_at(i));
    }
}
