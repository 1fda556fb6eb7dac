use supercomp::impls::numbers::HomomorphicFixedMultiplication;
use supercomp::prelude::*;
use supercomp::verify::{probe_min_key, OperationCase};

fn main() {
    // 3 integer bits and 1 fraction bit per operand
    let case = OperationCase::new::<HomomorphicFixedMultiplication<1>>("Fixed_Multiply_3_1", 4);
    let min_key = probe_min_key(&case);
    println!("Probed minimum key: {min_key}");

    let key_set = KeySet::calculate(8, &min_key, |p| {
        if p % 25 == 0 {
            println!("{p}%");
        }
    });
    let a = SuperFixed::from_key_set(&key_set, 0, 3, 1).unwrap();
    let b = SuperFixed::from_key_set(&key_set, 4, 3, 1).unwrap();

    let product = &a * &b;
    let sum = &a + &b;

    for i in (0..key_set.key_count()).step_by(17) {
        println!(
            "{:>5} * {:>5} = {:>5}    {:>5} + {:>5} = {:>5}",
            a.decode_f64_at(i),
            b.decode_f64_at(i),
            product.decode_f64_at(i),
            a.decode_f64_at(i),
            b.decode_f64_at(i),
            sum.decode_f64_at(i),
        );
    }

    let worst = key_set
        .keys()
        .iter()
        .map(|key| product.as_int().max_error(key))
        .fold(0.0, f64::max);
    println!("Highest error of the product: {:.2}%", worst * 100.0);
}
