use std::time::Instant;

use supercomp::prelude::*;
use supercomp::verify::permute_results_2_inputs;

const WIDTH: usize = 4;

fn benchmark<T, F>(closure: F, name: &str) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = closure();
    println!("Time needed to {}: {:?}", name, start.elapsed());
    result
}

fn main() {
    // Two 4-bit operands, every one of the 256 pairs at once
    let params = Parameters::new(2 * WIDTH, 1_000u32);
    let mut context = Context::new(params);
    benchmark(|| context.generate_key_set(), "generate the key set");
    let key_set = context.key_set().unwrap();

    let a = SuperInt::from_key_set(key_set, 0, WIDTH).unwrap();
    let b = SuperInt::from_key_set(key_set, WIDTH, WIDTH).unwrap();
    let sum = benchmark(|| a.widening_add(&b), "add");

    let results = permute_results_2_inputs(&sum, WIDTH, WIDTH);
    let wrong = results.iter().filter(|p| p.result != p.a + p.b).count();
    for p in results.iter().take(8) {
        println!("{} + {} = {}", p.a, p.b, p.result);
    }
    println!("{} wrong results out of {}", wrong, results.len());
    assert_eq!(wrong, 0);
}
