use clap::{Parser, Subcommand};
use num_bigint::BigUint;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use supercomp::cache::{CacheFormat, KeyCache};
use supercomp::verify::{self, permute_results_2_inputs};
use supercomp::{Error, KeySet, SuperInt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Superpositional integer circuits", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generates a key set and writes it to a key file
    Keygen {
        num_bits: usize,
        min_key: BigUint,
        output: PathBuf,
    },
    /// Adds the two unsigned halves of the packed bits of a key file
    Add { input: PathBuf },
    /// Multiplies the two unsigned halves of the packed bits of a key file
    Multiply { input: PathBuf },
    /// Exhaustively checks every circuit against its plaintext counterpart
    Verify {
        /// Directory used to cache key sets
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Operand width of the integer circuits
        #[arg(short, long, default_value_t = 3)]
        width: usize,
        /// Cache key sets as bytes instead of text
        #[arg(long)]
        binary: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let outcome = match args.command {
        Command::Keygen {
            num_bits,
            min_key,
            output,
        } => keygen(num_bits, &min_key, &output),
        Command::Add { input } => packed_circuit(&input, Circuit::Add),
        Command::Multiply { input } => packed_circuit(&input, Circuit::Multiply),
        Command::Verify {
            cache,
            width,
            binary,
        } => {
            let format = if binary {
                CacheFormat::Binary
            } else {
                CacheFormat::Text
            };
            let cache = cache.map(|dir| KeyCache::new(dir).with_format(format));
            run_verification(width, cache.as_ref())
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(%err, "aborted");
            ExitCode::FAILURE
        }
    }
}

fn keygen(num_bits: usize, min_key: &BigUint, output: &Path) -> Result<bool, Error> {
    if num_bits == 0 || num_bits >= usize::BITS as usize {
        return Err(Error::TooManyBits(num_bits));
    }
    let key_set = KeySet::calculate(num_bits, min_key, |percent| info!("{percent}%"));
    info!(
        keys = key_set.key_count(),
        complexity = key_set.complexity_index(),
        "key set generated"
    );
    if !key_set.verify_packing() {
        return Err(Error::Inconsistent("the packed bits do not decode to their key indices"));
    }
    key_set.write(output)?;
    Ok(true)
}

#[derive(Clone, Copy)]
enum Circuit {
    Add,
    Multiply,
}

/// Splits the packed bits in two unsigned operands and prints the result for every key.
fn packed_circuit(input: &Path, circuit: Circuit) -> Result<bool, Error> {
    let key_set = KeySet::read(input)?;
    let width = key_set.num_bits() / 2;
    if width == 0 || 2 * width != key_set.num_bits() || 2 * width > 32 {
        return Err(Error::Inconsistent(
            "the key file must pack two operands of at most 16 bits",
        ));
    }

    let a = SuperInt::from_key_set(&key_set, 0, width)?;
    let b = SuperInt::from_key_set(&key_set, width, width)?;
    let (result, symbol) = match circuit {
        Circuit::Add => (a.widening_add(&b), "+"),
        Circuit::Multiply => (
            a.zero_extend(2 * width)
                .wrapping_mul(&b.zero_extend(2 * width)),
            "*",
        ),
    };
    verify::report_bits_and_error(&result);

    let mut errors = 0;
    for p in permute_results_2_inputs(&result, width, width) {
        let expected = match circuit {
            Circuit::Add => p.a + p.b,
            Circuit::Multiply => p.a * p.b,
        };
        let status = if p.result == expected {
            "ok"
        } else {
            errors += 1;
            "ERROR"
        };
        println!(
            "[{}] {} {symbol} {} = {} {status}",
            p.key_index, p.a, p.b, p.result
        );
    }

    if errors > 0 {
        error!(errors, keys = key_set.key_count(), "wrong results");
    }
    Ok(errors == 0)
}

fn run_verification(width: usize, cache: Option<&KeyCache>) -> Result<bool, Error> {
    if width == 0 || width > 8 {
        return Err(Error::Inconsistent("the operand width must be between 1 and 8"));
    }

    let mut success = true;
    for case in verify::integer_cases(width)
        .into_iter()
        .chain(verify::fixed_cases())
    {
        let report = verify::run_case(&case, cache)?;
        let status = if report.is_success() { "ok" } else { "FAILED" };
        println!(
            "{:<20} {:>2} bits  {:>6} checked  {:>6} wrong  min key {}  {status}",
            report.name,
            report.width,
            report.checked,
            report.mismatches.len(),
            report.min_key
        );
        success &= report.is_success();
    }
    Ok(success)
}
