// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Statistical test runner for the random word to float conversions.

use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use bitreal::conversion_testing::{self, Converter, ConverterSpec, Precision};
use bitreal::rngs::{self, RNG};
use bitreal::{utils, SignPolicy};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum PrecisionArg {
    F32,
    F64,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum SignArg {
    Positive,
    Negative,
    Signed,
}

/// Source of the raw words.
#[derive(Debug, Copy, Clone, ValueEnum)]
enum EngineArg {
    Reference,
    Mmix,
    Xorshift,
    OnlyZero,
    OnlyOne,
    BitWalk,
    Counter,
}

#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Words generated per seed, as a power of two
    #[arg(short = 'n', long, default_value_t = 22)]
    samples_exp: u32,

    /// Output type of the conversion
    #[arg(short, long, value_enum, default_value_t = PrecisionArg::F64)]
    precision: PrecisionArg,

    /// Reachable half of the real line
    #[arg(short, long, value_enum, default_value_t = SignArg::Positive)]
    sign: SignArg,

    /// Allow the conversion to return zero
    #[arg(short = 'z', long)]
    include_zero: bool,

    /// Scale the output interval by 2^bias
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    bias: i32,

    /// Word source
    #[arg(short, long, value_enum, default_value_t = EngineArg::Reference)]
    engine: EngineArg,

    /// Seed to test with, may be repeated
    #[arg(long = "seed", default_values_t = [0u64, 1, 2, 3])]
    seeds: Vec<u64>,

    /// File the results are appended to
    #[arg(short, long, default_value = "rslt.txt")]
    output: String,

    /// Test every configuration of the default matrix
    #[arg(short, long)]
    matrix: bool,
}

impl Cli {
    fn converter_specs(&self) -> Vec<ConverterSpec> {
        if self.matrix {
            return conversion_testing::default_matrix();
        }
        vec![ConverterSpec {
            precision: match self.precision {
                PrecisionArg::F32 => Precision::F32,
                PrecisionArg::F64 => Precision::F64,
            },
            sign: match self.sign {
                SignArg::Positive => SignPolicy::Positive,
                SignArg::Negative => SignPolicy::Negative,
                SignArg::Signed => SignPolicy::Signed,
            },
            include_zero: self.include_zero,
            exponent_bias: self.bias,
        }]
    }
}

/// Run the test suite for every spec on words from `R`.
fn run_with<R: RNG>(cli: &Cli, specs: &[ConverterSpec]) -> Result<bool> {
    let mut test_rng = R::new(cli.seeds[0]);
    let mut all_passed = true;
    for &spec in specs {
        let converter = Converter::select(spec)?;
        all_passed &= conversion_testing::test_suite(
            &mut test_rng,
            &converter,
            1usize << cli.samples_exp,
            &cli.seeds,
            &cli.output,
        )?;
    }
    Ok(all_passed)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .init();

    let cli = Cli::parse();
    ensure!(cli.samples_exp <= 32, "samples-exp must be at most 32");
    ensure!(!cli.seeds.is_empty(), "at least one seed is required");

    let start = std::time::Instant::now();
    let specs = cli.converter_specs();
    info!(
        "{} configuration(s), engine {:?}, results in {}",
        specs.len(),
        cli.engine,
        cli.output
    );
    utils::write_and_print(utils::timestamp_header(), &cli.output)?;

    let all_passed = match cli.engine {
        EngineArg::Reference => run_with::<rngs::ReferenceRand>(&cli, &specs)?,
        EngineArg::Mmix => run_with::<rngs::lcg::Mmix>(&cli, &specs)?,
        EngineArg::Xorshift => run_with::<rngs::xorshift::XorShift64Star>(&cli, &specs)?,
        EngineArg::OnlyZero => run_with::<rngs::testgens::OnlyZero>(&cli, &specs)?,
        EngineArg::OnlyOne => run_with::<rngs::testgens::OnlyOne>(&cli, &specs)?,
        EngineArg::BitWalk => run_with::<rngs::testgens::SingleBitWalk>(&cli, &specs)?,
        EngineArg::Counter => run_with::<rngs::testgens::Counter>(&cli, &specs)?,
    };
    if all_passed {
        info!("all configurations passed");
    } else {
        warn!("some configurations failed, see {}", cli.output);
    }
    println!("Full program runtime: {:?}", start.elapsed());
    Ok(())
}
