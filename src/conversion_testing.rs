// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Statistical testing of a conversions output.
//!
//! The conversions take their policies as generic parameters. For testing
//! they are chosen at runtime, so every supported combination is
//! instantiated up front and selected as a plain `fn(u64) -> f64`.

use std::{ops::Mul, time::Duration, time::Instant};

use log::{debug, info, warn};

use crate::conditioning::{
    self, u64_to_real, FromRandomBits, Negative, Positive, Sign, SignPolicy, Signed,
};
use crate::{error::HarnessError, rngs::RNG, stats, strings, utils};

const P_LOG_STAT_LIMIT: f64 = 3.0;
const P_LOG_STAT_MARGINAL: f64 = 2.0;
const UNIFORMITY_BUCKETS: usize = 256;
/// Magnitudes below 2^-20 of the interval limit count as close to zero
/// for the resolution report.
const LOW_MAGNITUDE_EXPONENT: i32 = -20;

/// Smallest and largest exponent bias selectable at runtime.
pub const MIN_SELECTABLE_BIAS: i32 = -1;
pub const MAX_SELECTABLE_BIAS: i32 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    F32,
    F64,
}

/// Runtime description of one instantiation of the conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConverterSpec {
    pub precision: Precision,
    pub sign: SignPolicy,
    pub include_zero: bool,
    pub exponent_bias: i32,
}

impl ConverterSpec {
    /// Open interval all outputs must fall into.
    pub fn bounds(&self) -> (f64, f64) {
        conditioning::output_bounds(self.sign, self.exponent_bias)
    }

    pub fn name(&self) -> String {
        format!(
            "{:?}/{:?}/{}/bias {}",
            self.precision,
            self.sign,
            if self.include_zero {
                "with zero"
            } else {
                "without zero"
            },
            self.exponent_bias
        )
    }
}

/// A monomorphized conversion, widened to f64.
#[derive(Debug, Copy, Clone)]
pub struct Converter {
    pub spec: ConverterSpec,
    pub convert: fn(u64) -> f64,
}

fn widened<R, S, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(bits: u64) -> f64
where
    R: FromRandomBits + Into<f64>,
    S: Sign,
{
    u64_to_real::<R, S, INCLUDE_ZERO, EXPONENT_BIAS>(bits).into()
}

fn with_bias<R, S, const INCLUDE_ZERO: bool>(exponent_bias: i32) -> Option<fn(u64) -> f64>
where
    R: FromRandomBits + Into<f64>,
    S: Sign,
{
    let convert: fn(u64) -> f64 = match exponent_bias {
        -1 => widened::<R, S, INCLUDE_ZERO, { -1 }>,
        0 => widened::<R, S, INCLUDE_ZERO, 0>,
        1 => widened::<R, S, INCLUDE_ZERO, 1>,
        2 => widened::<R, S, INCLUDE_ZERO, 2>,
        3 => widened::<R, S, INCLUDE_ZERO, 3>,
        4 => widened::<R, S, INCLUDE_ZERO, 4>,
        _ => return None,
    };
    Some(convert)
}

fn with_zero<R, S>(include_zero: bool, exponent_bias: i32) -> Option<fn(u64) -> f64>
where
    R: FromRandomBits + Into<f64>,
    S: Sign,
{
    if include_zero {
        with_bias::<R, S, true>(exponent_bias)
    } else {
        with_bias::<R, S, false>(exponent_bias)
    }
}

fn with_sign<R>(sign: SignPolicy, include_zero: bool, exponent_bias: i32) -> Option<fn(u64) -> f64>
where
    R: FromRandomBits + Into<f64>,
{
    match sign {
        SignPolicy::Positive => with_zero::<R, Positive>(include_zero, exponent_bias),
        SignPolicy::Negative => with_zero::<R, Negative>(include_zero, exponent_bias),
        SignPolicy::Signed => with_zero::<R, Signed>(include_zero, exponent_bias),
    }
}

impl Converter {
    /// Pick the instantiation matching `spec`.
    pub fn select(spec: ConverterSpec) -> Result<Converter, HarnessError> {
        let convert = match spec.precision {
            Precision::F64 => with_sign::<f64>(spec.sign, spec.include_zero, spec.exponent_bias),
            Precision::F32 => with_sign::<f32>(spec.sign, spec.include_zero, spec.exponent_bias),
        }
        .ok_or(HarnessError::UnsupportedBias {
            bias: spec.exponent_bias,
            min: MIN_SELECTABLE_BIAS,
            max: MAX_SELECTABLE_BIAS,
        })?;
        Ok(Converter { spec, convert })
    }
}

/// Configurations covered when testing everything at once.
pub fn default_matrix() -> Vec<ConverterSpec> {
    let mut specs = vec![];
    for precision in [Precision::F64, Precision::F32] {
        for (sign, include_zero, exponent_bias) in [
            (SignPolicy::Positive, true, 0),
            (SignPolicy::Positive, false, 0),
            (SignPolicy::Negative, false, 0),
            (SignPolicy::Signed, false, 0),
            (SignPolicy::Positive, false, 1),
            (SignPolicy::Positive, false, -1),
        ] {
            specs.push(ConverterSpec {
                precision,
                sign,
                include_zero,
                exponent_bias,
            });
        }
    }
    specs
}

/// Data every check runs on.
struct CheckInput<'a> {
    words: &'a [u64],
    samples: &'a [f64],
    spec: &'a ConverterSpec,
}

#[derive(Debug, Copy, Clone)]
enum Outcome {
    /// Statistical test with a p value.
    Statistic { p: f64 },
    /// Exact check, passes only without violations.
    Count { violations: usize },
}

const TEST_F_POINTERS: [fn(&CheckInput) -> Result<Outcome, HarnessError>; 4] =
    [range_check, sign_check, bucket_check, mean_check];

fn range_check(input: &CheckInput) -> Result<Outcome, HarnessError> {
    let (lower, upper) = input.spec.bounds();
    let violations =
        stats::range_violations(input.samples, lower, upper, input.spec.include_zero);
    Ok(Outcome::Count { violations })
}

fn sign_check(input: &CheckInput) -> Result<Outcome, HarnessError> {
    let violations = stats::sign_mismatches(input.words, input.samples, input.spec.sign);
    Ok(Outcome::Count { violations })
}

fn bucket_check(input: &CheckInput) -> Result<Outcome, HarnessError> {
    let (lower, upper) = input.spec.bounds();
    let (_, p) = stats::bucket_uniformity_test(input.samples, lower, upper, UNIFORMITY_BUCKETS)?;
    Ok(Outcome::Statistic { p })
}

fn mean_check(input: &CheckInput) -> Result<Outcome, HarnessError> {
    let (lower, upper) = input.spec.bounds();
    let (_, p) = stats::mean_test(input.samples, lower, upper)?;
    Ok(Outcome::Statistic { p })
}

#[derive(Debug, Copy, Clone)]
struct TestResult {
    test_id: usize,
    outcome: Outcome,
    time_used: Duration,
}

impl TestResult {
    pub fn logstat(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Statistic { p } => Some(p_log_stat(p)),
            Outcome::Count { .. } => None,
        }
    }
    pub fn passed(&self) -> bool {
        match self.outcome {
            Outcome::Statistic { p } => p_log_stat(p) < P_LOG_STAT_LIMIT,
            Outcome::Count { violations } => violations == 0,
        }
    }
    fn verdict(&self) -> &'static str {
        match self.logstat() {
            _ if !self.passed() => strings::FAIL_STR,
            Some(pls) if pls >= P_LOG_STAT_MARGINAL => strings::MARGINAL_STR,
            _ => strings::PASS_STR,
        }
    }
    pub fn format(&self) -> String {
        let detail = match self.outcome {
            Outcome::Statistic { p } => format!("p: {:.6}     pls: {:.4}", p, p_log_stat(p)),
            Outcome::Count { violations } => format!("violations: {}", violations),
        };
        format!(
            "{:<10}: Time: {}     {}   - {}",
            strings::TEST_NAMES[self.test_id],
            utils::format_elapsed_time(self.time_used),
            detail,
            self.verdict()
        )
    }
}

/// Logarithmic quantity to specify how close to 1.0 or 0.0 a p-value is.
/// Has a range of 0-9.9999.
/// -0.2 * (log2(min(p, 1-p)) - 1) clamped to 9.9999
fn p_log_stat(p: f64) -> f64 {
    (p.min(1.0 - p).log2() - 1.0).mul(-0.2).min(9.9999)
}

/// Run the check located at `TEST_F_POINTERS[test_id]`
/// and return the result and excution time.
fn run_single_test(input: &CheckInput, test_id: usize) -> Result<TestResult, HarnessError> {
    let start: Instant = Instant::now();
    let outcome = TEST_F_POINTERS[test_id](input)?;
    let time_used: Duration = start.elapsed();
    Ok(TestResult {
        test_id,
        outcome,
        time_used,
    })
}

/// Measure word generation and conversion speed.
fn speed_test(
    test_rng: &mut impl RNG,
    converter: &Converter,
    sample_size: usize,
    seed: u64,
) -> String {
    test_rng.reseed(seed);
    let (words, generation_speed) = stats::generate_words(test_rng, sample_size);
    let (_, conversion_speed) = stats::convert_words(&words, converter.convert);
    format!(
        "Generated {} of words. (Speed: {}/s)  Converted at {:.2} M/s ({:.4} ns/word)",
        utils::format_byte_count(sample_size * 8),
        utils::format_byte_count(generation_speed as usize),
        conversion_speed / 1e6,
        1e9 / conversion_speed
    )
}

/// Scaled baseline with the same sign handling as `sign`.
/// For `Signed` the top bit is the sign and the remaining 63 bits
/// are scaled to [0, 1), so both sides draw on the same magnitude bits.
fn scaled_baseline(words: &[u64], sign: SignPolicy) -> Vec<f64> {
    words
        .iter()
        .map(|&w| match sign {
            SignPolicy::Positive => conditioning::scaled_u64_to_f64(w),
            SignPolicy::Negative => -conditioning::scaled_u64_to_f64(w),
            SignPolicy::Signed => {
                let magnitude = conditioning::scaled_u64_to_f64(w << 1);
                if w >> 63 == 1 {
                    -magnitude
                } else {
                    magnitude
                }
            }
        })
        .collect()
}

/// Compare the number of distinct outputs with the scaled baseline on the same words.
fn resolution_report(words: &[u64], samples: &[f64], spec: &ConverterSpec) -> String {
    let (lower, upper) = spec.bounds();
    let magnitude_limit = upper.max(-lower);
    let baseline = scaled_baseline(words, spec.sign);
    let low = 2f64.powi(LOW_MAGNITUDE_EXPONENT);
    format!(
        "Distinct outputs: {} (scaled baseline: {})   magnitude below 2^{} of limit: {} (scaled baseline: {})",
        stats::distinct_count(samples),
        stats::distinct_count(&baseline),
        LOW_MAGNITUDE_EXPONENT,
        stats::low_magnitude_distinct(samples, magnitude_limit * low),
        stats::low_magnitude_distinct(&baseline, low),
    )
}

/// Peform all checks listed in `TEST_F_POINTERS` for one seed
/// and add the results to `test_results`.
fn test_single_seed(
    test_rng: &mut impl RNG,
    converter: &Converter,
    sample_size: usize,
    seed: u64,
    test_results: &mut Vec<TestResult>,
    result_file_path: &str,
) -> Result<(Vec<u64>, Vec<f64>), HarnessError> {
    test_rng.reseed(seed);
    utils::write_and_print(
        format!("Testing for seed: {:#018x}", seed),
        result_file_path,
    )?;
    let (words, _) = stats::generate_words(test_rng, sample_size);
    let (samples, _) = stats::convert_words(&words, converter.convert);
    debug!("seed {:#018x}: converted {} words", seed, words.len());
    let input = CheckInput {
        words: &words,
        samples: &samples,
        spec: &converter.spec,
    };
    for test_id in 0..TEST_F_POINTERS.len() {
        let rslt = run_single_test(&input, test_id)?;
        if !rslt.passed() {
            warn!(
                "{} failed {} for seed {:#018x}",
                converter.spec.name(),
                strings::TEST_NAMES[test_id],
                seed
            );
        }
        utils::write_and_print(rslt.format(), result_file_path)?;
        test_results.push(rslt);
    }
    Ok((words, samples))
}

/// Format test results and a histogram of the p log stats.
fn format_test_results_summary(test_results: &[TestResult]) -> String {
    const P_LOG_STAT_BINS: usize = 10;
    let mut p_logstat_bins = [0u32; P_LOG_STAT_BINS];
    let mut passed_tests = 0usize;
    for rslt in test_results {
        if let Some(pls) = rslt.logstat() {
            p_logstat_bins[(pls.floor() as usize).min(P_LOG_STAT_BINS - 1)] += 1;
        }
        if rslt.passed() {
            passed_tests += 1;
        }
    }
    let logstat_summary: String = p_logstat_bins
        .iter()
        .enumerate()
        .map(|(bin, &value)| {
            if bin == P_LOG_STAT_BINS - 1 {
                format!("{:>2}+ : {:04}", bin, value)
            } else {
                format!("{:>2} : {:04}|", bin, value)
            }
        })
        .collect::<Vec<String>>()
        .join("");
    format!(
        "P log stats: \n{}\nOverall result: {}          ( {} / {} passed)",
        logstat_summary,
        if passed_tests == test_results.len() {
            strings::PASS_STR
        } else {
            strings::FAIL_STR
        },
        passed_tests,
        test_results.len()
    )
}

/// Test `converter` on words from `test_rng`, once per seed.
/// Results are printed and appended to `result_file_path`.
/// Returns whether every check passed.
pub fn test_suite(
    test_rng: &mut impl RNG,
    converter: &Converter,
    sample_size: usize,
    seeds: &[u64],
    result_file_path: &str,
) -> Result<bool, HarnessError> {
    assert!(!seeds.is_empty());
    let full_start = Instant::now();
    let name = converter.spec.name();
    info!("testing {} with {} words per seed", name, sample_size);
    utils::write_and_print(format!("\nTesting: {}", name), result_file_path)?;
    utils::write_and_print(
        speed_test(test_rng, converter, sample_size, seeds[0]),
        result_file_path,
    )?;
    let mut test_results: Vec<TestResult> = vec![];
    let mut last = (vec![], vec![]);
    for &seed in seeds.iter() {
        last = test_single_seed(
            test_rng,
            converter,
            sample_size,
            seed,
            &mut test_results,
            result_file_path,
        )?;
    }
    utils::write_and_print(
        resolution_report(&last.0, &last.1, &converter.spec),
        result_file_path,
    )?;
    utils::write_and_print(format!("\nSummary for: {}", name), result_file_path)?;
    utils::write_and_print(format_test_results_summary(&test_results), result_file_path)?;
    utils::write_and_print(
        format!("Total runtime: {:?}", full_start.elapsed()),
        result_file_path,
    )?;
    Ok(test_results.iter().all(TestResult::passed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rngs::{testgens::OnlyZero, ReferenceRand};

    fn spec(precision: Precision, sign: SignPolicy, include_zero: bool, bias: i32) -> ConverterSpec {
        ConverterSpec {
            precision,
            sign,
            include_zero,
            exponent_bias: bias,
        }
    }

    #[test]
    fn selected_converter_matches_direct_call() {
        let c = Converter::select(spec(Precision::F64, SignPolicy::Signed, false, 2)).unwrap();
        let word = 0xfedc_ba98_7654_3210;
        assert_eq!(
            (c.convert)(word),
            conditioning::u64_to_f64::<Signed, false, 2>(word)
        );
        let c = Converter::select(spec(Precision::F32, SignPolicy::Negative, true, -1)).unwrap();
        assert_eq!(
            (c.convert)(word),
            conditioning::u64_to_f32::<Negative, true, { -1 }>(word) as f64
        );
    }

    #[test]
    fn unsupported_bias_is_rejected() {
        let err = Converter::select(spec(Precision::F64, SignPolicy::Positive, false, 9));
        assert!(matches!(
            err,
            Err(HarnessError::UnsupportedBias { bias: 9, .. })
        ));
    }

    #[test]
    fn every_matrix_entry_is_selectable() {
        let matrix = default_matrix();
        assert_eq!(matrix.len(), 12);
        for s in matrix {
            assert!(Converter::select(s).is_ok(), "{}", s.name());
        }
    }

    #[test]
    fn p_log_stat_range() {
        assert!(p_log_stat(0.5) < 1.0);
        assert_eq!(p_log_stat(0.0), 9.9999);
        assert!(p_log_stat(1e-9) > P_LOG_STAT_LIMIT);
    }

    fn run_checks(words: &[u64], converter: &Converter) -> Vec<TestResult> {
        let samples: Vec<f64> = words.iter().map(|&w| (converter.convert)(w)).collect();
        let input = CheckInput {
            words,
            samples: &samples,
            spec: &converter.spec,
        };
        (0..TEST_F_POINTERS.len())
            .map(|id| run_single_test(&input, id).unwrap())
            .collect()
    }

    #[test]
    fn random_words_pass_exact_checks() {
        let mut rng = ReferenceRand::new(3);
        let (words, _) = stats::generate_words(&mut rng, 1 << 14);
        for s in default_matrix() {
            let converter = Converter::select(s).unwrap();
            let results = run_checks(&words, &converter);
            assert!(results[0].passed(), "range: {}", s.name());
            assert!(results[1].passed(), "sign: {}", s.name());
        }
    }

    #[test]
    fn constant_words_fail_statistics_but_stay_in_range() {
        let mut rng = OnlyZero {};
        let (words, _) = stats::generate_words(&mut rng, 1024);
        let converter = Converter::select(spec(Precision::F64, SignPolicy::Positive, false, 0)).unwrap();
        let results = run_checks(&words, &converter);
        assert!(results[0].passed());
        assert!(!results[2].passed());
        assert!(!results[3].passed());
    }

    #[test]
    fn summary_counts_passes() {
        let results = [
            TestResult {
                test_id: 0,
                outcome: Outcome::Count { violations: 0 },
                time_used: Duration::ZERO,
            },
            TestResult {
                test_id: 2,
                outcome: Outcome::Statistic { p: 1e-12 },
                time_used: Duration::ZERO,
            },
        ];
        let summary = format_test_results_summary(&results);
        assert!(summary.contains("( 1 / 2 passed)"));
        assert!(summary.contains(strings::FAIL_STR));
        assert!(results[1].format().contains(strings::FAIL_STR));
    }

    #[test]
    fn signed_baseline_uses_sign_and_magnitude() {
        let top = 0x8000000000000000u64;
        let words = [1 << 62, top | (1 << 62), top | 1, 1];
        let baseline = scaled_baseline(&words, SignPolicy::Signed);
        assert_eq!(baseline[0], 0.5);
        assert_eq!(baseline[1], -0.5);
        assert!(baseline[2] == 0.0 && baseline[2].is_sign_negative());
        assert!(baseline[3] == 0.0 && baseline[3].is_sign_positive());
        assert_eq!(scaled_baseline(&[1 << 63], SignPolicy::Negative), vec![-0.5]);
    }

    #[test]
    fn signed_resolution_counts_both_signs_on_both_sides() {
        let top = 0x8000000000000000u64;
        // Small magnitudes with and without the sign bit.
        let words: Vec<u64> = (1..=8u64).flat_map(|w| [w, top | w]).collect();
        let converter = Converter::select(spec(Precision::F64, SignPolicy::Signed, false, 0)).unwrap();
        let samples: Vec<f64> = words.iter().map(|&w| (converter.convert)(w)).collect();
        let report = resolution_report(&words, &samples, &converter.spec);
        // Baseline collapses to +-0.0, the conversion keeps all 16 values.
        assert!(report.contains("of limit: 16 (scaled baseline: 2)"), "{}", report);
    }

    #[test]
    fn suite_writes_every_report_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rslt.txt");
        let path = path.to_str().unwrap();
        let mut rng = ReferenceRand::new(0);
        let converter = Converter::select(spec(Precision::F64, SignPolicy::Positive, false, 0)).unwrap();
        utils::write_and_print(utils::timestamp_header(), path).unwrap();
        let passed = test_suite(&mut rng, &converter, 1 << 12, &[0, 1], path).unwrap();
        assert!(passed);

        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("==== "));
        assert!(written.contains("Testing: F64/Positive/without zero/bias 0"));
        assert!(written.contains("Generated "));
        assert!(written.contains("Testing for seed: 0x0000000000000001"));
        assert!(written.contains("Distinct outputs: "));
        assert!(written.contains("Summary for: "));
        assert!(written.contains("( 8 / 8 passed)"));
        assert_eq!(written.matches("Range     : ").count(), 2);
    }

    #[test]
    fn suite_reports_failure_for_constant_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rslt.txt");
        let mut rng = OnlyZero {};
        let converter = Converter::select(spec(Precision::F32, SignPolicy::Signed, true, 1)).unwrap();
        let passed =
            test_suite(&mut rng, &converter, 256, &[0], path.to_str().unwrap()).unwrap();
        assert!(!passed);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(strings::FAIL_STR));
    }
}
