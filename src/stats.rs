// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Collection of methods for statistical analysis of converted samples.

use std::{collections::HashSet, time::Instant};

use crate::{conditioning::SignPolicy, error::HarnessError, rngs::RNG, utils};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Generate 'sample size' u64s using the supplied rng.
///     -> generates 'sample_size' * 8 bytes.
/// Returns the words and the generation speed in bytes per second.
pub fn generate_words(test_rng: &mut impl RNG, sample_size: usize) -> (Vec<u64>, f64) {
    let start = Instant::now();
    let words: Vec<u64> = (0..sample_size).map(|_| test_rng.next()).collect();
    let seconds = start.elapsed().as_secs_f64().max(f64::MIN_POSITIVE);
    (words, (sample_size * 8) as f64 / seconds)
}

/// Apply `convert` to every word.
/// Returns the samples and the conversion speed in words per second.
pub fn convert_words(words: &[u64], convert: fn(u64) -> f64) -> (Vec<f64>, f64) {
    let start = Instant::now();
    let samples: Vec<f64> = words.iter().map(|&w| convert(w)).collect();
    let seconds = start.elapsed().as_secs_f64().max(f64::MIN_POSITIVE);
    (samples, words.len() as f64 / seconds)
}

/// Get p value for given degrees of freedom and chi squared value.
fn chi_squared_p_value(df: u32, chi_squared: f64) -> Result<f64, HarnessError> {
    let chi_squared_dist =
        ChiSquared::new(df as f64).map_err(|e| HarnessError::Statistics(e.to_string()))?;
    Ok(chi_squared_dist.cdf(chi_squared))
}

/// Count samples that are NaN, infinite or outside the open interval
/// (`lower`, `upper`). Zero is only accepted when `include_zero` is set.
pub fn range_violations(samples: &[f64], lower: f64, upper: f64, include_zero: bool) -> usize {
    samples
        .iter()
        .filter(|&&x| {
            if x == 0.0 {
                return !include_zero;
            }
            !x.is_finite() || x <= lower || x >= upper
        })
        .count()
}

/// Sorts samples into `buckets` equally wide bins between `lower` and `upper`
/// and compares the counts to a flat distribution.
/// Samples outside the interval are ignored, see `range_violations`.
/// Returns chi2 statistic, p value
pub fn bucket_uniformity_test(
    samples: &[f64],
    lower: f64,
    upper: f64,
    buckets: usize,
) -> Result<(f64, f64), HarnessError> {
    assert!(buckets > 1);
    assert!(upper > lower);
    let width = (upper - lower) / buckets as f64;
    let mut counts = vec![0usize; buckets];
    let mut in_range = 0usize;
    for &x in samples {
        if !(lower..=upper).contains(&x) {
            continue;
        }
        let bucket = (((x - lower) / width) as usize).min(buckets - 1);
        counts[bucket] += 1;
        in_range += 1;
    }
    if in_range == 0 {
        return Err(HarnessError::EmptySample);
    }
    let expected: f64 = in_range as f64 / buckets as f64;
    let mut chi_squared: f64 = 0.0;
    for value in counts {
        chi_squared += (value as f64 - expected).powi(2) / expected;
    }
    let p = 1.0 - chi_squared_p_value(buckets as u32 - 1, chi_squared)?;
    Ok((chi_squared, p))
}

/// Compares the sample mean with the mean of U(`lower`, `upper`).
/// Returns the sample mean, p value
pub fn mean_test(samples: &[f64], lower: f64, upper: f64) -> Result<(f64, f64), HarnessError> {
    if samples.is_empty() {
        return Err(HarnessError::EmptySample);
    }
    let n = samples.len() as f64;
    let mean: f64 = samples.iter().sum::<f64>() / n;
    let expected_mean = (lower + upper) / 2.0;
    let variance = (upper - lower).powi(2) / 12.0;
    let z = (mean - expected_mean).abs() / (variance / n).sqrt();
    let p: f64 = statrs::function::erf::erfc(z * utils::INV_ROOT2);
    Ok((mean, p))
}

/// Number of samples whose sign contradicts `policy`.
/// For `Signed` the sign bit has to equal the top bit of the word
/// the sample was converted from.
pub fn sign_mismatches(words: &[u64], samples: &[f64], policy: SignPolicy) -> usize {
    assert_eq!(words.len(), samples.len());
    match policy {
        SignPolicy::Positive => samples.iter().filter(|x| x.is_sign_negative()).count(),
        SignPolicy::Negative => samples.iter().filter(|x| x.is_sign_positive()).count(),
        SignPolicy::Signed => words
            .iter()
            .zip(samples)
            .filter(|(w, x)| (**w >> 63) != (x.to_bits() >> 63))
            .count(),
    }
}

/// Number of distinct bit patterns among the samples.
pub fn distinct_count(samples: &[f64]) -> usize {
    samples.iter().map(|x| x.to_bits()).collect::<HashSet<u64>>().len()
}

/// Number of distinct samples with a magnitude below `threshold`.
/// Shows how finely the region next to zero is resolved.
pub fn low_magnitude_distinct(samples: &[f64], threshold: f64) -> usize {
    samples
        .iter()
        .filter(|x| x.abs() < threshold)
        .map(|x| x.to_bits())
        .collect::<HashSet<u64>>()
        .len()
}
