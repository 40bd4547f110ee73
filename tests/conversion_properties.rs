// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Properties of the conversions over arbitrary words.

use bitreal::conditioning::{output_bounds, scaled_u64_to_f64};
use bitreal::{u64_to_f32, u64_to_f64, u64_to_real, Negative, Positive, SignPolicy, Signed};
use proptest::prelude::*;

/// Open interval check with an optionally allowed zero.
fn within(x: f64, bounds: (f64, f64), include_zero: bool) -> bool {
    if x == 0.0 {
        return include_zero;
    }
    x.is_finite() && x > bounds.0 && x < bounds.1
}

proptest! {
    #[test]
    fn positive_without_zero_is_in_unit_interval(word in 1u64..) {
        let x = u64_to_f64::<Positive, false, 0>(word);
        prop_assert!(x > 0.0 && x < 1.0, "{:#x} -> {}", word, x);
        let y = u64_to_f32::<Positive, false, 0>(word);
        prop_assert!(y > 0.0 && y < 1.0, "{:#x} -> {}", word, y);
    }

    #[test]
    fn positive_with_zero_only_maps_zero_to_zero(word in any::<u64>()) {
        let x = u64_to_f64::<Positive, true, 0>(word);
        prop_assert!(within(x, (0.0, 1.0), true));
        prop_assert_eq!(x == 0.0, word == 0);
    }

    #[test]
    fn negative_without_zero_is_in_negative_unit_interval(word in 1u64..) {
        let x = u64_to_f64::<Negative, false, 0>(word);
        prop_assert!(x > -1.0 && x < 0.0);
        let y = u64_to_f32::<Negative, false, 0>(word);
        prop_assert!(y > -1.0 && y < 0.0);
    }

    #[test]
    fn signed_output_carries_input_sign(word in any::<u64>()) {
        let x = u64_to_f64::<Signed, false, 0>(word);
        prop_assert!(within(x, (-1.0, 1.0), false));
        prop_assert_eq!(x.is_sign_negative(), word >> 63 == 1);
        let y = u64_to_f32::<Signed, false, 0>(word);
        prop_assert!(within(y as f64, (-1.0, 1.0), false));
        prop_assert_eq!(y.is_sign_negative(), word >> 63 == 1);
    }

    #[test]
    fn bias_rescales_exactly(word in any::<u64>()) {
        let base = u64_to_f64::<Positive, false, 0>(word);
        let up = u64_to_f64::<Positive, false, 1>(word);
        let down = u64_to_f64::<Positive, false, { -1 }>(word);
        prop_assert_eq!(up, base * 2.0);
        prop_assert_eq!(down, base / 2.0);
        prop_assert!(within(up, output_bounds(SignPolicy::Positive, 1), false));
        prop_assert!(within(down, output_bounds(SignPolicy::Positive, -1), false));
        let signed = u64_to_f32::<Signed, true, 0>(word);
        prop_assert_eq!(u64_to_f32::<Signed, true, 4>(word), signed * 16.0);
    }

    #[test]
    fn never_nan_or_infinite(word in any::<u64>()) {
        let doubles = [
            u64_to_f64::<Positive, true, 0>(word),
            u64_to_f64::<Positive, false, 4>(word),
            u64_to_f64::<Negative, true, { -1 }>(word),
            u64_to_f64::<Negative, false, 2>(word),
            u64_to_f64::<Signed, true, 3>(word),
            u64_to_f64::<Signed, false, 0>(word),
        ];
        for x in doubles {
            prop_assert!(x.is_finite());
        }
        let floats = [
            u64_to_f32::<Positive, true, 0>(word),
            u64_to_f32::<Positive, false, 4>(word),
            u64_to_f32::<Negative, true, { -1 }>(word),
            u64_to_f32::<Negative, false, 2>(word),
            u64_to_f32::<Signed, true, 3>(word),
            u64_to_f32::<Signed, false, 0>(word),
        ];
        for x in floats {
            prop_assert!(x.is_finite());
        }
    }

    #[test]
    fn conversion_is_deterministic(word in any::<u64>()) {
        let a: f64 = u64_to_real::<f64, Signed, false, 0>(word);
        let b: f64 = u64_to_real::<f64, Signed, false, 0>(word);
        prop_assert_eq!(a.to_bits(), b.to_bits());
        let c: f32 = u64_to_real::<f32, Negative, true, 1>(word);
        let d: f32 = u64_to_real::<f32, Negative, true, 1>(word);
        prop_assert_eq!(c.to_bits(), d.to_bits());
    }

    #[test]
    fn positive_is_monotonic(a in any::<u64>(), b in any::<u64>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(u64_to_f64::<Positive, false, 0>(lo) <= u64_to_f64::<Positive, false, 0>(hi));
        prop_assert!(u64_to_f32::<Positive, true, 0>(lo) <= u64_to_f32::<Positive, true, 0>(hi));
    }

    #[test]
    fn stays_close_to_scaled_value(word in (1u64 << 11)..) {
        // Both keep the top 53 bits of large words, only the rounding differs.
        let x = u64_to_f64::<Positive, false, 0>(word);
        let baseline = scaled_u64_to_f64(word);
        prop_assert!(x >= baseline);
        prop_assert!(x - baseline < 2f64.powi(-53));
    }
}

#[test]
fn small_words_stay_distinct() {
    let converted: Vec<u64> = (1u64..1 << 11)
        .map(|w| u64_to_f64::<Positive, false, 0>(w).to_bits())
        .collect();
    let mut deduped = converted.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), converted.len());
    assert!((1u64..1 << 11).all(|w| scaled_u64_to_f64(w) == 0.0));
}
