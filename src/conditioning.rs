// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Methods to turn random bits into more constrained data types.
//!
//! [`u64_to_f64`] and [`u64_to_f32`] map a uniformly distributed u64 onto an
//! open or half open interval using only shifts and masks.
//! The number of leading zeros of the input becomes the exponent of the
//! result, the bits after the first set bit become the mantissa.
//! Scaling the top 53 bits by 2^-53 only resolves multiples of 2^-53,
//! these conversions resolve magnitudes down to 2^-64.
//! The number of distinct values per binade still shrinks towards zero,
//! [2^-64, 2^-63) holds a single output.
//!
//! The output interval is picked at compile time:
//! - `S` selects the sign: [`Positive`] gives U(0, 1), [`Negative`] gives
//!   U(-1, 0) and [`Signed`] gives U(-1, 1) with the sign taken from the top
//!   input bit.
//! - `INCLUDE_ZERO` allows an all zero magnitude to produce 0.0.
//!   Otherwise 0.0 is never produced.
//! - `EXPONENT_BIAS` scales the interval by 2^EXPONENT_BIAS without a multiply.
//!
//! Integer and float byte order must agree on the target platform.

use core::mem::size_of;

const _: () = assert!(size_of::<f64>() == size_of::<u64>(), "f64 is not 64 bit");
const _: () = assert!(size_of::<f32>() == size_of::<u32>(), "f32 is not 32 bit");

const TOP_BIT: u64 = 0x8000000000000000;

const F64_MANT_DIG: u32 = f64::MANTISSA_DIGITS;
const F64_EXP_SHIFT: u32 = F64_MANT_DIG - 1;
const F32_MANT_DIG: u32 = f32::MANTISSA_DIGITS;
const F32_EXP_SHIFT: u32 = F32_MANT_DIG - 1;

/// Smallest and largest bias that keep every f64 exponent field
/// in the normal range for all sign policies.
pub const F64_MIN_EXPONENT_BIAS: i32 = -957;
pub const F64_MAX_EXPONENT_BIAS: i32 = 1024;
/// Same as [`F64_MIN_EXPONENT_BIAS`] for f32.
pub const F32_MIN_EXPONENT_BIAS: i32 = -61;
pub const F32_MAX_EXPONENT_BIAS: i32 = 128;

/// Which part of the real line a conversion can reach.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SignPolicy {
    Positive,
    Negative,
    Signed,
}

mod sealed {
    pub trait Sealed {}
}

/// Compile time marker for a [`SignPolicy`].
/// Sealed, only [`Positive`], [`Negative`] and [`Signed`] implement it.
pub trait Sign: sealed::Sealed + Copy + Default + 'static {
    const POLICY: SignPolicy;
}

/// Output >= 0.
#[derive(Debug, Copy, Clone, Default)]
pub struct Positive;
/// Output <= 0.
#[derive(Debug, Copy, Clone, Default)]
pub struct Negative;
/// Sign of the output equals the top bit of the input.
#[derive(Debug, Copy, Clone, Default)]
pub struct Signed;

impl sealed::Sealed for Positive {}
impl sealed::Sealed for Negative {}
impl sealed::Sealed for Signed {}

impl Sign for Positive {
    const POLICY: SignPolicy = SignPolicy::Positive;
}
impl Sign for Negative {
    const POLICY: SignPolicy = SignPolicy::Negative;
}
impl Sign for Signed {
    const POLICY: SignPolicy = SignPolicy::Signed;
}

/// Split `bits` into a sign bit (at bit 63) and the magnitude.
/// Signed takes the top bit as sign, leaving a 63 bit magnitude.
#[inline(always)]
fn split_sign<S: Sign>(bits: u64) -> (u64, u64) {
    match S::POLICY {
        SignPolicy::Positive => (0, bits),
        SignPolicy::Negative => (TOP_BIT, bits),
        SignPolicy::Signed => (bits & TOP_BIT, bits & !TOP_BIT),
    }
}

/// Shift out the leading zeros and keep the top `mant_dig` bits.
/// The implicit leading one ends up at bit `mant_dig - 1`.
#[inline(always)]
fn normalize<const INCLUDE_ZERO: bool>(magnitude: u64, clz: u32, mant_dig: u32) -> u64 {
    // A zero magnitude never reaches this point when zero is includable.
    debug_assert!(!INCLUDE_ZERO || magnitude != 0);
    // clz is 64 only for a zero magnitude, where any shift yields zero.
    let shift = if INCLUDE_ZERO { clz } else { clz & 63 };
    (magnitude << shift) >> (64 - mant_dig)
}

/// Exponent field before subtracting the leading zero count.
/// A Signed magnitude has one bit less, so its largest value is twice as
/// close to the top of the interval.
#[inline(always)]
const fn exponent_base(policy: SignPolicy, max_biased_exponent: i32) -> i32 {
    match policy {
        SignPolicy::Signed => max_biased_exponent,
        SignPolicy::Positive | SignPolicy::Negative => max_biased_exponent - 1,
    }
}

/// Convert a random u64 to f64.
///
/// Reachable intervals for `EXPONENT_BIAS == 0`:
/// - `Positive`: (0, 1), or [0, 1) with `INCLUDE_ZERO`
/// - `Negative`: (-1, 0), or (-1, -0.0] with `INCLUDE_ZERO`
/// - `Signed`: (-1, 1) without zero, or with signed zeros when `INCLUDE_ZERO`
///
/// `bits >> 11` scaled by 2^-53 only produces multiples of 2^-53,
/// this function resolves values down to 2^-64.
/// U(-1, 1) via `Signed` also has more distinct values than `2 * U(0, 1) - 1`.
///
/// Builds fail if `EXPONENT_BIAS` is outside
/// [`F64_MIN_EXPONENT_BIAS`]..=[`F64_MAX_EXPONENT_BIAS`].
///
/// ```compile_fail
/// use bitreal::conditioning::{u64_to_f64, Positive};
///
/// let _ = u64_to_f64::<Positive, false, 2000>(1);
/// ```
#[inline]
pub fn u64_to_f64<S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(bits: u64) -> f64 {
    const {
        assert!(
            EXPONENT_BIAS >= F64_MIN_EXPONENT_BIAS && EXPONENT_BIAS <= F64_MAX_EXPONENT_BIAS,
            "exponent bias leaves the normal f64 range"
        )
    };
    let (sign, magnitude) = split_sign::<S>(bits);
    if INCLUDE_ZERO && magnitude == 0 {
        return f64::from_bits(sign);
    }
    let clz = magnitude.leading_zeros();
    let mantissa = normalize::<INCLUDE_ZERO>(magnitude, clz, F64_MANT_DIG);
    let exponent = (exponent_base(S::POLICY, 1023) + EXPONENT_BIAS - clz as i32) as u64;
    let raw = sign | (exponent << F64_EXP_SHIFT) | (mantissa & ((1u64 << F64_EXP_SHIFT) - 1));
    f64::from_bits(raw)
}

/// Convert a random u64 to f32.
/// Same intervals as [`u64_to_f64`], with 24 bits of mantissa.
///
/// Builds fail if `EXPONENT_BIAS` is outside
/// [`F32_MIN_EXPONENT_BIAS`]..=[`F32_MAX_EXPONENT_BIAS`].
///
/// ```compile_fail
/// use bitreal::conditioning::{u64_to_f32, Signed};
///
/// let _ = u64_to_f32::<Signed, true, { -62 }>(1);
/// ```
#[inline]
pub fn u64_to_f32<S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(bits: u64) -> f32 {
    const {
        assert!(
            EXPONENT_BIAS >= F32_MIN_EXPONENT_BIAS && EXPONENT_BIAS <= F32_MAX_EXPONENT_BIAS,
            "exponent bias leaves the normal f32 range"
        )
    };
    let (sign, magnitude) = split_sign::<S>(bits);
    // Move the sign from bit 63 to bit 31.
    let sign = (sign >> 32) as u32;
    if INCLUDE_ZERO && magnitude == 0 {
        return f32::from_bits(sign);
    }
    let clz = magnitude.leading_zeros();
    let mantissa = normalize::<INCLUDE_ZERO>(magnitude, clz, F32_MANT_DIG) as u32;
    let exponent = (exponent_base(S::POLICY, 127) + EXPONENT_BIAS - clz as i32) as u32;
    let raw = sign | (exponent << F32_EXP_SHIFT) | (mantissa & ((1u32 << F32_EXP_SHIFT) - 1));
    f32::from_bits(raw)
}

/// Float types a random u64 can be converted into.
pub trait FromRandomBits: Copy {
    fn from_random_bits<S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(
        bits: u64,
    ) -> Self;
}

impl FromRandomBits for f64 {
    #[inline(always)]
    fn from_random_bits<S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(
        bits: u64,
    ) -> f64 {
        u64_to_f64::<S, INCLUDE_ZERO, EXPONENT_BIAS>(bits)
    }
}

impl FromRandomBits for f32 {
    #[inline(always)]
    fn from_random_bits<S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(
        bits: u64,
    ) -> f32 {
        u64_to_f32::<S, INCLUDE_ZERO, EXPONENT_BIAS>(bits)
    }
}

/// Convert a random u64 to `R`, see [`u64_to_f64`].
///
/// ```
/// use bitreal::conditioning::{u64_to_real, Positive, Signed};
///
/// let unit: f64 = u64_to_real::<f64, Positive, true, 0>(0);
/// assert_eq!(unit, 0.0);
/// let half: f32 = u64_to_real::<f32, Signed, false, { -1 }>(u64::MAX);
/// assert!(half < 0.0 && half > -0.5);
/// ```
#[inline(always)]
pub fn u64_to_real<R: FromRandomBits, S: Sign, const INCLUDE_ZERO: bool, const EXPONENT_BIAS: i32>(
    bits: u64,
) -> R {
    R::from_random_bits::<S, INCLUDE_ZERO, EXPONENT_BIAS>(bits)
}

/// Open interval bounding every output for `sign` and `exponent_bias`.
/// Zero is the closed end when zero is includable.
pub fn output_bounds(sign: SignPolicy, exponent_bias: i32) -> (f64, f64) {
    let limit = 2f64.powi(exponent_bias);
    match sign {
        SignPolicy::Positive => (0.0, limit),
        SignPolicy::Negative => (-limit, 0.0),
        SignPolicy::Signed => (-limit, limit),
    }
}

/// Maps a u64 to the 0..1 range by scaling its top 53 bits.
/// All inputs below 2^11 map to 0.0.
/// Only used as a baseline for comparing output resolution.
pub fn scaled_u64_to_f64(int: u64) -> f64 {
    // 2**-53
    const SCALE: f64 = 1.0 / 9007199254740992.0;
    (int >> 11) as f64 * SCALE
}
