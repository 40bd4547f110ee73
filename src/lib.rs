// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Bit level conversion of random u64 words into bounded f32 and f64 values,
//! plus tooling for statistical analysis of the converted output.

pub mod conditioning;
pub mod conversion_testing;
pub mod error;
pub mod rngs;
pub mod stats;
mod strings;
pub mod utils;

pub use conditioning::{
    u64_to_f32, u64_to_f64, u64_to_real, FromRandomBits, Negative, Positive, Sign, SignPolicy,
    Signed,
};
