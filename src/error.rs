// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Errors of the statistical harness. The conversions themselves cannot fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("exponent bias {bias} has no prebuilt converter (supported: {min}..={max})")]
    UnsupportedBias { bias: i32, min: i32, max: i32 },

    #[error("need at least one sample")]
    EmptySample,

    #[error("statistics error: {0}")]
    Statistics(String),

    #[error("result file error: {0}")]
    Io(#[from] std::io::Error),
}
