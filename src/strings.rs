// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! User interaction strings are stored here.

pub const FAIL_STR: &str = "FAILED!!";
pub const MARGINAL_STR: &str = "MARGINAL!";
pub const PASS_STR: &str = "PASSED";

pub const TEST_NAMES: [&str; 4] = ["Range", "Sign", "Buckets", "Mean"];
