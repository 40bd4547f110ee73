// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Misc utility functions.

use std::{fs::OpenOptions, io::Write, time::Duration};

pub const INV_ROOT2: f64 = 0.7071067811865475;

/// Print `line` and append it to the file at `file_path`.
/// The file is created if it does not exist.
pub fn write_and_print(line: impl AsRef<str>, file_path: &str) -> std::io::Result<()> {
    let line = line.as_ref();
    println!("{}", line);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    writeln!(file, "{}", line)
}

/// Header line marking the start of a run in the result file.
pub fn timestamp_header() -> String {
    format!(
        "==== {} ====",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Format a number of bytes into a pretty String.
/// e.g. 1048576 is 1 MiB
pub fn format_byte_count(num_bytes: usize) -> String {
    // 2**30 = 1073741824
    if num_bytes > 1073741824 {
        format!("{:.2} GiB", (num_bytes as f64 / 1073741824.0))
    // 2**20 = 1048576
    } else if num_bytes > 1048576 {
        format!("{:.2} MiB", (num_bytes as f64 / 1048576.0))
    // 2**10 = 1024
    } else if num_bytes > 1024 {
        format!("{:.2} KiB", (num_bytes as f64 / 1024.0))
    } else {
        format!("{:.2} B", num_bytes as f64)
    }
}

/// Fixed width elapsed time, e.g. "  12.345 ms".
pub fn format_elapsed_time(elapsed: Duration) -> String {
    let micros = elapsed.as_secs_f64() * 1e6;
    if micros >= 1e6 {
        format!("{:>8.3} s ", micros / 1e6)
    } else if micros >= 1e3 {
        format!("{:>8.3} ms", micros / 1e3)
    } else {
        format!("{:>8.3} us", micros)
    }
}
