//! Output formatting for different formats.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable, colored when the terminal allows it
    #[default]
    Pretty,
    /// JSON output
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an aligned `label: value` line.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:>12}: {}", label.bold(), value);
}
