//! Command-line interface definitions for dupesweep.
//!
//! All arguments are declared with the clap derive API. Options that can
//! also come from the configuration file are `Option`s here, so an absent
//! flag leaves the lower configuration layers in effect.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates below the current directory
//! dupesweep
//!
//! # Delete copies found under ./backup, keeping at least one per group
//! dupesweep ~/photos ./backup -d ./backup
//!
//! # See what would happen first
//! dupesweep ~/photos ./backup -d ./backup --dry-run
//!
//! # Hash only the first 4 KiB of each file (approximate)
//! find . -name '*.iso' | dupesweep --stdin --fast --prefix-bytes 4096
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Find duplicate files by size and content, and optionally delete copies.
///
/// Files are grouped by size first; only files sharing a size are hashed
/// (BLAKE3). Files under a --delete-from prefix are removed, but a group
/// always keeps at least one member.
#[derive(Debug, Parser)]
#[command(name = "dupesweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories (or files) to scan
    #[arg(value_name = "PATHS", default_value = ".", conflicts_with = "stdin")]
    pub paths: Vec<PathBuf>,

    /// Read newline-delimited file paths from standard input instead of scanning
    #[arg(long)]
    pub stdin: bool,

    /// Delete duplicates located under this path (repeatable)
    #[arg(short = 'd', long = "delete-from", value_name = "PATH")]
    pub delete_from: Vec<PathBuf>,

    /// Only report what would be deleted
    #[arg(long, visible_alias = "dry")]
    pub dry_run: bool,

    /// Move deleted files to the system trash instead of removing them
    #[arg(long)]
    pub trash: bool,

    /// Minimum file size to consider (e.g., 100, 4KiB, 1MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Hash only the first bytes of each file. Faster, but files that
    /// differ only after the prefix are reported as duplicates
    #[arg(long)]
    pub fast: bool,

    /// Number of bytes hashed per file with --fast [default: 1024]
    #[arg(long, value_name = "N", value_parser = parse_size)]
    pub prefix_bytes: Option<u64>,

    /// Number of hashing threads [default: 4]
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Do not display progress on stderr
    #[arg(long)]
    pub no_progress: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// Single JSON document
    Json,
}

/// Parse a human-readable size string into bytes.
///
/// Supports the following formats:
/// - Plain numbers: "1024" (bytes)
/// - Decimal units: "1KB", "1MB", "1GB", "1TB" (base 1000)
/// - Binary units: "1KiB", "1MiB", "1GiB", "1TiB" (base 1024)
///
/// # Examples
///
/// ```
/// use dupesweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, negative, or has an unknown
/// suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    const UNITS: &[(&str, u64)] = &[
        ("", 1),
        ("B", 1),
        ("K", 1_000),
        ("KB", 1_000),
        ("KIB", 1 << 10),
        ("M", 1_000_000),
        ("MB", 1_000_000),
        ("MIB", 1 << 20),
        ("G", 1_000_000_000),
        ("GB", 1_000_000_000),
        ("GIB", 1 << 30),
        ("T", 1_000_000_000_000),
        ("TB", 1_000_000_000_000),
        ("TIB", 1 << 40),
    ];

    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let unit_start = s
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(s.len(), |(i, _)| i);
    let (number, unit) = s.split_at(unit_start);
    let unit = unit.trim().to_ascii_uppercase();

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid number: '{number}'"))?;
    let scale = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|&(_, scale)| scale)
        .ok_or_else(|| format!("Unknown size suffix: '{unit}'"))?;

    let bytes = value * scale as f64;
    if bytes >= u64::MAX as f64 {
        return Err(format!("Size is too large: '{s}'"));
    }
    Ok(bytes as u64)
}
