//! dupesweep - duplicate file finder and remover
//!
//! Files are grouped by size first; only files that share a size are
//! hashed (BLAKE3, whole file or a prefix). Members of duplicate groups
//! that lie under a deletable prefix are removed, trashed or only
//! reported, and every group keeps at least one copy.
//!
//! The library entry point for a complete run is [`run`]; the binary wraps
//! it in [`run_app`].

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod report;
pub mod scanner;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::delete::{DeletionStat, Deleter};
use crate::cli::{Cli, OutputFormat};
use crate::config::{Config, ConfigOverrides, RunOptions, Source};
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::JsonReport;
use crate::progress::Progress;
use crate::report::TextReport;
use crate::scanner::path_from_line;

/// Parse configuration, run once against the real stdin/stdout.
///
/// # Errors
///
/// Configuration problems surface as [`config::ConfigError`] inside the
/// returned error; anything else is a general failure.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let overrides = ConfigOverrides::from_cli(&cli);
    let config = Config::load(cli.config.as_deref(), &overrides)?;
    let options = RunOptions::resolve(&cli, &config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&options, stdin.lock(), stdout.lock())?;

    Ok(ExitCode::Success)
}

/// Scan, group, hash, delete and report.
///
/// `input` is only read when the source is [`Source::Stdin`]. The report
/// is written to `output`.
///
/// # Errors
///
/// Fails if no root is accessible, stdin cannot be read, or the report
/// cannot be written. Per-file problems are logged and skipped.
pub fn run<R: BufRead, W: Write>(
    options: &RunOptions,
    input: R,
    output: W,
) -> anyhow::Result<DeletionStat> {
    let mut finder_config = FinderConfig::default()
        .with_min_size(options.scan.min_size)
        .with_scope(options.scope)
        .with_io_threads(options.io_threads);
    if options.progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let finder = DuplicateFinder::new(finder_config);

    let (groups, summary) = match &options.source {
        Source::Roots(roots) => finder.find_duplicates(roots)?,
        Source::Stdin => {
            let lines = input
                .split(b'\n')
                .collect::<Result<Vec<Vec<u8>>, _>>()
                .context("failed to read paths from stdin")?;
            finder.find_duplicates_in_paths(lines.iter().filter_map(|line| path_from_line(line)))
        }
    };

    let deleter = Deleter::new(options.mode);

    let stat = match options.output {
        OutputFormat::Text => {
            let mut report = TextReport::new(output);
            report.write_phases(summary.bytes_to_hash);
            let prefix_bytes = match options.scope {
                scanner::HashScope::Prefix(n) => Some(n),
                scanner::HashScope::Full => None,
            };
            report.write_header(prefix_bytes);
            let stat = deleter.process_all(&groups, &options.prefixes, &mut report);
            report.write_summary(&stat);
            report.finish().context("failed to write report")?;
            stat
        }
        OutputFormat::Json => {
            let mut report = JsonReport::new();
            let stat = deleter.process_all(&groups, &options.prefixes, &mut report);
            report
                .into_output(stat, &summary, options.mode.is_dry_run())
                .write_to(output)
                .context("failed to write report")?;
            stat
        }
    };

    Ok(stat)
}
