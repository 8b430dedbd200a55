//! Progress reporting utilities using indicatif.
//!
//! The pipeline reports progress through the [`ProgressCallback`] trait;
//! [`Progress`] renders it as an in-place terminal line on stderr. Progress
//! is purely observational and never affects results.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::report::humanize_size;

/// Progress callback for the scan and hash phases.
///
/// Implementations must be thread-safe: during hashing, workers call
/// [`on_item_completed`](Self::on_item_completed) concurrently.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - `"scan"` or `"hash"`
    /// * `total` - Total amount of work in bytes, or `0` when unknown
    fn on_phase_start(&self, phase: &str, total: u64);

    /// Called with the running totals of the current phase.
    ///
    /// # Arguments
    ///
    /// * `count` - Files processed so far
    /// * `bytes` - Bytes processed so far
    fn on_progress(&self, count: u64, bytes: u64);

    /// Called by a hashing worker after one file is done.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesweep::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn hash_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }

    fn replace_bar(&self, bar: Option<ProgressBar>) -> Option<ProgressBar> {
        match self.bar.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, bar),
            Err(_) => None,
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: u64) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            "hash" => {
                let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
                pb.set_style(Self::hash_style());
                pb
            }
            _ => {
                let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
                pb.set_style(Self::scan_style());
                pb.set_message(format!("0 files ({})", humanize_size(0)));
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };

        if let Some(old) = self.replace_bar(Some(pb)) {
            old.finish_and_clear();
        }
    }

    fn on_progress(&self, count: u64, bytes: u64) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| {
            if pb.length().is_some() {
                pb.set_position(bytes);
            } else {
                pb.set_message(format!("{} files ({})", count, humanize_size(bytes)));
            }
        });
    }

    fn on_item_completed(&self, bytes: u64) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.inc(bytes));
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.replace_bar(None) {
            match phase {
                "scan" => pb.finish(),
                _ => pb.finish_and_clear(),
            }
        }
    }
}
