//! Plain-text run report.
//!
//! The deletion engine emits [`GroupEvent`]s into a [`ReportSink`] as it
//! walks each duplicate group. [`TextReport`] renders them in the classic
//! line format:
//!
//! ```text
//!       size   filename
//! --------------------
//! (  1.00 KiB) /data/a.bin
//! (  1.00 KiB) /data/copy/a.bin
//! deleted /data/copy/a.bin
//! --------------------
//! found 1 groups with 2 duplicate files with a total size of 2.00 KiB
//! deletedFileSize 1.00 KiB
//! ```

use std::io::{self, Write};
use std::path::Path;

use crate::actions::delete::{DeleteError, DeletionStat};
use crate::duplicates::DuplicateGroup;

/// Separator printed before each group and before the summary.
pub const RULE: &str = "--------------------";

const UNITS: [(u64, &str); 4] = [(1 << 30, "GiB"), (1 << 20, "MiB"), (1 << 10, "KiB"), (1, "B")];

/// Render a byte count with two decimals in the largest binary unit whose
/// scaled value exceeds one half.
///
/// # Examples
///
/// ```
/// use dupesweep::report::humanize_size;
///
/// assert_eq!(humanize_size(0), "0.00 B");
/// assert_eq!(humanize_size(1024), "1.00 KiB");
/// assert_eq!(humanize_size(600), "0.59 KiB");
/// ```
#[must_use]
pub fn humanize_size(bytes: u64) -> String {
    for (limit, unit) in UNITS {
        let scaled = bytes as f64 / limit as f64;
        if scaled > 0.5 {
            return format!("{:.2} {}", scaled, unit);
        }
    }
    "0.00 B".to_string()
}

/// One step of processing a duplicate group.
#[derive(Debug)]
pub enum GroupEvent<'a> {
    /// A group is about to be processed.
    Begin(&'a DuplicateGroup),
    /// Every member was deletable; this one is kept.
    Keep(&'a Path),
    /// The file was removed (or moved to the trash).
    Deleted(&'a Path),
    /// The file would have been removed.
    Simulated(&'a Path),
    /// Removing the file failed.
    Failed {
        /// File that could not be removed
        path: &'a Path,
        /// Why
        error: &'a DeleteError,
    },
}

/// Receiver of group events.
pub trait ReportSink {
    /// Handle one event.
    fn on_event(&mut self, event: &GroupEvent<'_>);
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn on_event(&mut self, event: &GroupEvent<'_>) {
        (**self).on_event(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn on_event(&mut self, _event: &GroupEvent<'_>) {}
}

/// Line-oriented text report.
///
/// Write errors do not interrupt the run. The first one is kept and
/// returned by [`TextReport::finish`].
pub struct TextReport<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> TextReport<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_fmt(args) {
            self.error = Some(e);
        }
    }

    /// Print the phase lines that precede the listing.
    pub fn write_phases(&mut self, bytes_to_hash: u64) {
        self.line(format_args!("group by size\n"));
        self.line(format_args!(
            "calculate hashes of {}\n",
            humanize_size(bytes_to_hash)
        ));
    }

    /// Print the column header, preceded by a warning in prefix mode.
    pub fn write_header(&mut self, prefix_bytes: Option<u64>) {
        if let Some(n) = prefix_bytes {
            self.line(format_args!(
                "warning: fast mode compares only the first {} bytes of each file; \
                 reported duplicates are approximate\n",
                n
            ));
        }
        self.line(format_args!("{:>10}   {}\n", "size", "filename"));
    }

    /// Print the closing rule and summary lines.
    pub fn write_summary(&mut self, stat: &DeletionStat) {
        self.line(format_args!("{}\n", RULE));
        self.line(format_args!(
            "found {} groups with {} duplicate files with a total size of {}\n",
            stat.group_count,
            stat.duplicate_file_count,
            humanize_size(stat.duplicate_bytes)
        ));
        self.line(format_args!(
            "deletedFileSize {}\n",
            humanize_size(stat.deleted_bytes)
        ));
    }

    /// Flush and return the writer, or the first write error.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error hit while writing.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn on_event(&mut self, event: &GroupEvent<'_>) {
        match event {
            GroupEvent::Begin(group) => {
                self.line(format_args!("{}\n", RULE));
                let size = humanize_size(group.size);
                for path in group.paths() {
                    self.line(format_args!("({:>10}) {}\n", size, path.display()));
                }
            }
            GroupEvent::Keep(path) => self.line(format_args!("keep {}\n", path.display())),
            GroupEvent::Deleted(path) => self.line(format_args!("deleted {}\n", path.display())),
            GroupEvent::Simulated(path) => {
                self.line(format_args!("simulate deletion of {}\n", path.display()));
            }
            GroupEvent::Failed { path, error } => self.line(format_args!(
                "failed to delete {}: {}\n",
                path.display(),
                error
            )),
        }
    }
}
