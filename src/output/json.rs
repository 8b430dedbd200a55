//! JSON output formatter for run results.
//!
//! Provides machine-readable output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "digest": "abc123...",
//!       "size": 1024,
//!       "files": ["/data/a.bin", "/data/copy/a.bin"],
//!       "deleted": ["/data/copy/a.bin"],
//!       "kept": null,
//!       "failed": []
//!     }
//!   ],
//!   "summary": {
//!     "group_count": 1,
//!     "duplicate_file_count": 2,
//!     "duplicate_bytes": 2048,
//!     "deleted_bytes": 1024,
//!     "deleted_file_count": 1,
//!     "failed_deletions": 0,
//!     "total_files": 10,
//!     "total_size": 40960,
//!     "bytes_to_hash": 2048,
//!     "unreadable_files": 0,
//!     "scan_errors": 0,
//!     "scan_duration_ms": 12
//!   },
//!   "dry_run": false,
//!   "approximate": false
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::delete::DeletionStat;
use crate::duplicates::ScanSummary;
use crate::report::{GroupEvent, ReportSink};

/// A deletion that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonFailure {
    /// File that could not be deleted
    pub path: String,
    /// Error message
    pub error: String,
}

/// A single duplicate group and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 digest as hexadecimal string (64 characters)
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Every member, in scan order
    pub files: Vec<String>,
    /// Members deleted (or that would be, in a dry run)
    pub deleted: Vec<String>,
    /// Member kept because every member was deletable
    pub kept: Option<String>,
    /// Deletions that failed
    pub failed: Vec<JsonFailure>,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Deletion totals
    #[serde(flatten)]
    pub deletion: DeletionStat,
    /// Files accepted by the scanner
    pub total_files: usize,
    /// Their combined size
    pub total_size: u64,
    /// Bytes planned for hashing
    pub bytes_to_hash: u64,
    /// Files that could not be read while hashing
    pub unreadable_files: usize,
    /// Entries skipped during the scan
    pub scan_errors: usize,
    /// Duration of the search in milliseconds
    pub scan_duration_ms: u64,
}

impl JsonSummary {
    /// Combine deletion totals with the search summary.
    #[must_use]
    pub fn new(deletion: DeletionStat, summary: &ScanSummary) -> Self {
        Self {
            deletion,
            total_files: summary.total_files,
            total_size: summary.total_size,
            bytes_to_hash: summary.bytes_to_hash,
            unreadable_files: summary.unreadable_files,
            scan_errors: summary.scan_errors,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups in report order
    pub groups: Vec<JsonDuplicateGroup>,
    /// Totals
    pub summary: JsonSummary,
    /// Whether deletions were only simulated
    pub dry_run: bool,
    /// Whether digests only covered a file prefix
    pub approximate: bool,
}

impl JsonOutput {
    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Report sink that records group events for the JSON document.
#[derive(Debug, Default)]
pub struct JsonReport {
    groups: Vec<JsonDuplicateGroup>,
}

impl JsonReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups recorded so far.
    #[must_use]
    pub fn groups(&self) -> &[JsonDuplicateGroup] {
        &self.groups
    }

    /// Finish the document.
    #[must_use]
    pub fn into_output(self, stat: DeletionStat, summary: &ScanSummary, dry_run: bool) -> JsonOutput {
        JsonOutput {
            groups: self.groups,
            summary: JsonSummary::new(stat, summary),
            dry_run,
            approximate: summary.approximate,
        }
    }

    fn current(&mut self) -> Option<&mut JsonDuplicateGroup> {
        self.groups.last_mut()
    }
}

impl ReportSink for JsonReport {
    fn on_event(&mut self, event: &GroupEvent<'_>) {
        match event {
            GroupEvent::Begin(group) => self.groups.push(JsonDuplicateGroup {
                digest: group.digest.to_string(),
                size: group.size,
                files: group.paths().map(|p| p.to_string_lossy().into_owned()).collect(),
                deleted: Vec::new(),
                kept: None,
                failed: Vec::new(),
            }),
            GroupEvent::Keep(path) => {
                if let Some(g) = self.current() {
                    g.kept = Some(path.to_string_lossy().into_owned());
                }
            }
            GroupEvent::Deleted(path) | GroupEvent::Simulated(path) => {
                if let Some(g) = self.current() {
                    g.deleted.push(path.to_string_lossy().into_owned());
                }
            }
            GroupEvent::Failed { path, error } => {
                if let Some(g) = self.current() {
                    g.failed.push(JsonFailure {
                        path: path.to_string_lossy().into_owned(),
                        error: error.to_string(),
                    });
                }
            }
        }
    }
}
