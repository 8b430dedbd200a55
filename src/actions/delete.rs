//! Deletion engine for confirmed duplicate groups.
//!
//! # Overview
//!
//! For every [`DuplicateGroup`] the engine:
//! - selects the members that lie under a deletable prefix
//!   ([`plan_group`])
//! - keeps the first member when every member is deletable, so each group
//!   always retains a copy
//! - removes, trashes, or only reports the rest depending on [`DeleteMode`]
//! - emits one [`GroupEvent`] per line of the report
//!
//! A failed deletion is reported and the remaining files are still
//! processed. Deletion is serial and runs after hashing is complete.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::actions::delete::{DeletablePrefixes, DeleteMode, Deleter};
//! use dupesweep::report::NullSink;
//!
//! let prefixes = DeletablePrefixes::new(["/data/copies"]);
//! let deleter = Deleter::new(DeleteMode::DryRun);
//! let stat = deleter.process_all(&[], &prefixes, &mut NullSink);
//! assert_eq!(stat.group_count, 0);
//! ```

use std::fs;
use std::io;
use std::iter::Sum;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::report::{GroupEvent, ReportSink};
use crate::scanner::path_utils::{comparison_key, resolve};
use crate::scanner::FileRecord;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Move a single file to the system trash.
///
/// Returns the size of the file at deletion time.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(size)
}

/// Permanently delete a single file.
///
/// Returns the size of the file at deletion time.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be inspected
/// - `PermanentDeleteFailed` if the removal fails
pub fn permanent_delete(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(size)
}

/// Directories whose contents may be deleted.
///
/// Matching is by path prefix on normalized, component-wise paths: the
/// prefix `/data/a` covers `/data/a` and `/data/a/x` but not `/data/ab`.
#[derive(Debug, Clone, Default)]
pub struct DeletablePrefixes {
    prefixes: Vec<PathBuf>,
    keys: Vec<PathBuf>,
}

impl DeletablePrefixes {
    /// Resolve and collect prefixes.
    ///
    /// Symlinks in a prefix are followed, so a prefix given through a link
    /// matches the files the scanner reports under the real directory.
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = Self::default();
        for prefix in prefixes {
            let prefix = resolve(prefix.as_ref());
            let key = comparison_key(&prefix);
            if !set.keys.contains(&key) {
                set.prefixes.push(prefix);
                set.keys.push(key);
            }
        }
        set
    }

    /// Whether no prefix is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Number of distinct prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// The absolute prefixes, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.prefixes.iter().map(PathBuf::as_path)
    }

    /// Whether `path` lies at or below any prefix.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        let key = comparison_key(path);
        self.keys.iter().any(|prefix| key.starts_with(prefix))
    }
}

/// Which members of a group to keep and which to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan<'a> {
    /// Member kept because every member was deletable
    pub survivor: Option<&'a FileRecord>,
    /// Members to delete, in group order
    pub doomed: Vec<&'a FileRecord>,
}

/// Select the members of `group` to delete.
///
/// The result never covers the whole group: when every member is under a
/// deletable prefix the first one becomes the survivor.
#[must_use]
pub fn plan_group<'a>(group: &'a DuplicateGroup, prefixes: &DeletablePrefixes) -> DeletionPlan<'a> {
    let mut doomed: Vec<&FileRecord> = group
        .files
        .iter()
        .filter(|f| prefixes.contains(&f.path))
        .collect();

    let survivor = if !doomed.is_empty() && doomed.len() == group.files.len() {
        Some(doomed.remove(0))
    } else {
        None
    };

    DeletionPlan { survivor, doomed }
}

/// How selected files are disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Remove the file from the filesystem.
    #[default]
    Remove,
    /// Move the file to the system trash.
    Trash,
    /// Only report what would be deleted.
    DryRun,
}

impl DeleteMode {
    /// Whether nothing is touched on disk.
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Totals for one or more processed groups.
///
/// Combine with `+=`, [`merge`](Self::merge) or `Iterator::sum`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionStat {
    /// Number of duplicate groups
    pub group_count: u64,
    /// Members across all groups
    pub duplicate_file_count: u64,
    /// Combined size of all members
    pub duplicate_bytes: u64,
    /// Bytes deleted (or that would be, in a dry run)
    pub deleted_bytes: u64,
    /// Files deleted (or that would be, in a dry run)
    pub deleted_file_count: u64,
    /// Deletions that failed
    pub failed_deletions: u64,
}

impl DeletionStat {
    /// Statistics of a group before anything is deleted.
    #[must_use]
    pub fn for_group(group: &DuplicateGroup) -> Self {
        Self {
            group_count: 1,
            duplicate_file_count: group.len() as u64,
            duplicate_bytes: group.total_size(),
            ..Default::default()
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            group_count: self.group_count + other.group_count,
            duplicate_file_count: self.duplicate_file_count + other.duplicate_file_count,
            duplicate_bytes: self.duplicate_bytes + other.duplicate_bytes,
            deleted_bytes: self.deleted_bytes + other.deleted_bytes,
            deleted_file_count: self.deleted_file_count + other.deleted_file_count,
            failed_deletions: self.failed_deletions + other.failed_deletions,
        }
    }
}

impl AddAssign for DeletionStat {
    fn add_assign(&mut self, other: Self) {
        *self = self.merge(other);
    }
}

impl Sum for DeletionStat {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::merge)
    }
}

/// Applies deletion plans to duplicate groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deleter {
    mode: DeleteMode,
}

impl Deleter {
    /// Create a deleter.
    #[must_use]
    pub fn new(mode: DeleteMode) -> Self {
        Self { mode }
    }

    /// The disposal mode.
    #[must_use]
    pub fn mode(&self) -> DeleteMode {
        self.mode
    }

    /// Bytes freed by disposing of `file`.
    fn dispose(&self, file: &FileRecord) -> Result<u64, DeleteError> {
        match self.mode {
            DeleteMode::Remove => permanent_delete(&file.path),
            DeleteMode::Trash => delete_to_trash(&file.path),
            DeleteMode::DryRun => Ok(file.size),
        }
    }

    /// Report one group and delete its selected members.
    pub fn process<S: ReportSink + ?Sized>(
        &self,
        group: &DuplicateGroup,
        prefixes: &DeletablePrefixes,
        sink: &mut S,
    ) -> DeletionStat {
        let mut stat = DeletionStat::for_group(group);
        sink.on_event(&GroupEvent::Begin(group));

        let plan = plan_group(group, prefixes);
        if let Some(keep) = plan.survivor {
            log::debug!("Keeping {}", keep.path.display());
            sink.on_event(&GroupEvent::Keep(&keep.path));
        }

        for file in plan.doomed {
            match self.dispose(file) {
                Ok(freed) => {
                    stat.deleted_bytes += freed;
                    stat.deleted_file_count += 1;
                    if self.mode.is_dry_run() {
                        sink.on_event(&GroupEvent::Simulated(&file.path));
                    } else {
                        sink.on_event(&GroupEvent::Deleted(&file.path));
                    }
                }
                Err(error) => {
                    log::warn!("Failed to delete {}: {}", file.path.display(), error);
                    stat.failed_deletions += 1;
                    sink.on_event(&GroupEvent::Failed {
                        path: &file.path,
                        error: &error,
                    });
                }
            }
        }

        stat
    }

    /// Process every group in order and sum the statistics.
    pub fn process_all<S: ReportSink + ?Sized>(
        &self,
        groups: &[DuplicateGroup],
        prefixes: &DeletablePrefixes,
        sink: &mut S,
    ) -> DeletionStat {
        let stat: DeletionStat = groups
            .iter()
            .map(|g| self.process(g, prefixes, sink))
            .sum();

        log::info!(
            "Deletion complete ({:?}): {} files, {} bytes, {} failures",
            self.mode,
            stat.deleted_file_count,
            stat.deleted_bytes,
            stat.failed_deletions
        );

        stat
    }
}
