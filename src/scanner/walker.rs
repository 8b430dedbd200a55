//! Directory walker and explicit path list reader.
//!
//! # Overview
//!
//! [`Walker`] recursively walks one or more roots with [`walkdir`] and yields
//! a [`FileRecord`] for every regular file. [`records_from_paths`] does the
//! same for an explicit list of paths (for example read from stdin).
//!
//! Both sources:
//!
//! - skip directories, symbolic links and special files
//! - apply the minimum size filter
//! - store canonical absolute paths, with symlinked roots resolved
//! - never yield the same file twice, even for overlapping roots, a root
//!   reached through a symlink, or a second hard link to the same file
//! - report unreadable entries as [`ScanError`] values instead of stopping
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{collect_records, ScanConfig, Walker};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], ScanConfig::default());
//! let outcome = collect_records(walker.walk(), None);
//! println!("{} files, {} errors", outcome.records.len(), outcome.errors.len());
//! ```

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::path_utils::{comparison_key, resolve};
use super::{FileRecord, ScanConfig, ScanError};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    roots: Vec<PathBuf>,
    config: ScanConfig,
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// A root may be a directory (walked recursively) or a single regular
    /// file. Roots are resolved through the filesystem first, so every
    /// yielded path is free of symlinks and `..`.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: ScanConfig) -> Self {
        let roots = roots.iter().map(|root| resolve(root)).collect();
        Self { roots, config }
    }

    /// Walk every root, yielding file records.
    ///
    /// Entries inside a directory are visited in file name order so output
    /// is deterministic. Errors are yielded rather than ending iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let mut dedup = Dedup::default();
        let config = self.config;

        self.roots
            .iter()
            .flat_map(|root| {
                log::debug!("Walking {}", root.display());
                WalkDir::new(root)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }
                    if !file_type.is_file() {
                        log::trace!("Skipping special file: {}", entry.path().display());
                        return None;
                    }

                    match entry.metadata() {
                        Ok(metadata) => {
                            accept(entry.path().to_path_buf(), &metadata, config, &mut dedup)
                        }
                        Err(e) => Some(Err(walk_error(entry.path(), e))),
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    Some(Err(walk_error(&path, e)))
                }
            })
    }
}

/// Turn one raw input line into a path.
///
/// The trailing `\n` or `\r\n` is stripped. Blank lines yield `None`. On
/// Unix any byte sequence is a valid path; elsewhere a line that is not
/// UTF-8 is logged and skipped.
#[must_use]
pub fn path_from_line(line: &[u8]) -> Option<PathBuf> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    path_from_bytes(line)
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(PathBuf::from(s)),
        Err(e) => {
            log::warn!(
                "Skipping input line that is not valid UTF-8 ({}): {}",
                e,
                String::from_utf8_lossy(bytes)
            );
            None
        }
    }
}

/// Build records from an explicit list of paths.
///
/// Empty paths are ignored. Paths that do not exist any more are yielded as
/// [`ScanError::NotFound`]; symlinks, directories and special files are
/// skipped.
pub fn records_from_paths<I, P>(
    paths: I,
    config: ScanConfig,
) -> impl Iterator<Item = Result<FileRecord, ScanError>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut dedup = Dedup::default();

    paths.into_iter().filter_map(move |path| {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return None;
        }

        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_file() => {
                accept(resolve(path), &metadata, config, &mut dedup)
            }
            Ok(_) => {
                log::trace!("Skipping non-regular file: {}", path.display());
                None
            }
            Err(e) => {
                log::debug!("Cannot stat {}: {}", path.display(), e);
                Some(Err(ScanError::from_io(path, e)))
            }
        }
    })
}

/// Records and non-fatal errors collected from a scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted regular files, in discovery order
    pub records: Vec<FileRecord>,
    /// Entries that could not be read
    pub errors: Vec<ScanError>,
}

impl ScanOutcome {
    /// Total size of all accepted records.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

/// Drain a record source, reporting the running count and size.
pub fn collect_records<I>(entries: I, progress: Option<&dyn ProgressCallback>) -> ScanOutcome
where
    I: IntoIterator<Item = Result<FileRecord, ScanError>>,
{
    let mut outcome = ScanOutcome::default();
    let mut total_size = 0u64;

    if let Some(cb) = progress {
        cb.on_phase_start("scan", 0);
    }

    for entry in entries {
        match entry {
            Ok(record) => {
                total_size += record.size;
                outcome.records.push(record);
                if let Some(cb) = progress {
                    cb.on_progress(outcome.records.len() as u64, total_size);
                }
            }
            Err(e) => outcome.errors.push(e),
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end("scan");
    }

    log::info!(
        "Scan complete: {} files, {} bytes, {} errors",
        outcome.records.len(),
        total_size,
        outcome.errors.len()
    );

    outcome
}

/// Remembers every file already yielded, by path and by (device, inode).
#[derive(Debug, Default)]
struct Dedup {
    paths: HashSet<PathBuf>,
    ids: HashSet<FileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

impl Dedup {
    fn first_visit(&mut self, path: &Path, metadata: &Metadata) -> bool {
        if !self.paths.insert(comparison_key(path)) {
            log::trace!("Skipping already seen path: {}", path.display());
            return false;
        }
        match FileId::from_metadata(metadata) {
            Some(id) if !self.ids.insert(id) => {
                log::debug!("Skipping another name for an already seen file: {}", path.display());
                false
            }
            _ => true,
        }
    }
}

fn accept(
    path: PathBuf,
    metadata: &Metadata,
    config: ScanConfig,
    dedup: &mut Dedup,
) -> Option<Result<FileRecord, ScanError>> {
    let size = metadata.len();
    if !config.accepts_size(size) {
        log::trace!("Skipping file below min size ({}): {}", size, path.display());
        return None;
    }

    if !dedup.first_visit(&path, metadata) {
        return None;
    }

    Some(Ok(FileRecord::new(path, size)))
}

fn walk_error(path: &Path, error: walkdir::Error) -> ScanError {
    let scan_error = match error.into_io_error() {
        Some(io) => ScanError::from_io(path, io),
        None => ScanError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other("filesystem loop detected"),
        },
    };
    match &scan_error {
        ScanError::NotFound(p) => {
            log::debug!("File not found (may have been deleted): {}", p.display())
        }
        other => log::warn!("{}", other),
    }
    scan_error
}
