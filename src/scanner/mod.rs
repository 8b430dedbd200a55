//! Scanner module for file discovery and content hashing.
//!
//! This module provides functionality for:
//! - Recursive directory walking using walkdir
//! - Reading explicit file lists (one path per line)
//! - Content hashing with BLAKE3 over the whole file or a prefix
//! - Path normalization for identity and prefix checks
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`path_utils`]: Absolute/NFC path handling
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{ScanConfig, Walker};
//! use std::path::PathBuf;
//!
//! let config = ScanConfig { min_size: 1024 };
//! let walker = Walker::new(vec![PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

pub use hasher::{hash_to_hex, Digest, Hash, HashScope, Hasher, DEFAULT_PREFIX_BYTES};
pub use walker::{collect_records, path_from_line, records_from_paths, ScanOutcome, Walker};

/// A discovered regular file.
///
/// Created by the scanner without a digest. The hash phase attaches the
/// digest once through [`FileRecord::with_digest`]; the record is not
/// modified after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute, lexically cleaned path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Content digest, present only for files that shared a size with another
    pub digest: Option<Digest>,
}

impl FileRecord {
    /// Create a record with no digest.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            digest: None,
        }
    }

    /// Consume the record and return it with its digest attached.
    #[must_use]
    pub fn with_digest(self, digest: Digest) -> Self {
        debug_assert!(self.digest.is_none(), "digest attached twice");
        Self {
            digest: Some(digest),
            ..self
        }
    }
}

/// Configuration for file discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanConfig {
    /// Minimum file size to include (in bytes). Files smaller than this are
    /// skipped. `0` includes every file, empty ones too.
    pub min_size: u64,
}

impl ScanConfig {
    /// Create a configuration with the given minimum size.
    #[must_use]
    pub fn new(min_size: u64) -> Self {
        Self { min_size }
    }

    /// Whether a file of `size` bytes passes the size filter.
    #[must_use]
    pub fn accepts_size(&self, size: u64) -> bool {
        size >= self.min_size
    }
}

/// Errors that can occur during directory scanning.
///
/// None of these abort a scan; they are collected and reported.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path vanished or never existed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_new() {
        let record = FileRecord::new(PathBuf::from("/test/file.txt"), 1024);

        assert_eq!(record.path, PathBuf::from("/test/file.txt"));
        assert_eq!(record.size, 1024);
        assert!(record.digest.is_none());
    }

    #[test]
    fn test_file_record_with_digest() {
        let record = FileRecord::new(PathBuf::from("/a"), 1).with_digest(Digest::Unreadable);
        assert_eq!(record.digest, Some(Digest::Unreadable));
    }

    #[test]
    fn test_scan_config_default_accepts_everything() {
        let config = ScanConfig::default();
        assert_eq!(config.min_size, 0);
        assert!(config.accepts_size(0));
        assert!(config.accepts_size(u64::MAX));
    }

    #[test]
    fn test_scan_config_min_size_is_inclusive() {
        let config = ScanConfig::new(100);
        assert!(!config.accepts_size(99));
        assert!(config.accepts_size(100));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_scan_error_from_io_classifies() {
        let path = Path::new("/x");
        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ScanError::NotFound(_)));
        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ScanError::PermissionDenied(_)));
        let err = ScanError::from_io(path, io::Error::other("boom"));
        assert!(matches!(err, ScanError::Io { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn test_hash_error_display() {
        let err = HashError::NotFound(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "File not found: /test");

        let err = HashError::PermissionDenied(PathBuf::from("/secret"));
        assert_eq!(err.to_string(), "Permission denied: /secret");
    }
}
