//! Path normalization and prefix matching.
//!
//! Two separate notions of "normalized" are used in this crate:
//!
//! - [`resolve`] produces the paths that are walked, stored in a
//!   [`FileRecord`] and later opened or removed. It asks the filesystem, so
//!   symlinks and `..` are followed the way the kernel follows them, and the
//!   exact bytes of every component are kept.
//! - [`comparison_key`] additionally folds the path to Unicode NFC. It is
//!   only used for equality and prefix checks, never for I/O.
//!
//! [`absolutize`] is the lexical fallback for paths that do not exist.
//!
//! macOS stores file names in NFD while most Linux tools produce NFC, so the
//! same visible name can have two byte representations:
//!
//! ```
//! use dupesweep::scanner::path_utils::{comparison_key, is_under_prefix};
//! use std::path::Path;
//!
//! let nfc = Path::new("/data/café/a.txt");
//! let nfd = Path::new("/data/cafe\u{0301}");
//! assert_eq!(comparison_key(Path::new("/data/cafe\u{0301}")), comparison_key(Path::new("/data/café")));
//! assert!(is_under_prefix(nfc, nfd));
//! ```
//!
//! [`FileRecord`]: super::FileRecord

use std::fs;
use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
///
/// ```
/// use dupesweep::scanner::path_utils::normalize_path_str;
///
/// assert_eq!(normalize_path_str("cafe\u{0301}.txt"), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Normalize a [`Path`] to NFC form.
///
/// Paths that are not valid UTF-8 are returned unchanged.
#[must_use]
pub fn normalize_pathbuf(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(normalize_path_str(s)),
        None => path.to_path_buf(),
    }
}

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// A `..` that would climb above the root is dropped, matching how the
/// kernel resolves `/..`.
///
/// ```
/// use dupesweep::scanner::path_utils::lexical_clean;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(lexical_clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
/// assert_eq!(lexical_clean(Path::new("/..")), PathBuf::from("/"));
/// ```
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// Make a path absolute (relative to the current directory) and clean it.
///
/// Symlinks are not resolved; a path that cannot be made absolute is
/// cleaned as-is.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|e| {
        log::debug!("Could not make {} absolute: {}", path.display(), e);
        path.to_path_buf()
    });
    lexical_clean(&absolute)
}

/// Resolve `path` to its canonical absolute form.
///
/// Falls back to [`absolutize`] when the filesystem cannot resolve it, for
/// example because it does not exist.
#[must_use]
pub fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|e| {
        log::debug!("Could not resolve {}: {}", path.display(), e);
        absolutize(path)
    })
}

/// Key used to compare two paths for identity or containment.
///
/// Absolute, cleaned, NFC, and lowercased on Windows where the filesystem is
/// case-insensitive.
#[must_use]
pub fn comparison_key(path: &Path) -> PathBuf {
    let normalized = normalize_pathbuf(&absolutize(path));
    if cfg!(windows) {
        PathBuf::from(normalized.to_string_lossy().to_lowercase())
    } else {
        normalized
    }
}

/// Check whether `path` lies at or below `prefix`.
///
/// Matching is component-wise after [`comparison_key`], so `/data/a` is not
/// a prefix of `/data/ab/file`.
///
/// ```
/// use dupesweep::scanner::path_utils::is_under_prefix;
/// use std::path::Path;
///
/// assert!(is_under_prefix(Path::new("/data/a/file"), Path::new("/data/a")));
/// assert!(is_under_prefix(Path::new("/data/a"), Path::new("/data/a/")));
/// assert!(!is_under_prefix(Path::new("/data/ab/file"), Path::new("/data/a")));
/// ```
#[must_use]
pub fn is_under_prefix(path: &Path, prefix: &Path) -> bool {
    comparison_key(path).starts_with(comparison_key(prefix))
}
