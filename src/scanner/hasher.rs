//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] computes a [`Digest`] for a file over one of two scopes:
//!
//! - [`HashScope::Full`] hashes every byte. Two files with equal size and
//!   equal full digest are treated as exact duplicates.
//! - [`HashScope::Prefix`] hashes only the first `n` bytes. This is an
//!   *approximate* mode: files that agree on their first `n` bytes are
//!   reported as duplicates even if they differ afterwards.
//!
//! A file that cannot be opened or read gets [`Digest::Unreadable`] instead
//! of an error, so one bad file never aborts a run.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{Hasher, HashScope};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashScope::Full);
//! let digest = hasher.digest(Path::new("some_file.bin"));
//! println!("{}", digest);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::HashError;

/// Buffer size for streaming full-file hashes.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Default number of bytes hashed in prefix mode.
pub const DEFAULT_PREFIX_BYTES: u64 = 1024;

/// Raw BLAKE3 output.
pub type Hash = [u8; 32];

/// Which part of a file contributes to its digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashScope {
    /// Hash the whole file (exact duplicate detection).
    #[default]
    Full,
    /// Hash only the first `n` bytes (approximate duplicate detection).
    Prefix(u64),
}

impl HashScope {
    /// Number of bytes that will be read from a file of `size` bytes.
    #[must_use]
    pub fn bytes_for(self, size: u64) -> u64 {
        match self {
            Self::Full => size,
            Self::Prefix(limit) => size.min(limit),
        }
    }

    /// Whether equal digests only imply equal prefixes.
    #[must_use]
    pub fn is_approximate(self) -> bool {
        matches!(self, Self::Prefix(_))
    }
}

/// Content fingerprint of a file.
///
/// `Unreadable` is a sentinel that never compares equal to a `Content`
/// digest, so unreadable files can only ever be grouped with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Digest {
    /// BLAKE3 output over the configured scope.
    Content(Hash),
    /// The file could not be opened or read.
    Unreadable,
}

impl Digest {
    /// Whether this is the unreadable sentinel.
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(hash) => f.write_str(&hash_to_hex(hash)),
            Self::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// Convert a hash to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    scope: HashScope,
}

impl Hasher {
    /// Create a hasher for the given scope.
    #[must_use]
    pub fn new(scope: HashScope) -> Self {
        Self { scope }
    }

    /// The scope this hasher reads.
    #[must_use]
    pub fn scope(&self) -> HashScope {
        self.scope
    }

    /// Compute the digest of a file, mapping any I/O failure to
    /// [`Digest::Unreadable`].
    #[must_use]
    pub fn digest(&self, path: &Path) -> Digest {
        match self.try_digest(path) {
            Ok(hash) => Digest::Content(hash),
            Err(e) => {
                log::warn!("Cannot hash {}: {}", path.display(), e);
                Digest::Unreadable
            }
        }
    }

    /// Compute the digest of a file, surfacing I/O errors.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn try_digest(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();

        match self.scope {
            HashScope::Full => stream_into(&mut hasher, file),
            HashScope::Prefix(limit) => stream_into(&mut hasher, file.take(limit)),
        }
        .map_err(|e| HashError::from_io(path, e))?;

        Ok(*hasher.finalize().as_bytes())
    }
}

fn stream_into<R: Read>(hasher: &mut blake3::Hasher, mut reader: R) -> io::Result<u64> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                hasher.update(&buffer[..n]);
                total += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
