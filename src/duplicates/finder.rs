//! Duplicate finder: hashing of size buckets and pipeline orchestration.
//!
//! # Overview
//!
//! 1. **Scan** - collect records from directory roots or an explicit list
//! 2. **Size grouping** - drop every file whose size is unique
//!    (see [`crate::duplicates::groups`])
//! 3. **Hashing** - digest every member of each remaining bucket and split
//!    the bucket by digest
//!
//! Buckets are independent, so [`hash_size_groups`] spreads them over a
//! rayon pool of `io_threads` workers. Each bucket is handled by one worker
//! and results are reassembled in ascending size order, so the output does
//! not depend on the thread count.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(2));
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! println!("{} groups, {} bytes reclaimable", groups.len(), summary.reclaimable_space);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{bytes_to_hash, group_by_size, partition_by_digest, DuplicateGroup, SizeGroups};
use crate::progress::ProgressCallback;
use crate::scanner::{
    collect_records, records_from_paths, FileRecord, HashScope, Hasher, ScanConfig, ScanOutcome,
    Walker,
};

/// Default number of hashing workers.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the hashing phase.
#[derive(Clone)]
pub struct HashConfig {
    /// Number of worker threads. `1` hashes sequentially on the caller.
    pub io_threads: usize,
    /// Optional progress callback, fed the bytes read per file.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for HashConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashConfig")
            .field("io_threads", &self.io_threads)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            progress_callback: None,
        }
    }
}

impl HashConfig {
    /// Set the worker count (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Statistics from the hashing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashStats {
    /// Files that entered the phase
    pub input_files: usize,
    /// Files whose digest was computed
    pub hashed_files: usize,
    /// Files that could not be read
    pub unreadable_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Reported duplicate groups
    pub duplicate_groups: usize,
    /// Members of reported duplicate groups
    pub duplicate_files: usize,
}

impl HashStats {
    fn absorb(&mut self, other: Self) {
        self.input_files += other.input_files;
        self.hashed_files += other.hashed_files;
        self.unreadable_files += other.unreadable_files;
        self.bytes_hashed += other.bytes_hashed;
        self.duplicate_groups += other.duplicate_groups;
        self.duplicate_files += other.duplicate_files;
    }
}

/// Hash one size bucket and return its duplicate groups.
fn hash_bucket(
    size: u64,
    files: Vec<FileRecord>,
    hasher: &Hasher,
    progress: Option<&dyn ProgressCallback>,
) -> (Vec<DuplicateGroup>, HashStats) {
    let mut stats = HashStats {
        input_files: files.len(),
        ..Default::default()
    };
    let read = hasher.scope().bytes_for(size);

    let hashed = files.into_iter().map(|file| {
        let digest = hasher.digest(&file.path);
        log::trace!("{} {}", digest, file.path.display());
        if let Some(cb) = progress {
            cb.on_item_completed(read);
        }
        file.with_digest(digest)
    });

    let mut groups = Vec::new();
    for (digest, members) in partition_by_digest(hashed) {
        if digest.is_unreadable() {
            stats.unreadable_files += members.len();
            continue;
        }
        stats.hashed_files += members.len();
        stats.bytes_hashed += read * members.len() as u64;
        if members.len() > 1 {
            stats.duplicate_groups += 1;
            stats.duplicate_files += members.len();
            groups.push(DuplicateGroup::new(digest, size, members));
        }
    }

    (groups, stats)
}

/// Hash every candidate bucket and collect the duplicate groups.
///
/// Buckets with fewer than two members are ignored. Groups whose digest is
/// [`Digest::Unreadable`](crate::scanner::Digest::Unreadable) are never
/// returned; their members are counted in [`HashStats::unreadable_files`].
///
/// The result is ordered by ascending size, then by first appearance of
/// each digest within its bucket.
pub fn hash_size_groups(
    size_groups: SizeGroups,
    hasher: &Hasher,
    config: &HashConfig,
) -> (Vec<DuplicateGroup>, HashStats) {
    let total_bytes = bytes_to_hash(&size_groups, hasher.scope());
    let buckets: Vec<(u64, Vec<FileRecord>)> = size_groups
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .collect();

    let progress = config.progress_callback.as_deref();
    if let Some(cb) = progress {
        cb.on_phase_start("hash", total_bytes);
    }

    log::info!(
        "Hashing {} buckets ({} bytes) on {} threads",
        buckets.len(),
        total_bytes,
        config.io_threads
    );

    let per_bucket: Vec<(Vec<DuplicateGroup>, HashStats)> = if config.io_threads <= 1 {
        buckets
            .into_iter()
            .map(|(size, files)| hash_bucket(size, files, hasher, progress))
            .collect()
    } else {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(|| {
                buckets
                    .into_par_iter()
                    .map(|(size, files)| hash_bucket(size, files, hasher, progress))
                    .collect()
            }),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool, hashing sequentially: {}", e);
                buckets
                    .into_iter()
                    .map(|(size, files)| hash_bucket(size, files, hasher, progress))
                    .collect()
            }
        }
    };

    let mut groups = Vec::new();
    let mut stats = HashStats::default();
    for (bucket_groups, bucket_stats) in per_bucket {
        groups.extend(bucket_groups);
        stats.absorb(bucket_stats);
    }

    if let Some(cb) = progress {
        cb.on_phase_end("hash");
    }

    log::info!(
        "Hashing complete: {} files hashed, {} unreadable, {} duplicate groups",
        stats.hashed_files,
        stats.unreadable_files,
        stats.duplicate_groups
    );

    (groups, stats)
}

/// Configuration for a complete duplicate search.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Scanner filter
    pub scan: ScanConfig,
    /// What part of each file is hashed
    pub scope: HashScope,
    /// Hashing parallelism and progress
    pub hash: HashConfig,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("scan", &self.scan)
            .field("scope", &self.scope)
            .field("hash", &self.hash)
            .finish()
    }
}

impl FinderConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.scan.min_size = min_size;
        self
    }

    /// Set the hash scope.
    #[must_use]
    pub fn with_scope(mut self, scope: HashScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the number of hashing workers.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.hash = self.hash.with_io_threads(threads);
        self
    }

    /// Set the progress callback used by the scan and hash phases.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.hash = self.hash.with_progress_callback(callback);
        self
    }
}

/// Totals from every phase of a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Files accepted by the scanner
    pub total_files: usize,
    /// Their combined size
    pub total_size: u64,
    /// Entries skipped because they could not be read during the scan
    pub scan_errors: usize,
    /// Files eliminated because no other file has their size
    pub eliminated_by_size: usize,
    /// Bytes the hashing phase planned to read
    pub bytes_to_hash: u64,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Files that could not be read while hashing
    pub unreadable_files: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Members of those groups
    pub duplicate_files: usize,
    /// Space held by every copy but one per group
    pub reclaimable_space: u64,
    /// Whether digests only cover a prefix
    pub approximate: bool,
    /// Wall time of the search
    pub scan_duration: Duration,
}

/// Errors that abort a duplicate search.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// None of the roots exists or can be read.
    #[error("No accessible path among: {}", display_paths(.0))]
    NoAccessibleRoots(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs scan, size grouping and hashing in sequence.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a finder.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new(config.scope);
        Self { config, hasher }
    }

    /// Search the given roots recursively.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::NoAccessibleRoots`] when no root exists.
    /// Unreadable entries below an existing root are counted, not fatal.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        if !roots.iter().any(|r| r.exists()) {
            return Err(FinderError::NoAccessibleRoots(roots.to_vec()));
        }

        let start = Instant::now();
        let walker = Walker::new(roots.to_vec(), self.config.scan);
        let outcome = collect_records(walker.walk(), self.progress());
        Ok(self.finish(outcome, start))
    }

    /// Search an explicit list of file paths.
    pub fn find_duplicates_in_paths<I, P>(&self, paths: I) -> (Vec<DuplicateGroup>, ScanSummary)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let start = Instant::now();
        let outcome = collect_records(records_from_paths(paths, self.config.scan), self.progress());
        self.finish(outcome, start)
    }

    /// Group and hash already collected records.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> (Vec<DuplicateGroup>, ScanSummary) {
        let outcome = ScanOutcome {
            records,
            errors: Vec::new(),
        };
        self.finish(outcome, Instant::now())
    }

    fn progress(&self) -> Option<&dyn ProgressCallback> {
        self.config.hash.progress_callback.as_deref()
    }

    fn finish(&self, outcome: ScanOutcome, start: Instant) -> (Vec<DuplicateGroup>, ScanSummary) {
        for error in &outcome.errors {
            log::warn!("Skipped: {}", error);
        }

        let mut summary = ScanSummary {
            total_files: outcome.records.len(),
            total_size: outcome.total_size(),
            scan_errors: outcome.errors.len(),
            approximate: self.config.scope.is_approximate(),
            ..Default::default()
        };

        let (size_groups, size_stats) = group_by_size(outcome.records);
        summary.eliminated_by_size = size_stats.eliminated_unique;
        summary.bytes_to_hash = bytes_to_hash(&size_groups, self.config.scope);

        let (groups, hash_stats) = hash_size_groups(size_groups, &self.hasher, &self.config.hash);
        summary.hashed_files = hash_stats.hashed_files;
        summary.unreadable_files = hash_stats.unreadable_files;
        summary.duplicate_groups = hash_stats.duplicate_groups;
        summary.duplicate_files = hash_stats.duplicate_files;
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start.elapsed();

        log::info!(
            "Search complete in {:?}: {} groups, {} duplicate files, {} bytes reclaimable",
            summary.scan_duration,
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_space
        );

        (groups, summary)
    }
}
