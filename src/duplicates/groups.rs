//! Size and digest partitioning.
//!
//! # Overview
//!
//! Duplicate detection runs two pure partitions:
//!
//! 1. [`partition_by_size`] splits scanned files into buckets of identical
//!    size. Files whose size is unique cannot have a duplicate and are
//!    dropped by [`group_by_size`] without ever being read.
//! 2. [`partition_by_digest`] splits one size bucket by content digest.
//!
//! Both return new collections; nothing is mutated in place.
//!
//! # Example
//!
//! ```
//! use dupesweep::scanner::FileRecord;
//! use dupesweep::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.candidate_files, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::scanner::{Digest, FileRecord, HashScope};

/// Files bucketed by exact size, in ascending size order.
pub type SizeGroups = BTreeMap<u64, Vec<FileRecord>>;

/// A confirmed set of files sharing size and digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Digest shared by every member
    pub digest: Digest,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Members in scan order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Digest, size: u64, files: Vec<FileRecord>) -> Self {
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Space held by every copy but one.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }

    /// Paths of the members, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Files in buckets of two or more (they will be hashed)
    pub candidate_files: usize,
    /// Files eliminated because their size is unique
    pub eliminated_unique: usize,
    /// Number of buckets with two or more files
    pub candidate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Partition files by exact size.
///
/// Every input record lands in exactly one bucket; bucket order follows
/// input order.
#[must_use]
pub fn partition_by_size(files: impl IntoIterator<Item = FileRecord>) -> SizeGroups {
    let mut groups = SizeGroups::new();
    for file in files {
        groups.entry(file.size).or_default().push(file);
    }
    groups
}

/// Group files by size, keeping only buckets that can contain duplicates.
///
/// # Returns
///
/// - the buckets with two or more files, keyed by size
/// - statistics about the grouping
///
/// # Example
///
/// ```
/// use dupesweep::scanner::FileRecord;
/// use dupesweep::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.txt"), 100),
///     FileRecord::new(PathBuf::from("/b.txt"), 100),
///     FileRecord::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups[&100].len(), 2);
/// assert!(!groups.contains_key(&200));
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileRecord>) -> (SizeGroups, GroupingStats) {
    let all_groups = partition_by_size(files);

    let mut stats = GroupingStats {
        unique_sizes: all_groups.len(),
        ..Default::default()
    };

    let candidates: SizeGroups = all_groups
        .into_iter()
        .filter(|(size, files)| {
            stats.total_files += files.len();
            stats.total_size += size * files.len() as u64;
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, files[0].path.display());
                false
            } else {
                stats.candidate_files += files.len();
                stats.candidate_groups += 1;
                log::debug!("Size group {} bytes: {} candidates", size, files.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files -> {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.candidate_files,
        stats.elimination_rate()
    );

    (candidates, stats)
}

/// Bytes that will be read to hash every candidate bucket under `scope`.
///
/// Only used to scale progress output.
#[must_use]
pub fn bytes_to_hash(groups: &SizeGroups, scope: HashScope) -> u64 {
    groups
        .iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(size, files)| scope.bytes_for(*size) * files.len() as u64)
        .sum()
}

/// Partition records by digest.
///
/// Digests appear in order of first occurrence and members keep their
/// input order. Records without a digest are keyed as
/// [`Digest::Unreadable`].
#[must_use]
pub fn partition_by_digest(
    files: impl IntoIterator<Item = FileRecord>,
) -> Vec<(Digest, Vec<FileRecord>)> {
    let mut index: HashMap<Digest, usize> = HashMap::new();
    let mut groups: Vec<(Digest, Vec<FileRecord>)> = Vec::new();

    for file in files {
        let digest = file.digest.unwrap_or(Digest::Unreadable);
        match index.get(&digest) {
            Some(&i) => groups[i].1.push(file),
            None => {
                index.insert(digest, groups.len());
                groups.push((digest, vec![file]));
            }
        }
    }

    groups
}
