//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Digest-based sub-grouping of each size bucket
//! - Orchestration of the scan, group and hash phases

pub mod finder;
pub mod groups;

pub use finder::{
    hash_size_groups, DuplicateFinder, FinderConfig, FinderError, HashConfig, HashStats,
    ScanSummary, DEFAULT_IO_THREADS,
};
pub use groups::{
    bytes_to_hash, group_by_size, partition_by_digest, partition_by_size, DuplicateGroup,
    GroupingStats, SizeGroups,
};
