//! File metadata for sorted table files.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use crate::types::InternalKey;

/// Metadata about one immutable sorted table file.
///
/// Identity fields never change after creation. Shared ownership across
/// versions is expressed with `Arc<FileMetadata>`; a file whose metadata
/// is referenced by no live version is eligible for deletion.
#[derive(Debug)]
pub struct FileMetadata {
    /// Unique file number, drawn from the version set's allocator.
    file_number: u64,
    /// File size in bytes.
    file_size: u64,
    /// Smallest internal key in the file.
    smallest: InternalKey,
    /// Largest internal key in the file.
    largest: InternalKey,
    /// Seeks remaining before this file is scheduled for compaction.
    /// Updated on the read path without any lock.
    allowed_seeks: AtomicI64,
}

impl FileMetadata {
    /// Create new file metadata.
    ///
    /// The seek budget defaults to one seek per 16KB of file data with a
    /// floor of 100; the version builder re-seeds it from `Options` when
    /// the file is adopted into a version.
    pub fn new(
        file_number: u64,
        file_size: u64,
        smallest: InternalKey,
        largest: InternalKey,
    ) -> Self {
        let allowed_seeks = std::cmp::max(100, (file_size / 16384) as i64);

        Self {
            file_number,
            file_size,
            smallest,
            largest,
            allowed_seeks: AtomicI64::new(allowed_seeks),
        }
    }

    /// Get the file number.
    pub fn file_number(&self) -> u64 {
        self.file_number
    }

    /// Get the file size.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get the smallest key.
    pub fn smallest(&self) -> &InternalKey {
        &self.smallest
    }

    /// Get the largest key.
    pub fn largest(&self) -> &InternalKey {
        &self.largest
    }

    /// Get the remaining seek budget.
    pub fn allowed_seeks(&self) -> i64 {
        self.allowed_seeks.load(AtomicOrdering::Acquire)
    }

    /// Reset the seek budget. Called by the version builder when the file
    /// enters a version, with the engine-configured cost model.
    pub fn set_allowed_seeks(&self, seeks: i64) {
        self.allowed_seeks.store(seeks, AtomicOrdering::Release);
    }

    /// Charge one seek and return whether the budget is now exhausted.
    pub fn charge_seek(&self) -> bool {
        self.allowed_seeks.fetch_sub(1, AtomicOrdering::AcqRel) <= 1
    }

    /// Check if the file's user-key range overlaps `[smallest, largest]`.
    pub fn overlaps(&self, smallest: &[u8], largest: &[u8]) -> bool {
        self.largest.user_key() >= smallest && self.smallest.user_key() <= largest
    }

    /// Check if a user key might be in this file.
    pub fn may_contain_key(&self, user_key: &[u8]) -> bool {
        user_key >= self.smallest.user_key() && user_key <= self.largest.user_key()
    }
}

impl Clone for FileMetadata {
    fn clone(&self) -> Self {
        Self {
            file_number: self.file_number,
            file_size: self.file_size,
            smallest: self.smallest.clone(),
            largest: self.largest.clone(),
            allowed_seeks: AtomicI64::new(self.allowed_seeks()),
        }
    }
}

impl PartialEq for FileMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.file_number == other.file_number
    }
}

impl Eq for FileMetadata {}

impl PartialOrd for FileMetadata {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileMetadata {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort by smallest key first, then by file number for stability.
        match self.smallest.cmp(&other.smallest) {
            Ordering::Equal => self.file_number.cmp(&other.file_number),
            ord => ord,
        }
    }
}

/// Total byte size of a set of files.
pub fn total_file_size(files: &[std::sync::Arc<FileMetadata>]) -> u64 {
    files.iter().map(|f| f.file_size()).sum()
}
