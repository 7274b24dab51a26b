//! Version management: the immutable multi-version view of the table
//! layout and the edit/manifest protocol that advances it.
//!
//! - **FileMetadata**: identity and accounting for one table file
//! - **Version**: immutable snapshot of all files organized by level
//! - **VersionEdit**: delta applied to a Version, serialized to the manifest
//! - **Manifest**: append-only record log of VersionEdits
//! - **VersionSet**: owns the current Version, applies edits, recovers,
//!   and picks compactions
//!
//! # File organization
//!
//! ```text
//! Level 0:  [T-9] [T-8] [T-7]          (overlapping keys, newest first)
//! Level 1:  [T-4][T-5][T-6]            (non-overlapping, sorted)
//! Level 2:  [T-1][T-2][T-3][T-10]      (non-overlapping, sorted)
//! ...
//! ```
//!
//! # Recovery
//!
//! On startup:
//! 1. Read CURRENT to find the active manifest
//! 2. Replay every VersionEdit from the manifest
//! 3. Reconstruct the current Version and counters

mod file_metadata;
mod manifest;
mod version;
mod version_edit;
mod version_set;

pub use file_metadata::{total_file_size, FileMetadata};
pub use manifest::{Manifest, ManifestReader, ManifestWriter};
pub use version::{GetStats, Version};
pub use version_edit::VersionEdit;
pub use version_set::VersionSet;

/// Tag values for encoding VersionEdit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EditTag {
    /// Comparator name.
    Comparator = 1,
    /// Log number.
    LogNumber = 2,
    /// Next file number.
    NextFileNumber = 3,
    /// Last sequence number.
    LastSequence = 4,
    /// Compaction pointer for a level.
    CompactPointer = 5,
    /// Deleted file (level, file_number).
    DeletedFile = 6,
    /// New file (level, file_number, size, smallest, largest).
    NewFile = 7,
    /// Previous log number.
    PrevLogNumber = 9,
}

impl EditTag {
    /// Create from byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(EditTag::Comparator),
            2 => Some(EditTag::LogNumber),
            3 => Some(EditTag::NextFileNumber),
            4 => Some(EditTag::LastSequence),
            5 => Some(EditTag::CompactPointer),
            6 => Some(EditTag::DeletedFile),
            7 => Some(EditTag::NewFile),
            9 => Some(EditTag::PrevLogNumber),
            _ => None,
        }
    }

    /// Convert to byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}
