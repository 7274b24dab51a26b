//! Configuration options for verdb.

/// Maximum number of levels in the LSM tree.
pub const MAX_LEVELS: usize = 7;

/// Default number of level-0 files that triggers compaction.
pub const DEFAULT_L0_COMPACTION_TRIGGER: usize = 4;

/// Default byte budget for level 1 (10MB). Each deeper level gets the
/// budget of the previous level times the multiplier.
pub const DEFAULT_MAX_BYTES_FOR_LEVEL_BASE: u64 = 10 * 1024 * 1024;

/// Default level size multiplier.
pub const DEFAULT_LEVEL_MULTIPLIER: u64 = 10;

/// Default target size for compaction output files (2MB).
pub const DEFAULT_TARGET_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Default manifest size at which the next edit rotates to a fresh
/// manifest, and above which recovery refuses to reuse the old one.
pub const DEFAULT_MAX_MANIFEST_FILE_SIZE: u64 = 1024 * 1024;

/// Default bytes of file data one wasted seek is worth. A file's seek
/// budget is its size divided by this.
pub const DEFAULT_SEEK_COST_BYTES: u64 = 16 * 1024;

/// Default floor on any file's seek budget.
pub const DEFAULT_MIN_ALLOWED_SEEKS: i64 = 100;

/// Deepest level a freshly flushed memtable may be pushed to when it
/// overlaps nothing above.
pub const MAX_MEM_COMPACT_LEVEL: usize = 2;

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Number of level-0 files that triggers compaction. Level 0 is
    /// bounded by file count rather than bytes because every level-0
    /// file may have to be consulted on a read.
    pub l0_compaction_trigger: usize,

    /// Byte budget for level 1.
    pub max_bytes_for_level_base: u64,

    /// Budget multiplier applied per level below level 1.
    pub max_bytes_for_level_multiplier: u64,

    /// Target size for compaction output files. The grandparent-overlap
    /// and expansion caps are derived from this.
    pub target_file_size: u64,

    /// Manifest size threshold for rotation and recovery reuse.
    pub max_manifest_file_size: u64,

    /// Bytes of file data per allowed seek when sizing a file's seek
    /// budget.
    pub seek_cost_bytes: u64,

    /// Minimum seek budget granted to any file.
    pub min_allowed_seeks: i64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            l0_compaction_trigger: DEFAULT_L0_COMPACTION_TRIGGER,
            max_bytes_for_level_base: DEFAULT_MAX_BYTES_FOR_LEVEL_BASE,
            max_bytes_for_level_multiplier: DEFAULT_LEVEL_MULTIPLIER,
            target_file_size: DEFAULT_TARGET_FILE_SIZE,
            max_manifest_file_size: DEFAULT_MAX_MANIFEST_FILE_SIZE,
            seek_cost_bytes: DEFAULT_SEEK_COST_BYTES,
            min_allowed_seeks: DEFAULT_MIN_ALLOWED_SEEKS,
        }
    }
}

impl Options {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the options.
    pub fn validate(&self) -> crate::Result<()> {
        if self.l0_compaction_trigger == 0 {
            return Err(crate::Error::invalid_argument(
                "l0_compaction_trigger must be at least 1",
            ));
        }
        if self.max_bytes_for_level_multiplier < 2 {
            return Err(crate::Error::invalid_argument(
                "max_bytes_for_level_multiplier must be at least 2",
            ));
        }
        if self.target_file_size < 1024 {
            return Err(crate::Error::invalid_argument(
                "target_file_size must be at least 1KB",
            ));
        }
        if self.seek_cost_bytes == 0 {
            return Err(crate::Error::invalid_argument(
                "seek_cost_bytes must be nonzero",
            ));
        }
        Ok(())
    }

    /// Byte budget for a given level. Level 0 has no byte budget; its
    /// pressure is measured in file count.
    pub fn max_bytes_for_level(&self, level: usize) -> u64 {
        debug_assert!(level >= 1);
        let mut size = self.max_bytes_for_level_base;
        for _ in 1..level {
            size = size.saturating_mul(self.max_bytes_for_level_multiplier);
        }
        size
    }

    /// Maximum bytes of grandparent overlap before a compaction output
    /// file is cut, and the bound under which a single-file compaction
    /// may be a trivial move.
    pub fn max_grandparent_overlap_bytes(&self) -> u64 {
        10 * self.target_file_size
    }

    /// Cap on the total input size when opportunistically widening a
    /// compaction's source-level inputs.
    pub fn expanded_compaction_byte_size_limit(&self) -> u64 {
        25 * self.target_file_size
    }

    /// Seek budget for a file of the given size.
    pub fn allowed_seeks_for_file(&self, file_size: u64) -> i64 {
        std::cmp::max(self.min_allowed_seeks, (file_size / self.seek_cost_bytes) as i64)
    }
}
