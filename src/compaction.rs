//! Compaction descriptor: a selected compaction and the progress state
//! the merge driver consults while producing output files.
//!
//! The descriptor does not read keys or write tables itself. The driver
//! merges the inputs externally and uses [`Compaction::should_stop_before`]
//! to split its output, [`Compaction::is_base_level_for_key`] to drop
//! tombstones, and [`Compaction::add_input_deletions`] to assemble the
//! commit edit.

use std::sync::Arc;

use crate::options::{Options, MAX_LEVELS};
use crate::types::InternalKey;
use crate::version::{total_file_size, FileMetadata, Version, VersionEdit};

/// A planned compaction from `level` into `level + 1`.
pub struct Compaction {
    /// Level being compacted. Inputs come from `level` and `level + 1`.
    level: usize,
    /// Maximum size of an output file built by this compaction.
    max_output_file_size: u64,
    /// Grandparent-overlap bound, shared by the trivial-move check and
    /// the output-split oracle.
    max_grandparent_overlap_bytes: u64,
    /// Version the inputs were selected from, pinned until release.
    input_version: Option<Arc<Version>>,
    /// Edit accumulating the outcome of this compaction.
    edit: VersionEdit,
    /// inputs[0] holds the `level` files, inputs[1] the `level + 1`
    /// files they overlap.
    inputs: [Vec<Arc<FileMetadata>>; 2],
    /// Files at `level + 2` overlapping this compaction. Overlap with
    /// these bounds the work of the next compaction down.
    grandparents: Vec<Arc<FileMetadata>>,

    /// Position in `grandparents` for the output-split oracle.
    grandparent_index: usize,
    /// Whether any output key has been seen yet.
    seen_key: bool,
    /// Bytes of grandparent overlap accumulated for the current output.
    overlapped_bytes: u64,

    /// Per-level cursors for the tombstone-drop check. Valid because the
    /// driver presents keys in non-decreasing user-key order.
    level_ptrs: [usize; MAX_LEVELS],
}

impl Compaction {
    /// Create an empty compaction at `level`; the version set fills in
    /// the inputs.
    pub(crate) fn new(options: &Options, level: usize) -> Self {
        Self {
            level,
            max_output_file_size: options.target_file_size,
            max_grandparent_overlap_bytes: options.max_grandparent_overlap_bytes(),
            input_version: None,
            edit: VersionEdit::new(),
            inputs: [Vec::new(), Vec::new()],
            grandparents: Vec::new(),
            grandparent_index: 0,
            seen_key: false,
            overlapped_bytes: 0,
            level_ptrs: [0; MAX_LEVELS],
        }
    }

    /// The level being compacted.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The level output files are written to. The last level compacts
    /// into itself.
    pub fn output_level(&self) -> usize {
        std::cmp::min(self.level + 1, MAX_LEVELS - 1)
    }

    /// Maximum size of files to build during this compaction.
    pub fn max_output_file_size(&self) -> u64 {
        self.max_output_file_size
    }

    /// Number of input files at `level() + which`.
    pub fn num_input_files(&self, which: usize) -> usize {
        self.inputs[which].len()
    }

    /// The i-th input file at `level() + which`.
    pub fn input(&self, which: usize, i: usize) -> &Arc<FileMetadata> {
        &self.inputs[which][i]
    }

    /// Input files at `level() + which`.
    pub fn inputs(&self, which: usize) -> &[Arc<FileMetadata>] {
        &self.inputs[which]
    }

    pub(crate) fn inputs_mut(&mut self, which: usize) -> &mut Vec<Arc<FileMetadata>> {
        &mut self.inputs[which]
    }

    /// The grandparent files overlapping this compaction.
    pub fn grandparents(&self) -> &[Arc<FileMetadata>] {
        &self.grandparents
    }

    pub(crate) fn grandparents_mut(&mut self) -> &mut Vec<Arc<FileMetadata>> {
        &mut self.grandparents
    }

    /// The version the inputs were drawn from.
    pub fn input_version(&self) -> Option<&Arc<Version>> {
        self.input_version.as_ref()
    }

    pub(crate) fn set_input_version(&mut self, version: Arc<Version>) {
        self.input_version = Some(version);
    }

    /// The edit that records this compaction's deletions and additions.
    pub fn edit(&self) -> &VersionEdit {
        &self.edit
    }

    /// Mutable access to the pending edit, for registering output files.
    pub fn edit_mut(&mut self) -> &mut VersionEdit {
        &mut self.edit
    }

    /// Total byte size of all input files.
    pub fn total_input_size(&self) -> u64 {
        total_file_size(&self.inputs[0]) + total_file_size(&self.inputs[1])
    }

    /// True iff this compaction can be implemented by re-parenting a
    /// single file to the next level, with no merge: one source file,
    /// nothing overlapping below, and little enough grandparent overlap
    /// that the move does not set up an oversized future compaction.
    pub fn is_trivial_move(&self) -> bool {
        self.num_input_files(0) == 1
            && self.num_input_files(1) == 0
            && total_file_size(&self.grandparents) <= self.max_grandparent_overlap_bytes
    }

    /// Add every input file at both levels to `edit` as a deletion.
    pub fn add_input_deletions(&self, edit: &mut VersionEdit) {
        for (which, files) in self.inputs.iter().enumerate() {
            for file in files {
                edit.delete_file(self.level + which, file.file_number());
            }
        }
    }

    /// True iff no file in levels below the output level contains
    /// `user_key`, so a tombstone for it has nothing left to shadow and
    /// can be dropped.
    ///
    /// The per-level cursors only ever advance; callers must present
    /// keys in non-decreasing user-key order, which the merge driver
    /// guarantees.
    pub fn is_base_level_for_key(&mut self, user_key: &[u8]) -> bool {
        let version = match &self.input_version {
            Some(version) => version,
            None => return false,
        };

        for level in (self.level + 2)..MAX_LEVELS {
            let files = version.files(level);
            while self.level_ptrs[level] < files.len() {
                let file = &files[self.level_ptrs[level]];
                if user_key <= file.largest().user_key() {
                    if user_key >= file.smallest().user_key() {
                        return false;
                    }
                    break;
                }
                // The key is past this file and keys only move forward.
                self.level_ptrs[level] += 1;
            }
        }
        true
    }

    /// True iff the current output file should be finalized before
    /// processing `internal_key`.
    ///
    /// Tracks how many grandparent bytes the notional current output
    /// overlaps; once that exceeds the bound, cutting the output here
    /// keeps the eventual compaction of that output cheap.
    pub fn should_stop_before(&mut self, internal_key: &InternalKey) -> bool {
        while self.grandparent_index < self.grandparents.len()
            && internal_key > self.grandparents[self.grandparent_index].largest()
        {
            if self.seen_key {
                self.overlapped_bytes +=
                    self.grandparents[self.grandparent_index].file_size();
            }
            self.grandparent_index += 1;
        }
        self.seen_key = true;

        if self.overlapped_bytes > self.max_grandparent_overlap_bytes {
            // Start accounting for the next output file.
            self.overlapped_bytes = 0;
            true
        } else {
            false
        }
    }

    /// Drop the pinned input version once the compaction has committed
    /// (or been abandoned).
    pub fn release_inputs(&mut self) {
        self.input_version = None;
    }
}
