//! VersionSet - owns the current Version and advances it atomically.
//!
//! The VersionSet is responsible for:
//! - Tracking the current Version and every version still pinned by
//!   readers or compactions
//! - Applying VersionEdits: serialize to the manifest, fsync, install
//! - Recovering the layout from the manifest on startup
//! - Allocating file numbers and tracking the last sequence number
//! - Picking the next compaction and bounding its inputs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use log::{error, info};
use parking_lot::{Mutex, RwLock};

use crate::compaction::Compaction;
use crate::options::{Options, MAX_LEVELS};
use crate::types::InternalKey;
use crate::util::comparator::{BytewiseComparator, Comparator};
use crate::util::filename::{
    delete_file, manifest_file_path, parse_file_name, read_current_file, set_current_file,
    FileType,
};
use crate::{Error, Result};

use super::{total_file_size, FileMetadata, Manifest, ManifestReader, Version, VersionEdit};

/// Manages the set of versions and the durable manifest.
pub struct VersionSet {
    /// Database directory path.
    db_path: PathBuf,
    /// Database options.
    options: Arc<Options>,
    /// Name of the user comparator, pinned at creation and persisted.
    comparator_name: String,
    /// Current version (atomically swappable; readers pin it via Arc).
    current: ArcSwap<Version>,
    /// Every version that may still be alive. A version stays alive while
    /// any reader or compaction holds its Arc; entries whose last Arc
    /// dropped are pruned opportunistically.
    live_versions: Mutex<Vec<Weak<Version>>>,
    /// Next file number to allocate.
    next_file_number: AtomicU64,
    /// Last used sequence number.
    last_sequence: AtomicU64,
    /// Current log file number.
    log_number: AtomicU64,
    /// Log file of the memtable currently being compacted, or 0.
    prev_log_number: AtomicU64,
    /// File number of the open (or most recent) manifest.
    manifest_number: AtomicU64,
    /// Open manifest stream. The lock is held across append+sync+install,
    /// which serializes appliers; no other operation does I/O under it.
    manifest: Mutex<Option<Manifest>>,
    /// Per-level key where the next size-driven compaction resumes.
    compact_pointers: RwLock<[Option<InternalKey>; MAX_LEVELS]>,
}

impl VersionSet {
    /// Create a new VersionSet over `db_path`.
    ///
    /// File number 1 is reserved for the first manifest, so allocation
    /// starts at 2. Call [`create`](Self::create) for a fresh database or
    /// [`recover`](Self::recover) for an existing one before use.
    pub fn new(db_path: &Path, options: Arc<Options>) -> Self {
        let initial = Arc::new(Version::new());
        Self {
            db_path: db_path.to_path_buf(),
            options,
            comparator_name: BytewiseComparator::new().name().to_string(),
            live_versions: Mutex::new(vec![Arc::downgrade(&initial)]),
            current: ArcSwap::new(initial),
            next_file_number: AtomicU64::new(2),
            last_sequence: AtomicU64::new(0),
            log_number: AtomicU64::new(0),
            prev_log_number: AtomicU64::new(0),
            manifest_number: AtomicU64::new(1),
            manifest: Mutex::new(None),
            compact_pointers: RwLock::new(Default::default()),
        }
    }

    /// Get the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the comparator name persisted in the manifest.
    pub fn comparator_name(&self) -> &str {
        &self.comparator_name
    }

    /// Get the current version. The returned Arc pins the version's file
    /// set for as long as it is held.
    pub fn current(&self) -> Arc<Version> {
        self.current.load_full()
    }

    /// Allocate and return a new file number.
    pub fn new_file_number(&self) -> u64 {
        self.next_file_number.fetch_add(1, Ordering::SeqCst)
    }

    /// Get the next file number without allocating.
    pub fn next_file_number(&self) -> u64 {
        self.next_file_number.load(Ordering::SeqCst)
    }

    /// Arrange to reuse `file_number` unless a newer number has already
    /// been handed out.
    pub fn reuse_file_number(&self, file_number: u64) {
        let _ = self.next_file_number.compare_exchange(
            file_number + 1,
            file_number,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Mark a file number as used so it is never allocated again.
    pub fn mark_file_number_used(&self, number: u64) {
        let mut current = self.next_file_number.load(Ordering::SeqCst);
        while current <= number {
            match self.next_file_number.compare_exchange(
                current,
                number + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Get the last sequence number.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::SeqCst)
    }

    /// Set the last sequence number. Must not move backwards.
    pub fn set_last_sequence(&self, seq: u64) {
        debug_assert!(seq >= self.last_sequence());
        self.last_sequence.store(seq, Ordering::SeqCst);
    }

    /// Get the current log file number.
    pub fn log_number(&self) -> u64 {
        self.log_number.load(Ordering::SeqCst)
    }

    /// Get the previous log number (memtable being compacted), or 0.
    pub fn prev_log_number(&self) -> u64 {
        self.prev_log_number.load(Ordering::SeqCst)
    }

    /// Get the manifest file number.
    pub fn manifest_number(&self) -> u64 {
        self.manifest_number.load(Ordering::SeqCst)
    }

    /// Number of files at a level of the current version.
    pub fn num_level_files(&self, level: usize) -> usize {
        self.current().num_files(level)
    }

    /// Combined size of files at a level of the current version.
    pub fn num_level_bytes(&self, level: usize) -> u64 {
        self.current().level_size(level)
    }

    /// Whether some level needs compaction, by size pressure or an
    /// exhausted seek budget.
    pub fn needs_compaction(&self) -> bool {
        self.current().needs_compaction()
    }

    /// Compact pointer for a level, if one has been recorded.
    pub fn compact_pointer(&self, level: usize) -> Option<InternalKey> {
        self.compact_pointers.read()[level].clone()
    }

    /// One-line per-level summary of the current version.
    pub fn level_summary(&self) -> String {
        self.current().summary()
    }

    /// Bootstrap a fresh database: write manifest 1 holding the initial
    /// state and point CURRENT at it.
    pub fn create(&self) -> Result<()> {
        let mut edit = VersionEdit::new();
        edit.set_comparator(self.comparator_name.clone());
        edit.set_log_number(self.log_number());
        edit.set_next_file_number(self.next_file_number());
        edit.set_last_sequence(self.last_sequence());

        let manifest_number = self.manifest_number();
        let mut manifest = Manifest::create(&self.db_path, manifest_number)?;
        let result = manifest
            .log_edit(&edit)
            .and_then(|_| manifest.sync())
            .and_then(|_| set_current_file(&self.db_path, manifest_number).map_err(Error::from));

        if let Err(err) = result {
            let path = manifest.path().to_path_buf();
            drop(manifest);
            let _ = delete_file(&path);
            return Err(err);
        }

        *self.manifest.lock() = Some(manifest);
        info!("created database with manifest {:06}", manifest_number);
        Ok(())
    }

    /// Recover the last saved state from the manifest named by CURRENT.
    ///
    /// Returns `save_manifest`: true when the old manifest is too large
    /// to keep appending to, so the next [`log_and_apply`]
    /// (Self::log_and_apply) must write a fresh manifest with a snapshot.
    pub fn recover(&self) -> Result<bool> {
        let current_name = read_current_file(&self.db_path)?;
        let manifest_number = match parse_file_name(&current_name) {
            Some((FileType::Manifest, number)) => number,
            _ => {
                return Err(Error::corruption(format!(
                    "CURRENT names no manifest: {}",
                    current_name
                )))
            }
        };

        let manifest_path = manifest_file_path(&self.db_path, manifest_number);
        let mut reader = ManifestReader::open(&manifest_path)?;

        let mut builder = VersionBuilder::new();
        let mut pointers: [Option<InternalKey>; MAX_LEVELS] = Default::default();

        let mut comparator_seen = false;
        let mut log_number = None;
        let mut prev_log_number = None;
        let mut next_file_number = None;
        let mut last_sequence = None;

        while let Some(edit) = reader.read_edit()? {
            if let Some(name) = &edit.comparator {
                if name != &self.comparator_name {
                    return Err(Error::invalid_argument(format!(
                        "comparator mismatch: manifest has {}, database uses {}",
                        name, self.comparator_name
                    )));
                }
                comparator_seen = true;
            }

            builder.apply(&edit, &self.options);

            for (level, key) in &edit.compact_pointers {
                pointers[*level] = Some(key.clone());
            }

            if let Some(num) = edit.log_number {
                log_number = Some(num);
            }
            if let Some(num) = edit.prev_log_number {
                prev_log_number = Some(num);
            }
            if let Some(num) = edit.next_file_number {
                next_file_number = Some(num);
            }
            if let Some(seq) = edit.last_sequence {
                last_sequence = Some(seq);
            }
        }

        if !comparator_seen {
            return Err(Error::corruption("no comparator name in manifest"));
        }
        let next_file_number =
            next_file_number.ok_or_else(|| Error::corruption("no next file number in manifest"))?;
        let log_number =
            log_number.ok_or_else(|| Error::corruption("no log number in manifest"))?;
        let last_sequence =
            last_sequence.ok_or_else(|| Error::corruption("no last sequence in manifest"))?;
        let prev_log_number = prev_log_number.unwrap_or(0);

        self.next_file_number.store(next_file_number, Ordering::SeqCst);
        self.last_sequence.store(last_sequence, Ordering::SeqCst);
        self.log_number.store(log_number, Ordering::SeqCst);
        self.prev_log_number.store(prev_log_number, Ordering::SeqCst);
        self.mark_file_number_used(log_number);
        self.mark_file_number_used(prev_log_number);
        self.manifest_number.store(manifest_number, Ordering::SeqCst);
        *self.compact_pointers.write() = pointers;

        let version = builder.build(&Version::new(), &self.options)?;
        let version = self.install_version(version);
        info!(
            "recovered manifest {:06}: {}",
            manifest_number,
            version.summary()
        );

        // Keep appending to a small manifest; a large one is rewritten
        // with a snapshot on the next edit.
        let manifest_size = std::fs::metadata(&manifest_path)?.len();
        if manifest_size < self.options.max_manifest_file_size {
            *self.manifest.lock() = Some(Manifest::open(&self.db_path, manifest_number)?);
            Ok(false)
        } else {
            Ok(true)
        }
    }

    /// Apply `edit` to the current version, persist it to the manifest,
    /// and install the result as the new current version.
    ///
    /// Appliers are serialized; on any manifest or CURRENT failure the
    /// new version is discarded and the in-memory state is unchanged.
    pub fn log_and_apply(&self, edit: &mut VersionEdit) -> Result<()> {
        if let Some(log) = edit.log_number {
            debug_assert!(log >= self.log_number() && log < self.next_file_number());
        } else {
            edit.set_log_number(self.log_number());
        }
        if edit.prev_log_number.is_none() {
            edit.set_prev_log_number(self.prev_log_number());
        }
        if edit.last_sequence.is_none() {
            edit.set_last_sequence(self.last_sequence());
        }

        let current = self.current();
        let mut builder = VersionBuilder::new();
        builder.apply(edit, &self.options);
        let version = builder.build(&current, &self.options)?;

        let mut manifest_guard = self.manifest.lock();

        // Rotate once the open manifest has grown past the threshold; the
        // replacement starts with a snapshot, so the old file can go.
        let mut retiring_manifest: Option<PathBuf> = None;
        if let Some(manifest) = manifest_guard.as_ref() {
            if manifest.file_size() >= self.options.max_manifest_file_size {
                retiring_manifest = Some(manifest.path().to_path_buf());
                *manifest_guard = None;
            }
        }

        let mut created_new = false;
        if manifest_guard.is_none() {
            let manifest_number = self.new_file_number();
            let mut manifest = Manifest::create(&self.db_path, manifest_number)?;
            if let Err(err) = manifest.log_edit(&self.snapshot_edit(&current)) {
                let path = manifest.path().to_path_buf();
                drop(manifest);
                let _ = delete_file(&path);
                return Err(err);
            }
            self.manifest_number.store(manifest_number, Ordering::SeqCst);
            *manifest_guard = Some(manifest);
            created_new = true;
        }

        // Stamped after a rotation may have drawn a file number, so the
        // recorded allocator stays ahead of every number handed out.
        if edit.next_file_number.is_none() {
            edit.set_next_file_number(self.next_file_number());
        }

        let manifest = manifest_guard
            .as_mut()
            .ok_or_else(|| Error::internal("no active manifest"))?;

        let write_result = manifest
            .log_edit(edit)
            .and_then(|_| manifest.sync())
            .and_then(|_| {
                if created_new {
                    set_current_file(&self.db_path, manifest.manifest_number())
                        .map_err(Error::from)
                } else {
                    Ok(())
                }
            });

        if let Err(err) = write_result {
            error!("manifest write failed, rolling back edit: {}", err);
            if created_new {
                let path = manifest.path().to_path_buf();
                *manifest_guard = None;
                let _ = delete_file(&path);
            }
            return Err(err);
        }

        if created_new {
            info!(
                "switched to manifest {:06}",
                manifest.manifest_number()
            );
            if let Some(old_path) = retiring_manifest {
                let _ = delete_file(&old_path);
            }
        }

        // Durable; install and publish the counters the edit carries.
        self.install_version(version);

        if let Some(num) = edit.log_number {
            self.log_number.store(num, Ordering::SeqCst);
        }
        if let Some(num) = edit.prev_log_number {
            self.prev_log_number.store(num, Ordering::SeqCst);
        }
        if let Some(seq) = edit.last_sequence {
            if seq > self.last_sequence() {
                self.last_sequence.store(seq, Ordering::SeqCst);
            }
        }
        {
            let mut pointers = self.compact_pointers.write();
            for (level, key) in &edit.compact_pointers {
                pointers[*level] = Some(key.clone());
            }
        }

        Ok(())
    }

    /// Add the numbers of all files listed in any live version to `live`.
    /// Any on-disk table absent from this set belongs to no reader and
    /// may be deleted.
    pub fn add_live_files(&self, live: &mut HashSet<u64>) {
        let mut versions = self.live_versions.lock();
        versions.retain(|weak| {
            if let Some(version) = weak.upgrade() {
                for (_, file) in version.all_files() {
                    live.insert(file.file_number());
                }
                true
            } else {
                false
            }
        });
    }

    /// Pick level and inputs for a new compaction, or None if no
    /// compaction is needed. Size pressure takes priority over exhausted
    /// seek budgets.
    pub fn pick_compaction(&self) -> Option<Compaction> {
        let current = self.current();

        let mut c = if current.compaction_score() >= 1.0 {
            let level = current.compaction_level();
            debug_assert!(level + 1 < MAX_LEVELS);
            let mut c = Compaction::new(&self.options, level);

            // Resume after the last compacted key at this level; wrap to
            // the first file once the pointer passes every file.
            {
                let pointers = self.compact_pointers.read();
                for file in current.files(level) {
                    match &pointers[level] {
                        Some(ptr) if file.largest() <= ptr => continue,
                        _ => {
                            c.inputs_mut(0).push(Arc::clone(file));
                            break;
                        }
                    }
                }
            }
            if c.num_input_files(0) == 0 {
                if let Some(file) = current.files(level).first() {
                    c.inputs_mut(0).push(Arc::clone(file));
                }
            }
            if c.num_input_files(0) == 0 {
                return None;
            }
            c
        } else if let Some((file, level)) = current.seek_compaction() {
            let mut c = Compaction::new(&self.options, level);
            c.inputs_mut(0).push(file);
            c
        } else {
            return None;
        };

        // Level-0 files may overlap each other: widen the pick to every
        // level-0 file overlapping its range.
        if c.level() == 0 {
            let (smallest, largest) = key_range(c.inputs(0));
            let expanded = current.get_overlapping_inputs(
                0,
                Some(smallest.user_key()),
                Some(largest.user_key()),
            );
            debug_assert!(!expanded.is_empty());
            *c.inputs_mut(0) = expanded;
        }

        self.setup_other_inputs(&current, &mut c, true);
        c.set_input_version(current);
        Some(c)
    }

    /// Return a compaction covering the files overlapping `[begin, end]`
    /// at `level`, or None if nothing there overlaps. Manual compactions
    /// at levels > 0 are truncated to bound their latency.
    pub fn compact_range(
        &self,
        level: usize,
        begin: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Option<Compaction> {
        let current = self.current();
        let mut inputs = current.get_overlapping_inputs(level, begin, end);
        if inputs.is_empty() {
            return None;
        }

        // Level-0 files overlap, so every overlapping file must come
        // along; deeper levels can stop once enough bytes are gathered.
        if level > 0 {
            let limit = self.options.target_file_size;
            let mut total = 0u64;
            for (i, file) in inputs.iter().enumerate() {
                total += file.file_size();
                if total >= limit {
                    inputs.truncate(i + 1);
                    break;
                }
            }
        }

        let mut c = Compaction::new(&self.options, level);
        *c.inputs_mut(0) = inputs;
        // A manual compaction keeps the caller's range: no self-expansion.
        self.setup_other_inputs(&current, &mut c, false);
        c.set_input_version(current);
        Some(c)
    }

    /// Largest overlap (in bytes) between any single file at a level >= 1
    /// and the level below it.
    pub fn max_next_level_overlapping_bytes(&self) -> u64 {
        let current = self.current();
        let mut result = 0;
        for level in 1..MAX_LEVELS - 1 {
            for file in current.files(level) {
                let overlaps = current.get_overlapping_inputs(
                    level + 1,
                    Some(file.smallest().user_key()),
                    Some(file.largest().user_key()),
                );
                result = std::cmp::max(result, total_file_size(&overlaps));
            }
        }
        result
    }

    /// Fill in `inputs[1]`, opportunistically widen `inputs[0]` (unless
    /// the caller pinned the range), record grandparents, and advance the
    /// level's compact pointer.
    fn setup_other_inputs(&self, current: &Version, c: &mut Compaction, allow_expansion: bool) {
        let level = c.level();
        let (_, mut largest) = key_range(c.inputs(0));

        if level + 1 < MAX_LEVELS {
            let (smallest, _) = key_range(c.inputs(0));
            *c.inputs_mut(1) = current.get_overlapping_inputs(
                level + 1,
                Some(smallest.user_key()),
                Some(largest.user_key()),
            );
        }

        let (mut all_smallest, mut all_largest) = key_range2(c.inputs(0), c.inputs(1));

        // Try to grow inputs[0] to everything at this level inside the
        // union range, as long as that does not change inputs[1] and the
        // total stays under the expansion cap.
        if allow_expansion && !c.inputs(1).is_empty() {
            let expanded0 = current.get_overlapping_inputs(
                level,
                Some(all_smallest.user_key()),
                Some(all_largest.user_key()),
            );
            let inputs0_size = total_file_size(c.inputs(0));
            let inputs1_size = total_file_size(c.inputs(1));
            let expanded0_size = total_file_size(&expanded0);

            if expanded0.len() > c.num_input_files(0)
                && inputs1_size + expanded0_size
                    < self.options.expanded_compaction_byte_size_limit()
            {
                let (new_smallest, new_largest) = key_range(&expanded0);
                let expanded1 = current.get_overlapping_inputs(
                    level + 1,
                    Some(new_smallest.user_key()),
                    Some(new_largest.user_key()),
                );
                if expanded1.len() == c.num_input_files(1) {
                    info!(
                        "expanding@{} {}+{} ({}+{} bytes) to {}+{} ({}+{} bytes)",
                        level,
                        c.num_input_files(0),
                        c.num_input_files(1),
                        inputs0_size,
                        inputs1_size,
                        expanded0.len(),
                        expanded1.len(),
                        expanded0_size,
                        total_file_size(&expanded1),
                    );
                    largest = new_largest;
                    *c.inputs_mut(0) = expanded0;
                    *c.inputs_mut(1) = expanded1;
                    let (s, l) = key_range2(c.inputs(0), c.inputs(1));
                    all_smallest = s;
                    all_largest = l;
                }
            }
        }

        if level + 2 < MAX_LEVELS {
            *c.grandparents_mut() = current.get_overlapping_inputs(
                level + 2,
                Some(all_smallest.user_key()),
                Some(all_largest.user_key()),
            );
        }

        // Advance the pointer now rather than when the edit commits, so a
        // failed compaction retries a different key range.
        self.compact_pointers.write()[level] = Some(largest.clone());
        c.edit_mut().set_compact_pointer(level, largest);
    }

    /// Build the synthetic edit that makes a fresh manifest
    /// self-contained: comparator name, every compact pointer, and one
    /// new-file record per file of `current`.
    fn snapshot_edit(&self, current: &Version) -> VersionEdit {
        let mut edit = VersionEdit::new();
        edit.set_comparator(self.comparator_name.clone());

        {
            let pointers = self.compact_pointers.read();
            for (level, pointer) in pointers.iter().enumerate() {
                if let Some(key) = pointer {
                    edit.set_compact_pointer(level, key.clone());
                }
            }
        }

        for (level, file) in current.all_files() {
            edit.add_file_info(
                level,
                file.file_number(),
                file.file_size(),
                file.smallest().clone(),
                file.largest().clone(),
            );
        }

        edit
    }

    /// Register a freshly built version and make it current.
    fn install_version(&self, version: Version) -> Arc<Version> {
        let version = Arc::new(version);
        {
            let mut live = self.live_versions.lock();
            live.retain(|weak| weak.strong_count() > 0);
            live.push(Arc::downgrade(&version));
        }
        self.current.store(Arc::clone(&version));
        version
    }
}

/// Smallest and largest internal keys over a non-empty set of files.
fn key_range(files: &[Arc<FileMetadata>]) -> (InternalKey, InternalKey) {
    debug_assert!(!files.is_empty());
    let mut smallest = files[0].smallest().clone();
    let mut largest = files[0].largest().clone();
    for file in &files[1..] {
        if file.smallest() < &smallest {
            smallest = file.smallest().clone();
        }
        if file.largest() > &largest {
            largest = file.largest().clone();
        }
    }
    (smallest, largest)
}

/// Key range over the union of two file sets.
fn key_range2(
    inputs0: &[Arc<FileMetadata>],
    inputs1: &[Arc<FileMetadata>],
) -> (InternalKey, InternalKey) {
    let (mut smallest, mut largest) = key_range(inputs0);
    if !inputs1.is_empty() {
        let (s, l) = key_range(inputs1);
        if s < smallest {
            smallest = s;
        }
        if l > largest {
            largest = l;
        }
    }
    (smallest, largest)
}

/// Accumulates the deletions and additions of one or more edits, then
/// materializes a new Version from a base.
struct VersionBuilder {
    deleted: [HashSet<u64>; MAX_LEVELS],
    added: [Vec<Arc<FileMetadata>>; MAX_LEVELS],
}

impl VersionBuilder {
    fn new() -> Self {
        Self {
            deleted: Default::default(),
            added: Default::default(),
        }
    }

    /// Fold one edit into the working set.
    fn apply(&mut self, edit: &VersionEdit, options: &Options) {
        for &(level, file_number) in &edit.deleted_files {
            self.deleted[level].insert(file_number);
        }

        for (level, file) in &edit.new_files {
            debug_assert!(
                !edit.deleted_files.contains(&(*level, file.file_number())),
                "file {} both added and deleted at level {}",
                file.file_number(),
                level
            );

            let file = Arc::new(FileMetadata::new(
                file.file_number(),
                file.file_size(),
                file.smallest().clone(),
                file.largest().clone(),
            ));
            file.set_allowed_seeks(options.allowed_seeks_for_file(file.file_size()));

            // A later edit may re-add a file deleted earlier in the
            // stream.
            self.deleted[*level].remove(&file.file_number());
            self.added[*level].push(file);
        }
    }

    /// Merge the working set into `base` and produce a finalized Version.
    fn build(self, base: &Version, options: &Options) -> Result<Version> {
        let mut files: [Vec<Arc<FileMetadata>>; MAX_LEVELS] = Default::default();

        for (level, (deleted, added)) in
            self.deleted.into_iter().zip(self.added.into_iter()).enumerate()
        {
            let mut level_files: Vec<Arc<FileMetadata>> = Vec::new();
            let mut seen = HashSet::new();

            // Later additions win over earlier ones with the same number.
            for file in added.into_iter().rev() {
                if !deleted.contains(&file.file_number()) && seen.insert(file.file_number()) {
                    level_files.push(file);
                }
            }
            for file in base.files(level) {
                if !deleted.contains(&file.file_number()) && seen.insert(file.file_number()) {
                    level_files.push(Arc::clone(file));
                }
            }

            if level == 0 {
                // Newest first for lookups.
                level_files.sort_by(|a, b| b.file_number().cmp(&a.file_number()));
            } else {
                level_files.sort_by(|a, b| a.smallest().cmp(b.smallest()));

                for pair in level_files.windows(2) {
                    if pair[0].largest() >= pair[1].smallest() {
                        return Err(Error::corruption(format!(
                            "overlapping files {} and {} at level {}",
                            pair[0].file_number(),
                            pair[1].file_number(),
                            level
                        )));
                    }
                }
            }

            files[level] = level_files;
        }

        let mut version = Version::with_files(files);
        let (score, level) = compute_compaction_score(options, &version);
        version.set_compaction_info(score, level);
        Ok(version)
    }
}

/// Precompute the compaction hints for a version.
///
/// Level 0 is scored by file count against the trigger; deeper levels by
/// total bytes against a geometrically growing budget. The last level has
/// no deeper level to push into and is never scored.
fn compute_compaction_score(options: &Options, version: &Version) -> (f64, usize) {
    let mut best_score = version.num_files(0) as f64 / options.l0_compaction_trigger as f64;
    let mut best_level = 0;

    for level in 1..MAX_LEVELS - 1 {
        let score = version.level_size(level) as f64 / options.max_bytes_for_level(level) as f64;
        if score > best_score {
            best_score = score;
            best_level = level;
        }
    }

    (best_score, best_level)
}
