//! Version - immutable snapshot of the active table files.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::cache::TableCache;
use crate::options::{Options, MAX_LEVELS, MAX_MEM_COMPACT_LEVEL};
use crate::types::{InternalKey, LookupResult};
use crate::version::total_file_size;
use crate::Result;

use super::FileMetadata;

/// Seek-charge accounting produced by a lookup.
///
/// Records the first file the lookup touched that did not produce the
/// final outcome; charging that file's seek budget is what eventually
/// pulls hot, overlapping files into compaction.
#[derive(Debug, Default)]
pub struct GetStats {
    /// File to charge one seek to, if the lookup touched more than one.
    pub seek_file: Option<Arc<FileMetadata>>,
    /// Level of `seek_file`.
    pub seek_file_level: usize,
}

/// An immutable snapshot of all table files at a point in time.
///
/// Versions are shared via `Arc`: readers and compactions pin the version
/// they operate on, so files are never deleted out from under them. For
/// every level >= 1 the file list is sorted by smallest key with pairwise
/// disjoint ranges; level-0 files may overlap and are ordered newest
/// first.
#[derive(Debug)]
pub struct Version {
    /// Files at each level.
    files: [Vec<Arc<FileMetadata>>; MAX_LEVELS],

    /// Total file size at each level.
    level_sizes: [u64; MAX_LEVELS],

    /// Compaction pressure; >= 1.0 means compaction is required.
    compaction_score: f64,

    /// Level achieving the maximum pressure.
    compaction_level: usize,

    /// File whose seek budget ran out, with its level. Set from the read
    /// path under the engine lock, consumed by compaction picking.
    seek_compaction: Mutex<Option<(Arc<FileMetadata>, usize)>>,
}

impl Version {
    /// Create an empty version.
    pub fn new() -> Self {
        Self {
            files: Default::default(),
            level_sizes: [0; MAX_LEVELS],
            compaction_score: 0.0,
            compaction_level: 0,
            seek_compaction: Mutex::new(None),
        }
    }

    /// Create a version with the given files.
    pub fn with_files(files: [Vec<Arc<FileMetadata>>; MAX_LEVELS]) -> Self {
        let mut level_sizes = [0u64; MAX_LEVELS];
        for (level, level_files) in files.iter().enumerate() {
            level_sizes[level] = total_file_size(level_files);
        }

        Self {
            files,
            level_sizes,
            compaction_score: 0.0,
            compaction_level: 0,
            seek_compaction: Mutex::new(None),
        }
    }

    /// Get files at a specific level.
    pub fn files(&self, level: usize) -> &[Arc<FileMetadata>] {
        &self.files[level]
    }

    /// Get number of files at a level.
    pub fn num_files(&self, level: usize) -> usize {
        self.files[level].len()
    }

    /// Get total number of files across all levels.
    pub fn total_files(&self) -> usize {
        self.files.iter().map(|f| f.len()).sum()
    }

    /// Get total size at a level.
    pub fn level_size(&self, level: usize) -> u64 {
        self.level_sizes[level]
    }

    /// Get the compaction score.
    pub fn compaction_score(&self) -> f64 {
        self.compaction_score
    }

    /// Get the level that should be compacted next.
    pub fn compaction_level(&self) -> usize {
        self.compaction_level
    }

    /// Set compaction hints. Called once, before the version is installed.
    pub(super) fn set_compaction_info(&mut self, score: f64, level: usize) {
        self.compaction_score = score;
        self.compaction_level = level;
    }

    /// Check if size pressure or an exhausted seek budget requires
    /// compaction.
    pub fn needs_compaction(&self) -> bool {
        self.compaction_score >= 1.0 || self.seek_compaction.lock().is_some()
    }

    /// The file whose seek budget ran out, if any.
    pub fn seek_compaction(&self) -> Option<(Arc<FileMetadata>, usize)> {
        self.seek_compaction.lock().clone()
    }

    /// Look up `user_key` as of `sequence`.
    ///
    /// Level 0 is searched newest-file-first among files whose range
    /// contains the key; for deeper levels the sorted, disjoint file list
    /// yields at most one candidate per level. The actual key lookup
    /// inside a file is delegated to the table cache. A tombstone stops
    /// the search.
    pub fn get(
        &self,
        cache: &dyn TableCache,
        user_key: &[u8],
        sequence: u64,
    ) -> Result<(LookupResult, GetStats)> {
        let mut stats = GetStats::default();
        let mut last_file_read: Option<(Arc<FileMetadata>, usize)> = None;
        let lookup = InternalKey::for_value(Bytes::copy_from_slice(user_key), sequence);

        // Level-0 files may overlap; builder order is newest first.
        for file in self.files[0].iter().filter(|f| f.may_contain_key(user_key)) {
            if let Some(result) =
                self.search_file(cache, file, 0, &lookup, &mut stats, &mut last_file_read)?
            {
                return Ok((result, stats));
            }
        }

        for level in 1..MAX_LEVELS {
            let files = &self.files[level];
            if files.is_empty() {
                continue;
            }

            let index = find_file(files, user_key);
            if index >= files.len() {
                continue;
            }
            let file = &files[index];
            if user_key < file.smallest().user_key() {
                continue;
            }

            if let Some(result) =
                self.search_file(cache, file, level, &lookup, &mut stats, &mut last_file_read)?
            {
                return Ok((result, stats));
            }
        }

        Ok((LookupResult::NotFound, stats))
    }

    /// Consult one file, maintaining the seek-charge bookkeeping.
    /// Returns Some when the search is over.
    fn search_file(
        &self,
        cache: &dyn TableCache,
        file: &Arc<FileMetadata>,
        level: usize,
        lookup: &InternalKey,
        stats: &mut GetStats,
        last_file_read: &mut Option<(Arc<FileMetadata>, usize)>,
    ) -> Result<Option<LookupResult>> {
        // Charge the first file touched once a second file is consulted.
        if stats.seek_file.is_none() {
            if let Some((prev_file, prev_level)) = last_file_read.take() {
                stats.seek_file = Some(prev_file);
                stats.seek_file_level = prev_level;
            }
        }
        *last_file_read = Some((Arc::clone(file), level));

        match cache.get(file.file_number(), file.file_size(), lookup)? {
            LookupResult::NotFound => Ok(None),
            outcome => Ok(Some(outcome)),
        }
    }

    /// Apply the seek charge accumulated by a lookup.
    ///
    /// Returns true when the charged file's budget ran out and this
    /// version had no seek-compaction candidate yet, i.e. compaction has
    /// become newly required.
    pub fn update_stats(&self, stats: &GetStats) -> bool {
        if let Some(file) = &stats.seek_file {
            if file.charge_seek() {
                let mut seek = self.seek_compaction.lock();
                if seek.is_none() {
                    *seek = Some((Arc::clone(file), stats.seek_file_level));
                    return true;
                }
            }
        }
        false
    }

    /// Record a read sample at the given encoded internal key.
    ///
    /// When two or more files overlap the key, the first (newest) one is
    /// charged a seek: that is the file forcing reads of the key to touch
    /// a second file. Returns true if compaction became newly required.
    pub fn record_read_sample(&self, internal_key: &[u8]) -> bool {
        let user_key = match InternalKey::parse_user_key(internal_key) {
            Some(key) => key,
            None => return false,
        };

        let mut first: Option<(Arc<FileMetadata>, usize)> = None;
        let mut matches = 0usize;

        'walk: {
            for file in self.files[0].iter().filter(|f| f.may_contain_key(user_key)) {
                matches += 1;
                if matches == 1 {
                    first = Some((Arc::clone(file), 0));
                } else {
                    break 'walk;
                }
            }

            for level in 1..MAX_LEVELS {
                let files = &self.files[level];
                if files.is_empty() {
                    continue;
                }
                let index = find_file(files, user_key);
                if index < files.len() && files[index].may_contain_key(user_key) {
                    matches += 1;
                    if matches == 1 {
                        first = Some((Arc::clone(&files[index]), level));
                    } else {
                        break 'walk;
                    }
                }
            }
        }

        if matches >= 2 {
            if let Some((file, level)) = first {
                let stats = GetStats {
                    seek_file: Some(file),
                    seek_file_level: level,
                };
                return self.update_stats(&stats);
            }
        }
        false
    }

    /// Check whether any file at `level` overlaps the user-key range
    /// `[smallest, largest]`. `None` bounds are unbounded.
    pub fn overlap_in_level(
        &self,
        level: usize,
        smallest: Option<&[u8]>,
        largest: Option<&[u8]>,
    ) -> bool {
        some_file_overlaps_range(level > 0, &self.files[level], smallest, largest)
    }

    /// Return every file at `level` whose user-key range intersects
    /// `[begin, end]`. `None` bounds are unbounded.
    ///
    /// At level 0 the range is expansive: whenever an overlapping file
    /// extends the bounds, the scan restarts with the widened range, so
    /// the result is closed under level-0 overlap.
    pub fn get_overlapping_inputs(
        &self,
        level: usize,
        begin: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Vec<Arc<FileMetadata>> {
        let mut inputs = Vec::new();
        let mut user_begin = begin.map(|b| b.to_vec());
        let mut user_end = end.map(|e| e.to_vec());

        let files = &self.files[level];
        let mut i = 0;
        while i < files.len() {
            let file = &files[i];
            i += 1;

            let file_start = file.smallest().user_key();
            let file_limit = file.largest().user_key();

            if matches!(&user_begin, Some(b) if file_limit < b.as_slice()) {
                continue;
            }
            if matches!(&user_end, Some(e) if file_start > e.as_slice()) {
                continue;
            }

            inputs.push(Arc::clone(file));

            if level == 0 {
                // Level-0 files may overlap each other: a file reaching
                // past the bounds drags its own overlaps in, so widen and
                // restart.
                if matches!(&user_begin, Some(b) if file_start < b.as_slice()) {
                    user_begin = Some(file_start.to_vec());
                    inputs.clear();
                    i = 0;
                } else if matches!(&user_end, Some(e) if file_limit > e.as_slice()) {
                    user_end = Some(file_limit.to_vec());
                    inputs.clear();
                    i = 0;
                }
            }
        }

        inputs
    }

    /// Level at which a freshly flushed memtable covering
    /// `[smallest_user_key, largest_user_key]` should be placed.
    ///
    /// Level 0 unless the range overlaps nothing there; then the output
    /// is pushed to the deepest level (capped) where it still overlaps
    /// nothing, the next level also overlaps nothing, and the grandparent
    /// overlap stays bounded. Cuts write amplification for workloads with
    /// monotonic keys.
    pub fn pick_level_for_memtable_output(
        &self,
        options: &Options,
        smallest_user_key: &[u8],
        largest_user_key: &[u8],
    ) -> usize {
        let mut level = 0;

        if !self.overlap_in_level(0, Some(smallest_user_key), Some(largest_user_key)) {
            while level < MAX_MEM_COMPACT_LEVEL {
                if self.overlap_in_level(level + 1, Some(smallest_user_key), Some(largest_user_key))
                {
                    break;
                }
                if level + 2 < MAX_LEVELS {
                    let overlaps = self.get_overlapping_inputs(
                        level + 2,
                        Some(smallest_user_key),
                        Some(largest_user_key),
                    );
                    if total_file_size(&overlaps) > options.max_grandparent_overlap_bytes() {
                        break;
                    }
                }
                level += 1;
            }
        }

        level
    }

    /// Iterate over all files with their levels.
    pub fn all_files(&self) -> impl Iterator<Item = (usize, &Arc<FileMetadata>)> {
        self.files
            .iter()
            .enumerate()
            .flat_map(|(level, files)| files.iter().map(move |f| (level, f)))
    }

    /// Human-readable per-level file counts and sizes.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        for level in 0..MAX_LEVELS {
            let num_files = self.num_files(level);
            if num_files > 0 {
                summary.push_str(&format!(
                    "L{}: {} files ({} bytes) ",
                    level,
                    num_files,
                    self.level_size(level)
                ));
            }
        }
        summary.trim_end().to_string()
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the first file in a sorted, disjoint list whose largest key
/// is >= `user_key`; `files.len()` if none.
pub(super) fn find_file(files: &[Arc<FileMetadata>], user_key: &[u8]) -> usize {
    files.partition_point(|f| f.largest().user_key() < user_key)
}

/// Whether some file in `files` overlaps the user-key range
/// `[smallest, largest]`. With `disjoint_sorted_files` the check is a
/// binary search; level-0 lists get a linear scan.
pub(super) fn some_file_overlaps_range(
    disjoint_sorted_files: bool,
    files: &[Arc<FileMetadata>],
    smallest: Option<&[u8]>,
    largest: Option<&[u8]>,
) -> bool {
    if !disjoint_sorted_files {
        return files.iter().any(|f| {
            let after = matches!(smallest, Some(s) if s > f.largest().user_key());
            let before = matches!(largest, Some(l) if l < f.smallest().user_key());
            !after && !before
        });
    }

    let index = match smallest {
        Some(s) => find_file(files, s),
        None => 0,
    };

    if index >= files.len() {
        return false;
    }

    !matches!(largest, Some(l) if l < files[index].smallest().user_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn make_key(user_key: &[u8], seq: u64) -> InternalKey {
        InternalKey::new(Bytes::copy_from_slice(user_key), seq, ValueType::Value)
    }

    fn make_file(num: u64, smallest: &[u8], largest: &[u8]) -> Arc<FileMetadata> {
        Arc::new(FileMetadata::new(
            num,
            1024,
            make_key(smallest, 1),
            make_key(largest, 1),
        ))
    }

    fn version_from(levels: &[(usize, Vec<Arc<FileMetadata>>)]) -> Version {
        let mut files: [Vec<Arc<FileMetadata>>; MAX_LEVELS] = Default::default();
        for (level, fs) in levels {
            files[*level] = fs.clone();
        }
        Version::with_files(files)
    }

    #[test]
    fn test_version_empty() {
        let version = Version::new();
        assert_eq!(version.total_files(), 0);
        assert_eq!(version.num_files(0), 0);
        assert!(!version.needs_compaction());
    }

    #[test]
    fn test_version_with_files() {
        let version = version_from(&[
            (0, vec![make_file(2, b"b", b"d"), make_file(1, b"a", b"c")]),
            (1, vec![make_file(3, b"a", b"m"), make_file(4, b"n", b"z")]),
        ]);

        assert_eq!(version.num_files(0), 2);
        assert_eq!(version.num_files(1), 2);
        assert_eq!(version.total_files(), 4);
        assert_eq!(version.level_size(1), 2048);
    }

    #[test]
    fn test_find_file() {
        let files = vec![
            make_file(1, b"a", b"c"),
            make_file(2, b"d", b"f"),
            make_file(3, b"g", b"i"),
        ];

        assert_eq!(find_file(&files, b"a"), 0);
        assert_eq!(find_file(&files, b"c"), 0);
        assert_eq!(find_file(&files, b"cc"), 1);
        assert_eq!(find_file(&files, b"f"), 1);
        assert_eq!(find_file(&files, b"i"), 2);
        assert_eq!(find_file(&files, b"z"), 3);
    }

    #[test]
    fn test_some_file_overlaps_range_disjoint() {
        let files = vec![make_file(1, b"c", b"e"), make_file(2, b"g", b"i")];

        assert!(some_file_overlaps_range(true, &files, Some(b"a"), Some(b"c")));
        assert!(some_file_overlaps_range(true, &files, Some(b"e"), Some(b"f")));
        assert!(some_file_overlaps_range(true, &files, Some(b"f"), None));
        assert!(some_file_overlaps_range(true, &files, None, Some(b"d")));
        assert!(some_file_overlaps_range(true, &files, None, None));

        assert!(!some_file_overlaps_range(true, &files, Some(b"a"), Some(b"b")));
        assert!(!some_file_overlaps_range(true, &files, Some(b"f"), Some(b"f")));
        assert!(!some_file_overlaps_range(true, &files, Some(b"j"), None));
    }

    #[test]
    fn test_some_file_overlaps_range_level0() {
        let files = vec![make_file(1, b"c", b"m"), make_file(2, b"a", b"e")];

        assert!(some_file_overlaps_range(false, &files, Some(b"a"), Some(b"b")));
        assert!(some_file_overlaps_range(false, &files, Some(b"k"), Some(b"z")));
        assert!(!some_file_overlaps_range(false, &files, Some(b"n"), Some(b"z")));
    }

    #[test]
    fn test_get_overlapping_inputs_higher_level() {
        let version = version_from(&[(
            1,
            vec![
                make_file(1, b"a", b"c"),
                make_file(2, b"d", b"f"),
                make_file(3, b"g", b"i"),
                make_file(4, b"j", b"l"),
            ],
        )]);

        let overlapping = version.get_overlapping_inputs(1, Some(b"e"), Some(b"h"));
        assert_eq!(overlapping.len(), 2);
        assert_eq!(overlapping[0].file_number(), 2);
        assert_eq!(overlapping[1].file_number(), 3);

        let overlapping = version.get_overlapping_inputs(1, Some(b"a"), Some(b"a"));
        assert_eq!(overlapping.len(), 1);
        assert_eq!(overlapping[0].file_number(), 1);

        let overlapping = version.get_overlapping_inputs(1, None, Some(b"d"));
        assert_eq!(overlapping.len(), 2);

        let overlapping = version.get_overlapping_inputs(1, None, None);
        assert_eq!(overlapping.len(), 4);
    }

    #[test]
    fn test_get_overlapping_inputs_level0_expands() {
        // File 3 overlaps the query; file 2 overlaps file 3; file 1
        // overlaps file 2. The expansive scan must pull in all three.
        let version = version_from(&[(
            0,
            vec![
                make_file(3, b"e", b"g"),
                make_file(2, b"c", b"f"),
                make_file(1, b"a", b"d"),
            ],
        )]);

        let overlapping = version.get_overlapping_inputs(0, Some(b"g"), Some(b"h"));
        assert_eq!(overlapping.len(), 3);

        // A query clear of every file stays empty.
        let overlapping = version.get_overlapping_inputs(0, Some(b"x"), Some(b"z"));
        assert!(overlapping.is_empty());
    }

    #[test]
    fn test_get_overlapping_inputs_level0_closed_under_overlap() {
        let version = version_from(&[(
            0,
            vec![
                make_file(4, b"p", b"q"),
                make_file(3, b"e", b"g"),
                make_file(2, b"f", b"j"),
                make_file(1, b"a", b"b"),
            ],
        )]);

        let result = version.get_overlapping_inputs(0, Some(b"e"), Some(b"e"));
        // Closed under "intersects any returned file's range".
        assert_eq!(result.len(), 2);
        for file in &result {
            for other in version.files(0) {
                if result.iter().any(|f| f.file_number() == other.file_number()) {
                    continue;
                }
                assert!(
                    !file.overlaps(other.smallest().user_key(), other.largest().user_key()),
                    "returned set not closed under overlap"
                );
            }
        }
    }

    #[test]
    fn test_pick_level_for_memtable_output() {
        let options = Options::default();

        // Empty version: push to the cap.
        let version = Version::new();
        assert_eq!(
            version.pick_level_for_memtable_output(&options, b"a", b"b"),
            MAX_MEM_COMPACT_LEVEL
        );

        // Overlap at level 0 pins the output there.
        let version = version_from(&[(0, vec![make_file(1, b"a", b"c")])]);
        assert_eq!(version.pick_level_for_memtable_output(&options, b"b", b"d"), 0);

        // Overlap at level 1 stops the descent at level 0.
        let version = version_from(&[(1, vec![make_file(1, b"a", b"c")])]);
        assert_eq!(version.pick_level_for_memtable_output(&options, b"b", b"d"), 0);

        // Overlap at level 2 allows level 1.
        let version = version_from(&[(2, vec![make_file(1, b"a", b"c")])]);
        assert_eq!(version.pick_level_for_memtable_output(&options, b"b", b"d"), 1);
    }

    #[test]
    fn test_update_stats_sets_seek_compaction() {
        let file = make_file(5, b"a", b"z");
        let version = version_from(&[(2, vec![Arc::clone(&file)])]);

        file.set_allowed_seeks(2);

        let stats = GetStats {
            seek_file: Some(Arc::clone(&file)),
            seek_file_level: 2,
        };

        assert!(!version.update_stats(&stats));
        assert!(!version.needs_compaction());

        // Second charge exhausts the budget.
        assert!(version.update_stats(&stats));
        assert!(version.needs_compaction());
        let (seek_file, seek_level) = version.seek_compaction().unwrap();
        assert_eq!(seek_file.file_number(), 5);
        assert_eq!(seek_level, 2);

        // Already recorded: no new trigger.
        assert!(!version.update_stats(&stats));
    }

    #[test]
    fn test_record_read_sample() {
        let newer = make_file(2, b"a", b"m");
        let older = make_file(1, b"a", b"m");
        let version = version_from(&[(0, vec![Arc::clone(&newer), Arc::clone(&older)])]);

        newer.set_allowed_seeks(1);
        older.set_allowed_seeks(1000);

        let key = make_key(b"c", 10).encode();
        // Two overlapping files: the newest is charged and exhausts.
        assert!(version.record_read_sample(&key));
        let (seek_file, _) = version.seek_compaction().unwrap();
        assert_eq!(seek_file.file_number(), 2);
        assert_eq!(older.allowed_seeks(), 1000);
    }

    #[test]
    fn test_record_read_sample_single_file_no_charge() {
        let file = make_file(1, b"a", b"m");
        let version = version_from(&[(1, vec![Arc::clone(&file)])]);
        file.set_allowed_seeks(1);

        let key = make_key(b"c", 10).encode();
        assert!(!version.record_read_sample(&key));
        assert_eq!(file.allowed_seeks(), 1);
    }

    mod get {
        use super::*;
        use crate::Error;
        use parking_lot::Mutex as PlMutex;

        /// Table stub: scripted outcome per file number, recording the
        /// order files are consulted in.
        struct ScriptedCache {
            outcomes: Vec<(u64, LookupResult)>,
            touched: PlMutex<Vec<u64>>,
            fail_on: Option<u64>,
        }

        impl ScriptedCache {
            fn new(outcomes: Vec<(u64, LookupResult)>) -> Self {
                Self {
                    outcomes,
                    touched: PlMutex::new(Vec::new()),
                    fail_on: None,
                }
            }

            fn touched(&self) -> Vec<u64> {
                self.touched.lock().clone()
            }
        }

        impl TableCache for ScriptedCache {
            fn get(
                &self,
                file_number: u64,
                _file_size: u64,
                _key: &InternalKey,
            ) -> Result<LookupResult> {
                self.touched.lock().push(file_number);
                if self.fail_on == Some(file_number) {
                    return Err(Error::corruption("bad block"));
                }
                for (num, outcome) in &self.outcomes {
                    if *num == file_number {
                        return Ok(outcome.clone());
                    }
                }
                Ok(LookupResult::NotFound)
            }
        }

        #[test]
        fn test_get_level0_newest_first() {
            // Builder order: newest (highest number) first.
            let version = version_from(&[(
                0,
                vec![
                    make_file(9, b"a", b"z"),
                    make_file(7, b"a", b"z"),
                    make_file(5, b"a", b"z"),
                ],
            )]);

            let cache = ScriptedCache::new(vec![(5, LookupResult::Found(Bytes::from("old")))]);
            let (result, stats) = version.get(&cache, b"k", 100).unwrap();

            assert_eq!(result, LookupResult::Found(Bytes::from("old")));
            assert_eq!(cache.touched(), vec![9, 7, 5]);
            // First file touched that missed gets the charge.
            assert_eq!(stats.seek_file.unwrap().file_number(), 9);
            assert_eq!(stats.seek_file_level, 0);
        }

        #[test]
        fn test_get_single_candidate_per_deep_level() {
            let version = version_from(&[
                (1, vec![make_file(4, b"a", b"c"), make_file(5, b"d", b"f")]),
                (2, vec![make_file(6, b"a", b"f")]),
            ]);

            let cache = ScriptedCache::new(vec![(6, LookupResult::Found(Bytes::from("v")))]);
            let (result, _) = version.get(&cache, b"e", 100).unwrap();

            assert_eq!(result, LookupResult::Found(Bytes::from("v")));
            // Exactly one file per level: 5 at L1, then 6 at L2.
            assert_eq!(cache.touched(), vec![5, 6]);
        }

        #[test]
        fn test_get_tombstone_stops_search() {
            let version = version_from(&[
                (1, vec![make_file(4, b"a", b"f")]),
                (2, vec![make_file(6, b"a", b"f")]),
            ]);

            let cache = ScriptedCache::new(vec![
                (4, LookupResult::Deleted),
                (6, LookupResult::Found(Bytes::from("stale"))),
            ]);
            let (result, _) = version.get(&cache, b"e", 100).unwrap();

            assert_eq!(result, LookupResult::Deleted);
            assert_eq!(cache.touched(), vec![4]);
        }

        #[test]
        fn test_get_miss_and_no_charge_for_single_file() {
            let version = version_from(&[(1, vec![make_file(4, b"a", b"f")])]);

            let cache = ScriptedCache::new(vec![]);
            let (result, stats) = version.get(&cache, b"e", 100).unwrap();

            assert_eq!(result, LookupResult::NotFound);
            assert!(stats.seek_file.is_none());
        }

        #[test]
        fn test_get_propagates_corruption() {
            let version = version_from(&[(1, vec![make_file(4, b"a", b"f")])]);

            let mut cache = ScriptedCache::new(vec![]);
            cache.fail_on = Some(4);

            let err = version.get(&cache, b"e", 100).unwrap_err();
            assert!(err.is_corruption());
        }
    }
}
