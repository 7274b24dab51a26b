//! End-to-end tests of the version set: bootstrap, edit application,
//! recovery, and compaction planning against a real database directory.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use tempfile::tempdir;

use verdb::{
    InternalKey, LookupResult, Options, TableCache, ValueType, VersionEdit, VersionSet,
};

fn make_key(user_key: &[u8], seq: u64) -> InternalKey {
    InternalKey::new(Bytes::copy_from_slice(user_key), seq, ValueType::Value)
}

/// Table stub that resolves every lookup from a fixed list.
struct StubCache {
    hits: Vec<(u64, Bytes)>,
}

impl TableCache for StubCache {
    fn get(&self, file_number: u64, _file_size: u64, _key: &InternalKey) -> verdb::Result<LookupResult> {
        for (number, value) in &self.hits {
            if *number == file_number {
                return Ok(LookupResult::Found(value.clone()));
            }
        }
        Ok(LookupResult::NotFound)
    }
}

#[test]
fn open_empty_database() {
    let dir = tempdir().unwrap();
    let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
    vs.create().unwrap();

    let current = vs.current();
    for level in 0..verdb::MAX_LEVELS {
        assert_eq!(current.num_files(level), 0);
    }
    // Manifest consumed file number 1; allocation starts at 2.
    assert_eq!(vs.next_file_number(), 2);
    assert_eq!(vs.manifest_number(), 1);
    assert!(dir.path().join("CURRENT").exists());
    assert!(dir.path().join("MANIFEST-000001").exists());
}

#[test]
fn apply_edit_and_reopen() {
    let dir = tempdir().unwrap();

    {
        let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
        vs.create().unwrap();

        let mut edit = VersionEdit::new();
        edit.add_file_info(0, 7, 1024, make_key(b"a", 40), make_key(b"c", 42));
        edit.set_next_file_number(8);
        edit.set_last_sequence(42);
        vs.log_and_apply(&mut edit).unwrap();

        assert_eq!(vs.num_level_files(0), 1);
        assert_eq!(vs.last_sequence(), 42);
    }

    // Reopening reconstructs the identical version.
    let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
    vs.recover().unwrap();

    assert_eq!(vs.num_level_files(0), 1);
    let current = vs.current();
    let file = &current.files(0)[0];
    assert_eq!(file.file_number(), 7);
    assert_eq!(file.file_size(), 1024);
    assert_eq!(file.smallest().user_key(), b"a");
    assert_eq!(file.largest().user_key(), b"c");
    assert_eq!(vs.last_sequence(), 42);
    assert!(vs.next_file_number() > 7);
}

#[test]
fn level0_compaction_setup() {
    let dir = tempdir().unwrap();
    let mut options = Options::default();
    // Two level-0 files are enough pressure for this scenario.
    options.l0_compaction_trigger = 2;
    let vs = VersionSet::new(dir.path(), Arc::new(options));
    vs.create().unwrap();

    let mut edit = VersionEdit::new();
    edit.add_file_info(0, 7, 1024, make_key(b"a", 10), make_key(b"c", 12));
    edit.add_file_info(0, 8, 1024, make_key(b"b", 20), make_key(b"d", 22));
    edit.add_file_info(1, 10, 1024, make_key(b"c", 1), make_key(b"e", 1));
    edit.add_file_info(2, 12, 1024, make_key(b"d", 1), make_key(b"f", 1));
    edit.add_file_info(2, 13, 1024, make_key(b"x", 1), make_key(b"z", 1));
    vs.log_and_apply(&mut edit).unwrap();

    let c = vs.pick_compaction().unwrap();
    assert_eq!(c.level(), 0);
    assert_eq!(c.output_level(), 1);

    // Both overlapping level-0 files come in.
    let inputs0: HashSet<u64> = c.inputs(0).iter().map(|f| f.file_number()).collect();
    assert_eq!(inputs0, HashSet::from([7, 8]));

    // inputs[1] is exactly the level-1 overlap of the union range [a, d].
    assert_eq!(c.num_input_files(1), 1);
    assert_eq!(c.input(1, 0).file_number(), 10);

    // Grandparents: level-2 files overlapping the union range [a, e].
    let grandparents: HashSet<u64> =
        c.grandparents().iter().map(|f| f.file_number()).collect();
    assert_eq!(grandparents, HashSet::from([12]));

    assert!(!c.is_trivial_move());
}

#[test]
fn trivial_move_relabels_file() {
    let dir = tempdir().unwrap();
    let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
    vs.create().unwrap();

    // One oversized file at level 1, nothing below it.
    let mut edit = VersionEdit::new();
    edit.add_file_info(
        1,
        9,
        11 * 1024 * 1024,
        make_key(b"m", 3),
        make_key(b"n", 5),
    );
    vs.log_and_apply(&mut edit).unwrap();

    let mut c = vs.pick_compaction().unwrap();
    assert_eq!(c.level(), 1);
    assert_eq!(c.num_input_files(0), 1);
    assert_eq!(c.num_input_files(1), 0);
    assert!(c.is_trivial_move());

    // The executor re-parents the file: delete at 1, add at 2 with
    // identical metadata.
    let file = Arc::clone(c.input(0, 0));
    let mut edit = VersionEdit::new();
    c.add_input_deletions(&mut edit);
    edit.add_file_info(
        c.output_level(),
        file.file_number(),
        file.file_size(),
        file.smallest().clone(),
        file.largest().clone(),
    );
    vs.log_and_apply(&mut edit).unwrap();
    c.release_inputs();

    assert_eq!(vs.num_level_files(1), 0);
    assert_eq!(vs.num_level_files(2), 1);
    let current = vs.current();
    let moved = &current.files(2)[0];
    assert_eq!(moved.file_number(), 9);
    assert_eq!(moved.smallest().user_key(), b"m");
    assert_eq!(moved.largest().user_key(), b"n");
}

#[test]
fn seek_exhaustion_triggers_compaction() {
    let dir = tempdir().unwrap();
    let mut options = Options::default();
    // A tight budget so a handful of reads exhausts file 5.
    options.min_allowed_seeks = 2;
    options.seek_cost_bytes = u64::MAX;
    let vs = VersionSet::new(dir.path(), Arc::new(options));
    vs.create().unwrap();

    // Overlapping coverage at levels 2 and 3 so every lookup touches two
    // files and charges the first.
    let mut edit = VersionEdit::new();
    edit.add_file_info(2, 5, 4096, make_key(b"a", 9), make_key(b"p", 9));
    edit.add_file_info(3, 6, 4096, make_key(b"a", 1), make_key(b"p", 1));
    vs.log_and_apply(&mut edit).unwrap();

    assert!(vs.pick_compaction().is_none());

    // Value lives in the deeper file: each get wastes a seek on file 5.
    let cache = StubCache {
        hits: vec![(6, Bytes::from("v"))],
    };
    let current = vs.current();
    let mut triggered = false;
    for _ in 0..2 {
        let (result, stats) = current.get(&cache, b"k", 100).unwrap();
        assert_eq!(result, LookupResult::Found(Bytes::from("v")));
        assert_eq!(stats.seek_file.as_ref().unwrap().file_number(), 5);
        triggered = current.update_stats(&stats);
    }
    assert!(triggered, "second wasted seek exhausts the budget");

    // The seek-driven pick selects exactly file 5 at level 2, size
    // pressure notwithstanding.
    let c = vs.pick_compaction().unwrap();
    assert_eq!(c.level(), 2);
    assert_eq!(c.num_input_files(0), 1);
    assert_eq!(c.input(0, 0).file_number(), 5);
}

#[test]
fn manifest_rotation_preserves_state() {
    let dir = tempdir().unwrap();
    let mut options = Options::default();
    options.max_manifest_file_size = 512;
    let options = Arc::new(options);

    let file_count = 30u64;
    {
        let vs = VersionSet::new(dir.path(), Arc::clone(&options));
        vs.create().unwrap();
        let first_manifest = vs.manifest_number();

        for i in 0..file_count {
            let number = vs.new_file_number();
            let mut edit = VersionEdit::new();
            edit.add_file_info(
                3,
                number,
                1024,
                make_key(format!("k{:04}a", i).as_bytes(), i + 1),
                make_key(format!("k{:04}z", i).as_bytes(), i + 1),
            );
            edit.set_last_sequence(i + 1);
            vs.log_and_apply(&mut edit).unwrap();
        }

        assert!(vs.manifest_number() > first_manifest);
        // Only the active manifest remains on disk.
        assert!(!dir
            .path()
            .join(format!("MANIFEST-{:06}", first_manifest))
            .exists());
    }

    // The snapshot record at the head of the rotated manifest makes it
    // self-contained.
    let vs = VersionSet::new(dir.path(), options);
    vs.recover().unwrap();
    assert_eq!(vs.num_level_files(3), file_count as usize);
    assert_eq!(vs.last_sequence(), file_count);

    let mut live = HashSet::new();
    vs.add_live_files(&mut live);
    assert_eq!(live.len(), file_count as usize);
}

#[test]
fn compact_pointer_survives_reopen() {
    let dir = tempdir().unwrap();

    {
        let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
        vs.create().unwrap();

        let mut edit = VersionEdit::new();
        edit.add_file_info(
            1,
            10,
            11 * 1024 * 1024,
            make_key(b"a", 1),
            make_key(b"f", 1),
        );
        edit.add_file_info(
            1,
            11,
            11 * 1024 * 1024,
            make_key(b"g", 1),
            make_key(b"p", 1),
        );
        vs.log_and_apply(&mut edit).unwrap();

        // Plan a compaction of file 10 and commit its outcome; the edit
        // carries the advanced pointer.
        let c = vs.pick_compaction().unwrap();
        assert_eq!(c.input(0, 0).file_number(), 10);
        let mut commit = c.edit().clone();
        c.add_input_deletions(&mut commit);
        let out = vs.new_file_number();
        commit.add_file_info(2, out, 1024, make_key(b"a", 1), make_key(b"f", 1));
        vs.log_and_apply(&mut commit).unwrap();
    }

    // After reopen, the next size-driven pick resumes past file 10's
    // old range instead of restarting from the front.
    let vs = VersionSet::new(dir.path(), Arc::new(Options::default()));
    vs.recover().unwrap();
    assert_eq!(vs.compact_pointer(1).unwrap().user_key(), b"f");

    let c = vs.pick_compaction().unwrap();
    assert_eq!(c.level(), 1);
    assert_eq!(c.input(0, 0).file_number(), 11);
}
