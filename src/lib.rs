//! # verdb
//!
//! The version-management and compaction-planning core of an LSM-tree
//! key-value engine:
//!
//! - **Versions**: immutable, reference-counted snapshots of the on-disk
//!   table layout, so readers see a stable file set while compactions
//!   delete files concurrently
//! - **Edits and the manifest**: the append-only protocol that atomically
//!   advances the engine from one version to the next and is the root of
//!   truth on recovery
//! - **Compaction planning**: the selection and input-expansion algorithm
//!   that keeps level sizes bounded and read amplification low
//!
//! Reading keys out of tables, the memtable, the write-ahead log and the
//! public database handle are external collaborators; [`cache::TableCache`]
//! and [`util::comparator::Comparator`] are the seams they plug into.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use verdb::{Options, VersionEdit, VersionSet};
//!
//! let vs = VersionSet::new(db_path, Arc::new(Options::default()));
//! vs.create()?; // or vs.recover()? for an existing database
//!
//! // A memtable flush announces its table file:
//! let mut edit = VersionEdit::new();
//! edit.add_file_info(0, file_number, file_size, smallest, largest);
//! vs.log_and_apply(&mut edit)?;
//!
//! // The background thread asks what to merge next:
//! if let Some(compaction) = vs.pick_compaction() {
//!     /* run the merge, commit its edit, release inputs */
//! }
//! ```

// Public modules
pub mod cache;
pub mod error;
pub mod options;
pub mod types;

// Internal modules
mod compaction;
pub mod util;
mod version;

// Re-export main types for convenience
pub use cache::TableCache;
pub use compaction::Compaction;
pub use error::{Error, Result};
pub use options::{Options, MAX_LEVELS};
pub use types::{InternalKey, LookupResult, ValueType};
pub use version::{
    total_file_size, FileMetadata, GetStats, Manifest, ManifestReader, ManifestWriter, Version,
    VersionEdit, VersionSet,
};
