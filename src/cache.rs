//! The table-lookup interface this crate consumes.
//!
//! Reading keys out of a sorted table belongs to the SSTable collaborator;
//! the version core only needs a point lookup keyed by the file identity
//! it tracks. The engine's concrete table cache implements this trait.

use crate::types::{InternalKey, LookupResult};
use crate::Result;

/// Point lookup into an immutable sorted table.
pub trait TableCache: Send + Sync {
    /// Look up `key` in the table identified by `file_number`.
    ///
    /// `file_size` is passed through so an implementation can open the
    /// table without a stat call. Returns `Found` with the value,
    /// `Deleted` when the newest record for the user key is a tombstone,
    /// or `NotFound`; corruption and I/O failures surface as errors.
    fn get(&self, file_number: u64, file_size: u64, key: &InternalKey) -> Result<LookupResult>;
}
