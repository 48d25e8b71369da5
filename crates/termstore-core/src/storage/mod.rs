//! # Segment Storage
//!
//! Where spine segments live between process runs.
//!
//! The spine store hands out whole encoded segments and small metadata
//! values; a backend only has to keep bytes under `(spine, index)` keys.
//! Nothing here interprets segment contents.

mod memory;
mod redb_segments;

pub use memory::MemorySegments;
pub use redb_segments::RedbSegments;

use crate::TermstoreError;
use std::sync::Arc;

/// Byte-level persistence for spine segments.
///
/// Failures are reported as `TermstoreError::IoError` and never retried
/// here.
pub trait SegmentPersistence: Send + Sync {
    /// Encoded segment `index` of `spine`, if one was ever written.
    fn read_segment(&self, spine: &str, index: u32) -> Result<Option<Vec<u8>>, TermstoreError>;

    /// Replace segment `index` of `spine`.
    fn write_segment(&self, spine: &str, index: u32, bytes: &[u8]) -> Result<(), TermstoreError>;

    fn read_meta(&self, key: &str) -> Result<Option<u64>, TermstoreError>;

    fn write_meta(&self, key: &str, value: u64) -> Result<(), TermstoreError>;
}

// Lets a test keep a handle on the backend it gave to a store.
impl<P: SegmentPersistence + ?Sized> SegmentPersistence for Arc<P> {
    fn read_segment(&self, spine: &str, index: u32) -> Result<Option<Vec<u8>>, TermstoreError> {
        (**self).read_segment(spine, index)
    }

    fn write_segment(&self, spine: &str, index: u32, bytes: &[u8]) -> Result<(), TermstoreError> {
        (**self).write_segment(spine, index, bytes)
    }

    fn read_meta(&self, key: &str) -> Result<Option<u64>, TermstoreError> {
        (**self).read_meta(key)
    }

    fn write_meta(&self, key: &str, value: u64) -> Result<(), TermstoreError> {
        (**self).write_meta(key, value)
    }
}
