//! In-process segment storage for tests and throwaway stores.

use super::SegmentPersistence;
use crate::TermstoreError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Segments kept in a map; nothing survives the process.
///
/// `fail_writes(true)` makes every subsequent segment write fail with an
/// I/O error, which is how flush failure handling is exercised.
#[derive(Debug, Default)]
pub struct MemorySegments {
    segments: Mutex<BTreeMap<(String, u32), Vec<u8>>>,
    meta: Mutex<BTreeMap<String, u64>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySegments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful segment writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Segment indices stored for `spine`.
    #[must_use]
    pub fn stored_indices(&self, spine: &str) -> Vec<u32> {
        self.segments
            .lock()
            .keys()
            .filter(|(name, _)| name == spine)
            .map(|(_, index)| *index)
            .collect()
    }
}

impl SegmentPersistence for MemorySegments {
    fn read_segment(&self, spine: &str, index: u32) -> Result<Option<Vec<u8>>, TermstoreError> {
        Ok(self
            .segments
            .lock()
            .get(&(spine.to_string(), index))
            .cloned())
    }

    fn write_segment(&self, spine: &str, index: u32, bytes: &[u8]) -> Result<(), TermstoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TermstoreError::IoError(format!(
                "Injected write failure for {} segment {}",
                spine, index
            )));
        }
        self.segments
            .lock()
            .insert((spine.to_string(), index), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_meta(&self, key: &str) -> Result<Option<u64>, TermstoreError> {
        Ok(self.meta.lock().get(key).copied())
    }

    fn write_meta(&self, key: &str, value: u64) -> Result<(), TermstoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TermstoreError::IoError(format!(
                "Injected write failure for metadata {}",
                key
            )));
        }
        self.meta.lock().insert(key.to_string(), value);
        Ok(())
    }
}
