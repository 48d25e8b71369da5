//! # redb-backed Segment Storage
//!
//! One redb table per spine, keyed by segment index, plus a metadata table.
//!
//! redb provides:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Each `write_segment` commits its own transaction, so a flush that stops
//! half way leaves every written segment durable.

use super::SegmentPersistence;
use crate::TermstoreError;
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition, TableError};
use std::path::Path;

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

fn segments(spine: &str) -> TableDefinition<'_, u32, &'static [u8]> {
    TableDefinition::new(spine)
}

fn io_error(e: impl std::fmt::Display) -> TermstoreError {
    TermstoreError::IoError(e.to_string())
}

/// Spine segments stored in a redb database file.
pub struct RedbSegments {
    db: Database,
}

impl std::fmt::Debug for RedbSegments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSegments").finish_non_exhaustive()
    }
}

impl RedbSegments {
    /// Open or create a segment database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TermstoreError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Spine tables appear on first write; only metadata is created up front.
        let write_txn = db.begin_write().map_err(io_error)?;
        write_txn.open_table(METADATA).map_err(io_error)?;
        write_txn.commit().map_err(io_error)?;

        tracing::debug!(path = %path.as_ref().display(), "Opened redb segment storage");
        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<bool, TermstoreError> {
        self.db.compact().map_err(io_error)
    }

    /// Number of persisted segments of `spine`.
    pub fn stored_segments(&self, spine: &str) -> Result<u64, TermstoreError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        match read_txn.open_table(segments(spine)) {
            Ok(table) => table.len().map_err(io_error),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(io_error(e)),
        }
    }
}

impl SegmentPersistence for RedbSegments {
    fn read_segment(&self, spine: &str, index: u32) -> Result<Option<Vec<u8>>, TermstoreError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = match read_txn.open_table(segments(spine)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        Ok(table
            .get(index)
            .map_err(io_error)?
            .map(|guard| guard.value().to_vec()))
    }

    fn write_segment(&self, spine: &str, index: u32, bytes: &[u8]) -> Result<(), TermstoreError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(segments(spine)).map_err(io_error)?;
            table.insert(index, bytes).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)
    }

    fn read_meta(&self, key: &str) -> Result<Option<u64>, TermstoreError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(METADATA).map_err(io_error)?;
        Ok(table.get(key).map_err(io_error)?.map(|v| v.value()))
    }

    fn write_meta(&self, key: &str, value: u64) -> Result<(), TermstoreError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(METADATA).map_err(io_error)?;
            table.insert(key, value).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_spine_reads_none() {
        let temp = tempdir().expect("temp dir");
        let storage = RedbSegments::open(temp.path().join("test.redb")).expect("open db");
        assert!(storage.read_segment("records", 0).expect("read").is_none());
        assert!(storage.read_meta("next_nid").expect("meta").is_none());
    }

    #[test]
    fn segment_overwrite() {
        let temp = tempdir().expect("temp dir");
        let storage = RedbSegments::open(temp.path().join("test.redb")).expect("open db");

        storage.write_segment("records", 3, b"first").expect("write");
        storage.write_segment("records", 3, b"second").expect("write");
        storage.write_segment("definitions", 3, b"other").expect("write");

        assert_eq!(
            storage.read_segment("records", 3).expect("read"),
            Some(b"second".to_vec())
        );
        assert_eq!(
            storage.read_segment("definitions", 3).expect("read"),
            Some(b"other".to_vec())
        );
        assert!(storage.read_segment("records", 4).expect("read").is_none());
        assert_eq!(storage.stored_segments("records").expect("count"), 1);
        assert_eq!(storage.stored_segments("pattern_semantics").expect("count"), 0);
    }

    #[test]
    fn recovery_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let storage = RedbSegments::open(&db_path).expect("open db");
            storage.write_segment("records", 7, b"bytes").expect("write");
            storage.write_meta("next_nid", 1234).expect("meta");
        }

        let storage = RedbSegments::open(&db_path).expect("reopen db");
        assert_eq!(
            storage.read_segment("records", 7).expect("read"),
            Some(b"bytes".to_vec())
        );
        assert_eq!(storage.read_meta("next_nid").expect("meta"), Some(1234));
    }

    #[test]
    fn compact_keeps_data() {
        let temp = tempdir().expect("temp dir");
        let mut storage = RedbSegments::open(temp.path().join("test.redb")).expect("open db");
        storage.write_segment("records", 0, b"x").expect("write");
        storage.compact().expect("compact");
        assert!(storage.read_segment("records", 0).expect("read").is_some());
    }
}
