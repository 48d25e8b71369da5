//! Spined array: a sparse, segment-addressed slot array.

use crate::formats::{segment_from_bytes, segment_to_bytes};
use crate::storage::SegmentPersistence;
use crate::{Nid, TermstoreError};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One fixed-capacity block of slots.
///
/// `generation` counts modifications; the segment is dirty while it is ahead
/// of `persisted`.
#[derive(Debug)]
struct Segment<T> {
    slots: RwLock<Vec<Option<T>>>,
    generation: AtomicU64,
    persisted: AtomicU64,
}

impl<T> Segment<T> {
    fn empty(spine_size: usize) -> Self {
        Self::loaded(std::iter::repeat_with(|| None).take(spine_size).collect())
    }

    fn loaded(slots: Vec<Option<T>>) -> Self {
        Self {
            slots: RwLock::new(slots),
            generation: AtomicU64::new(0),
            persisted: AtomicU64::new(0),
        }
    }

    fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::Acquire) > self.persisted.load(Ordering::Acquire)
    }
}

/// Slot array addressed by nid, cut into segments of `spine_size` slots.
///
/// Segments are loaded from persistence on first access and allocated only
/// when something is written into them.
#[derive(Debug)]
pub(crate) struct SpinedArray<T> {
    name: &'static str,
    spine_size: usize,
    directory: RwLock<BTreeMap<u32, Arc<Segment<T>>>>,
}

impl<T> SpinedArray<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub(crate) fn new(name: &'static str, spine_size: usize) -> Self {
        Self {
            name,
            spine_size,
            directory: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// `(segment index, offset)` of a nid.
    pub(crate) fn locate(&self, nid: Nid) -> Result<(u32, usize), TermstoreError> {
        let value = nid.check()?.value() as usize;
        let index = u32::try_from(value / self.spine_size).map_err(|_| {
            TermstoreError::InvalidConfig(format!("Nid {} beyond addressable segments", nid))
        })?;
        Ok((index, value % self.spine_size))
    }

    /// Resident or persisted segment; `None` if it was never written.
    fn find(
        &self,
        index: u32,
        persistence: &dyn SegmentPersistence,
    ) -> Result<Option<Arc<Segment<T>>>, TermstoreError> {
        if let Some(segment) = self.directory.read().get(&index) {
            return Ok(Some(Arc::clone(segment)));
        }

        let Some(bytes) = persistence.read_segment(self.name, index)? else {
            return Ok(None);
        };
        let slots = segment_from_bytes::<T>(&bytes, self.spine_size)?;
        tracing::debug!(spine = self.name, index, bytes = bytes.len(), "Loaded segment");

        // Another reader may have loaded it meanwhile; keep the first.
        let mut directory = self.directory.write();
        let segment = directory
            .entry(index)
            .or_insert_with(|| Arc::new(Segment::loaded(slots)));
        Ok(Some(Arc::clone(segment)))
    }

    fn find_or_allocate(
        &self,
        index: u32,
        persistence: &dyn SegmentPersistence,
    ) -> Result<Arc<Segment<T>>, TermstoreError> {
        if let Some(segment) = self.find(index, persistence)? {
            return Ok(segment);
        }
        let mut directory = self.directory.write();
        let segment = directory.entry(index).or_insert_with(|| {
            tracing::debug!(spine = self.name, index, "Allocated segment");
            Arc::new(Segment::empty(self.spine_size))
        });
        Ok(Arc::clone(segment))
    }

    pub(crate) fn get(
        &self,
        nid: Nid,
        persistence: &dyn SegmentPersistence,
    ) -> Result<Option<T>, TermstoreError> {
        let (index, offset) = self.locate(nid)?;
        let Some(segment) = self.find(index, persistence)? else {
            return Ok(None);
        };
        let slots = segment.slots.read();
        Ok(slots.get(offset).and_then(Clone::clone))
    }

    /// Read-modify-write one slot under the segment write lock.
    ///
    /// `update` returns whether it changed the slot; only a change marks the
    /// segment dirty.
    pub(crate) fn update<F>(
        &self,
        nid: Nid,
        persistence: &dyn SegmentPersistence,
        update: F,
    ) -> Result<bool, TermstoreError>
    where
        F: FnOnce(&mut Option<T>) -> Result<bool, TermstoreError>,
    {
        let (index, offset) = self.locate(nid)?;
        let segment = self.find_or_allocate(index, persistence)?;
        let mut slots = segment.slots.write();
        let slot = slots.get_mut(offset).ok_or_else(|| {
            TermstoreError::DeserializationError(format!(
                "Segment {} of {} has no slot {}",
                index, self.name, offset
            ))
        })?;
        let changed = update(slot)?;
        if changed {
            segment.generation.fetch_add(1, Ordering::AcqRel);
        }
        Ok(changed)
    }

    /// Indices of segments with unflushed changes, in index order.
    pub(crate) fn dirty_indices(&self) -> Vec<u32> {
        self.directory
            .read()
            .iter()
            .filter(|(_, segment)| segment.is_dirty())
            .map(|(index, _)| *index)
            .collect()
    }

    /// Write one segment.
    ///
    /// The snapshot and its generation are taken under the same read lock,
    /// so a merge racing with the write leaves the segment dirty.
    pub(crate) fn flush_segment(
        &self,
        index: u32,
        persistence: &dyn SegmentPersistence,
    ) -> Result<(), TermstoreError> {
        let Some(segment) = self.directory.read().get(&index).cloned() else {
            return Ok(());
        };
        let (generation, bytes) = {
            let slots = segment.slots.read();
            (
                segment.generation.load(Ordering::Acquire),
                segment_to_bytes(&slots)?,
            )
        };
        persistence.write_segment(self.name, index, &bytes)?;
        segment.persisted.fetch_max(generation, Ordering::AcqRel);
        Ok(())
    }

    pub(crate) fn resident_count(&self) -> usize {
        self.directory.read().len()
    }

    pub(crate) fn dirty_count(&self) -> usize {
        self.directory
            .read()
            .values()
            .filter(|segment| segment.is_dirty())
            .count()
    }

    #[cfg(test)]
    pub(crate) fn resident_indices(&self) -> Vec<u32> {
        self.directory.read().keys().copied().collect()
    }
}
