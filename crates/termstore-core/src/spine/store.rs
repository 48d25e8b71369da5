use super::array::SpinedArray;
use super::record::{canonical_record, merge_records, split_chunks};
use super::{
    COMPONENT_SEMANTICS, DEFINITIONS, FlushControl, FlushReport, PATTERN_SEMANTICS, RECORDS,
    SpineConfig, SpineStats,
};
use crate::entity::{Chronology, Entity, to_entity};
use crate::primitives::NEXT_NID_KEY;
use crate::storage::SegmentPersistence;
use crate::{Nid, TermstoreError, terms};
use std::sync::atomic::{AtomicI32, Ordering};

/// Insert into a sorted nid set; `true` if it was new.
fn insert_sorted(slot: &mut Option<Vec<Nid>>, nid: Nid) -> bool {
    let nids = slot.get_or_insert_with(Vec::new);
    match nids.binary_search(&nid) {
        Ok(_) => false,
        Err(position) => {
            nids.insert(position, nid);
            true
        }
    }
}

/// The nid-keyed chronology store.
///
/// One handle per database, passed explicitly to everything that reads or
/// writes. All methods take `&self`; locking is per segment.
pub struct SpineStore {
    config: SpineConfig,
    persistence: Box<dyn SegmentPersistence>,
    records: SpinedArray<Vec<u8>>,
    definitions: SpinedArray<Nid>,
    component_semantics: SpinedArray<Vec<Nid>>,
    pattern_semantics: SpinedArray<Vec<Nid>>,
    next_nid: AtomicI32,
    persisted_next_nid: AtomicI32,
}

impl std::fmt::Debug for SpineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpineStore")
            .field("config", &self.config)
            .field("next_nid", &self.next_nid.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl SpineStore {
    /// Open a store over `persistence`.
    ///
    /// Nothing is loaded up front except the nid high-water mark.
    pub fn open(
        config: SpineConfig,
        persistence: impl SegmentPersistence + 'static,
    ) -> Result<Self, TermstoreError> {
        config.validate()?;
        let stored = persistence
            .read_meta(NEXT_NID_KEY)?
            .map(|value| {
                i32::try_from(value).map_err(|_| {
                    TermstoreError::DeserializationError(format!(
                        "Stored {} out of range: {}",
                        NEXT_NID_KEY, value
                    ))
                })
            })
            .transpose()?;
        let next_nid = stored.unwrap_or(terms::FIRST_CONTENT_NID.value());

        tracing::info!(
            spine_size = config.spine_size,
            next_nid,
            "Opened spine store"
        );

        Ok(Self {
            config,
            persistence: Box::new(persistence),
            records: SpinedArray::new(RECORDS, config.spine_size),
            definitions: SpinedArray::new(DEFINITIONS, config.spine_size),
            component_semantics: SpinedArray::new(COMPONENT_SEMANTICS, config.spine_size),
            pattern_semantics: SpinedArray::new(PATTERN_SEMANTICS, config.spine_size),
            next_nid: AtomicI32::new(next_nid),
            persisted_next_nid: AtomicI32::new(stored.unwrap_or(-1)),
        })
    }

    /// Flush everything and release the store.
    pub fn close(self, control: &FlushControl) -> Result<FlushReport, TermstoreError> {
        let report = self.flush(control)?;
        tracing::info!(
            written = report.written,
            remaining = report.remaining,
            "Closed spine store"
        );
        Ok(report)
    }

    #[must_use]
    pub fn config(&self) -> SpineConfig {
        self.config
    }

    // =========================================================================
    // RAW RECORDS
    // =========================================================================

    /// Merge a framed record into the chronology of `nid`.
    ///
    /// Versions already present are ignored, so repeating a merge, or merging
    /// the same versions in another order, converges on the same version set.
    /// `referenced_component` is `Nid::NOT_A_SEMANTIC` for records that
    /// reference nothing.
    pub fn merge(
        &self,
        nid: Nid,
        definition: Nid,
        referenced_component: Nid,
        bytes: &[u8],
    ) -> Result<(), TermstoreError> {
        nid.check()?;
        definition.check()?;
        if !referenced_component.is_sentinel() {
            referenced_component.check()?;
        }
        if split_chunks(bytes)?.is_empty() {
            return Err(TermstoreError::InvalidChronology(format!(
                "Record for {} has no header chunk",
                nid
            )));
        }

        let persistence = self.persistence.as_ref();
        self.records.update(nid, persistence, |slot| match slot {
            None => {
                *slot = Some(canonical_record(bytes)?);
                Ok(true)
            }
            Some(existing) => match merge_records(existing, bytes)? {
                Some(merged) => {
                    *existing = merged;
                    Ok(true)
                }
                None => Ok(false),
            },
        })?;

        self.definitions.update(nid, persistence, |slot| {
            let changed = *slot != Some(definition);
            *slot = Some(definition);
            Ok(changed)
        })?;

        if !referenced_component.is_sentinel() {
            self.component_semantics
                .update(referenced_component, persistence, |slot| {
                    Ok(insert_sorted(slot, nid))
                })?;
            self.pattern_semantics
                .update(definition, persistence, |slot| Ok(insert_sorted(slot, nid)))?;
        }

        self.next_nid
            .fetch_max(nid.value().saturating_add(1), Ordering::AcqRel);
        Ok(())
    }

    /// Framed record bytes of `nid`, if any.
    pub fn get(&self, nid: Nid) -> Result<Option<Vec<u8>>, TermstoreError> {
        self.records.get(nid, self.persistence.as_ref())
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    /// Convert and merge a chronology.
    pub fn put(&self, chronology: &Chronology) -> Result<(), TermstoreError> {
        let entity = to_entity(chronology)?;
        self.merge(
            entity.nid(),
            entity.definition_nid(),
            entity.referenced_component_nid(),
            &entity.to_bytes(),
        )
    }

    /// Decoded entity of `nid`, if any.
    pub fn get_entity(&self, nid: Nid) -> Result<Option<Entity>, TermstoreError> {
        self.get(nid)?
            .map(|bytes| Entity::from_bytes(&bytes))
            .transpose()
    }

    /// A nid no merge has used.
    pub fn allocate_nid(&self) -> Result<Nid, TermstoreError> {
        let nid = self.next_nid.fetch_add(1, Ordering::AcqRel);
        if nid == i32::MAX {
            self.next_nid.store(i32::MAX, Ordering::Release);
            return Err(TermstoreError::InvalidConfig(
                "Nid space exhausted".to_string(),
            ));
        }
        Ok(Nid(nid))
    }

    /// Next nid `allocate_nid` would hand out.
    #[must_use]
    pub fn next_nid(&self) -> Nid {
        Nid(self.next_nid.load(Ordering::Acquire))
    }

    // =========================================================================
    // REFERENCE INDEXES
    // =========================================================================

    /// Pattern (definition) nid of a stored component.
    pub fn definition_nid(&self, nid: Nid) -> Result<Option<Nid>, TermstoreError> {
        self.definitions.get(nid, self.persistence.as_ref())
    }

    /// Semantics referencing `component`, ascending.
    pub fn semantic_nids_for_component(&self, component: Nid) -> Result<Vec<Nid>, TermstoreError> {
        Ok(self
            .component_semantics
            .get(component, self.persistence.as_ref())?
            .unwrap_or_default())
    }

    /// Semantics whose definition is `pattern`, ascending.
    pub fn semantic_nids_of_pattern(&self, pattern: Nid) -> Result<Vec<Nid>, TermstoreError> {
        Ok(self
            .pattern_semantics
            .get(pattern, self.persistence.as_ref())?
            .unwrap_or_default())
    }

    /// Semantics of `pattern` referencing `component`, ascending.
    pub fn semantic_nids_for_component_of_pattern(
        &self,
        component: Nid,
        pattern: Nid,
    ) -> Result<Vec<Nid>, TermstoreError> {
        pattern.check()?;
        let mut matching = Vec::new();
        for nid in self.semantic_nids_for_component(component)? {
            if self.definition_nid(nid)? == Some(pattern) {
                matching.push(nid);
            }
        }
        Ok(matching)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    fn spines(&self) -> [SpineRef<'_>; 4] {
        [
            SpineRef::Records(&self.records),
            SpineRef::Nids(&self.definitions),
            SpineRef::NidLists(&self.component_semantics),
            SpineRef::NidLists(&self.pattern_semantics),
        ]
    }

    /// Write dirty segments until done, cancelled or `max_segments` reached.
    ///
    /// A failed write leaves that segment dirty and returns the error.
    pub fn flush(&self, control: &FlushControl) -> Result<FlushReport, TermstoreError> {
        let persistence = self.persistence.as_ref();
        let pending: Vec<(SpineRef<'_>, u32)> = self
            .spines()
            .into_iter()
            .flat_map(|spine| {
                spine
                    .dirty_indices()
                    .into_iter()
                    .map(move |index| (spine, index))
            })
            .collect();

        let mut report = FlushReport::default();
        for (position, (spine, index)) in pending.iter().enumerate() {
            if control.is_cancelled() {
                report.cancelled = true;
                report.remaining = pending.len() - position;
                break;
            }
            if control.max_segments().is_some_and(|max| report.written >= max) {
                report.remaining = pending.len() - position;
                break;
            }
            spine.flush_segment(*index, persistence)?;
            report.written += 1;
        }

        if !report.cancelled {
            let next_nid = self.next_nid.load(Ordering::Acquire);
            if self.persisted_next_nid.load(Ordering::Acquire) != next_nid {
                persistence.write_meta(NEXT_NID_KEY, next_nid as u64)?;
                self.persisted_next_nid.store(next_nid, Ordering::Release);
            }
        }

        tracing::info!(
            written = report.written,
            remaining = report.remaining,
            cancelled = report.cancelled,
            "Flushed spine store"
        );
        Ok(report)
    }

    /// Segments with unflushed changes across all spines.
    #[must_use]
    pub fn dirty_segments(&self) -> usize {
        self.spines().iter().map(SpineRef::dirty_count).sum()
    }

    /// Resident and dirty segment counts per spine.
    #[must_use]
    pub fn stats(&self) -> Vec<SpineStats> {
        self.spines()
            .iter()
            .map(|spine| SpineStats {
                spine: spine.name().to_string(),
                resident: spine.resident_count(),
                dirty: spine.dirty_count(),
            })
            .collect()
    }
}

impl Drop for SpineStore {
    fn drop(&mut self) {
        let dirty = self.dirty_segments();
        if dirty > 0 {
            tracing::warn!(
                dirty_segments = dirty,
                "Spine store dropped with unflushed segments"
            );
        }
    }
}

/// The four spines differ only in slot type.
#[derive(Clone, Copy)]
enum SpineRef<'a> {
    Records(&'a SpinedArray<Vec<u8>>),
    Nids(&'a SpinedArray<Nid>),
    NidLists(&'a SpinedArray<Vec<Nid>>),
}

impl SpineRef<'_> {
    fn name(&self) -> &'static str {
        match self {
            SpineRef::Records(a) => a.name(),
            SpineRef::Nids(a) => a.name(),
            SpineRef::NidLists(a) => a.name(),
        }
    }

    fn dirty_indices(&self) -> Vec<u32> {
        match self {
            SpineRef::Records(a) => a.dirty_indices(),
            SpineRef::Nids(a) => a.dirty_indices(),
            SpineRef::NidLists(a) => a.dirty_indices(),
        }
    }

    fn dirty_count(&self) -> usize {
        match self {
            SpineRef::Records(a) => a.dirty_count(),
            SpineRef::Nids(a) => a.dirty_count(),
            SpineRef::NidLists(a) => a.dirty_count(),
        }
    }

    fn resident_count(&self) -> usize {
        match self {
            SpineRef::Records(a) => a.resident_count(),
            SpineRef::Nids(a) => a.resident_count(),
            SpineRef::NidLists(a) => a.resident_count(),
        }
    }

    fn flush_segment(
        &self,
        index: u32,
        persistence: &dyn SegmentPersistence,
    ) -> Result<(), TermstoreError> {
        match self {
            SpineRef::Records(a) => a.flush_segment(index, persistence),
            SpineRef::Nids(a) => a.flush_segment(index, persistence),
            SpineRef::NidLists(a) => a.flush_segment(index, persistence),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
