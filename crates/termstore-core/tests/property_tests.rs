//! # Property-Based Tests
//!
//! Merge, codec and resolution invariants under proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use termstore_core::coordinate::presets;
use termstore_core::formats::{from_record_bytes, to_record_bytes};
use termstore_core::{
    Chronology, ConceptChronology, ConceptVersion, DiGraph, FlushControl, MemorySegments, Nid,
    PathRegistry, SpineConfig, SpineStore, Stamp, StampCalculator, Status, Vertex, terms,
};

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Active),
        Just(Status::Inactive),
        Just(Status::Withdrawn),
        Just(Status::Primordial),
    ]
}

fn arb_path() -> impl Strategy<Value = Nid> {
    prop_oneof![
        Just(terms::PRIMORDIAL_PATH),
        Just(terms::SANDBOX_PATH),
        Just(terms::MASTER_PATH),
        Just(terms::DEVELOPMENT_PATH),
    ]
}

fn arb_stamp() -> impl Strategy<Value = Stamp> {
    (arb_status(), 0i64..1_000, arb_path(), 0usize..2).prop_map(|(status, time, path, module)| {
        let module = [terms::SOLOR_MODULE, terms::SOLOR_OVERLAY_MODULE][module];
        Stamp::new(status, time, terms::USER, module, path)
    })
}

fn concept(nid: i32, stamps: &[Stamp]) -> Chronology {
    Chronology::Concept(ConceptChronology {
        nid: Nid(nid),
        versions: stamps.iter().map(|s| ConceptVersion { stamp: *s }).collect(),
    })
}

fn memory_store() -> SpineStore {
    SpineStore::open(SpineConfig::default(), MemorySegments::new()).expect("open")
}

fn version_count(store: &SpineStore, nid: i32) -> usize {
    store
        .get_entity(Nid(nid))
        .expect("get")
        .map_or(0, |entity| entity.version_count())
}

/// Random tree: vertex `i` hangs off one of the vertices before it.
fn arb_tree() -> impl Strategy<Value = DiGraph<Vertex>> {
    vec((0usize..1_000, 0i32..500), 0..20).prop_map(|edges| {
        let mut builder = DiGraph::builder();
        builder.add_root(Vertex::new(0, Nid(1)));
        for (i, (parent_seed, meaning)) in edges.iter().enumerate() {
            let index = i as i32 + 1;
            let parent = (*parent_seed % (i + 1)) as i32;
            builder.add(Vertex::new(index, Nid(*meaning)), parent);
        }
        builder.build().expect("tree")
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Merging the same versions twice leaves the record unchanged.
    #[test]
    fn merge_idempotent(stamps in vec(arb_stamp(), 1..10)) {
        let store = memory_store();
        let chronology = concept(100, &stamps);

        store.put(&chronology).expect("put");
        let once = store.get(Nid(100)).expect("get");
        store.put(&chronology).expect("put again");
        let twice = store.get(Nid(100)).expect("get");

        prop_assert_eq!(once, twice);
    }

    /// Version count never decreases and ends at the number of distinct versions.
    #[test]
    fn version_count_monotonic(batches in vec(vec(arb_stamp(), 1..4), 1..8)) {
        let store = memory_store();
        let mut previous = 0;
        let mut distinct = BTreeSet::new();

        for batch in &batches {
            store.put(&concept(100, batch)).expect("put");
            distinct.extend(batch.iter().copied());
            let count = version_count(&store, 100);
            prop_assert!(count >= previous);
            previous = count;
        }
        prop_assert_eq!(previous, distinct.len());
    }

    /// Merge order changes neither the stored record nor the resolved latest version.
    #[test]
    fn latest_independent_of_merge_order(stamps in vec(arb_stamp(), 1..10)) {
        let forward = memory_store();
        let backward = memory_store();
        for stamp in &stamps {
            forward.put(&concept(100, &[*stamp])).expect("put");
        }
        for stamp in stamps.iter().rev() {
            backward.put(&concept(100, &[*stamp])).expect("put");
        }

        let registry = PathRegistry::standard().expect("standard paths");
        let calc = StampCalculator::new(presets::stamp::development_latest(), &registry)
            .expect("calculator");
        let a = forward.get_entity(Nid(100)).expect("get").expect("entity");
        let b = backward.get_entity(Nid(100)).expect("get").expect("entity");

        prop_assert_eq!(calc.latest_entity_version(&a), calc.latest_entity_version(&b));
        prop_assert_eq!(
            forward.get(Nid(100)).expect("get"),
            backward.get(Nid(100)).expect("get")
        );
    }

    /// Decoding an encoded graph reproduces roots and both adjacency maps.
    #[test]
    fn graph_round_trip(graph in arb_tree()) {
        let decoded: DiGraph<Vertex> =
            from_record_bytes(&to_record_bytes(&graph)).expect("decode");

        prop_assert_eq!(decoded.roots(), graph.roots());
        prop_assert_eq!(decoded.successor_map(), graph.successor_map());
        prop_assert_eq!(decoded.predecessor_map(), graph.predecessor_map());
    }

    /// Writing nid k stores only segment k / spine_size.
    #[test]
    fn segment_sparsity(nid in 64i32..100_000, spine_size in 1usize..512) {
        let persistence = Arc::new(MemorySegments::new());
        let store = SpineStore::open(
            SpineConfig::with_spine_size(spine_size),
            Arc::clone(&persistence),
        )
        .expect("open");

        let stamp = Stamp::new(
            Status::Active,
            1,
            terms::USER,
            terms::SOLOR_MODULE,
            terms::MASTER_PATH,
        );
        store.put(&concept(nid, &[stamp])).expect("put");
        store.flush(&FlushControl::new()).expect("flush");

        let expected = (nid as usize / spine_size) as u32;
        prop_assert_eq!(persistence.stored_indices("records"), vec![expected]);
    }
}
