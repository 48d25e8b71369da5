//! # Spine Benchmarks
//!
//! Merge, lookup, flush and latest-version resolution.
//!
//! Run with: `cargo bench -p termstore-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use termstore_core::coordinate::presets;
use termstore_core::formats::{from_record_bytes, to_record_bytes};
use termstore_core::{
    Chronology, ConceptChronology, ConceptVersion, DiGraph, FlushControl, MemorySegments, Nid,
    PathRegistry, SpineConfig, SpineStore, Stamp, StampCalculator, Status, Vertex, terms,
};

fn stamp(time: i64, path: Nid) -> Stamp {
    Stamp::new(Status::Active, time, terms::USER, terms::SOLOR_MODULE, path)
}

fn concept(nid: i32, versions: usize) -> Chronology {
    let paths = [terms::MASTER_PATH, terms::DEVELOPMENT_PATH, terms::PRIMORDIAL_PATH];
    Chronology::Concept(ConceptChronology {
        nid: Nid(nid),
        versions: (0..versions)
            .map(|i| ConceptVersion {
                stamp: stamp(i as i64 * 10, paths[i % paths.len()]),
            })
            .collect(),
    })
}

/// Store with `count` concepts of three versions each.
fn filled_store(count: i32) -> SpineStore {
    let store = SpineStore::open(SpineConfig::default(), MemorySegments::new()).expect("open");
    for nid in 0..count {
        store.put(&concept(nid, 3)).expect("put");
    }
    store
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000, 10000].iter() {
        let chronologies: Vec<Chronology> = (0..*size).map(|nid| concept(nid, 3)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &chronologies, |b, input| {
            b.iter(|| {
                let store = SpineStore::open(SpineConfig::default(), MemorySegments::new())
                    .expect("open");
                for chronology in input {
                    store.put(chronology).expect("put");
                }
                black_box(store.next_nid())
            });
        });
    }

    group.finish();
}

fn bench_remerge(c: &mut Criterion) {
    let store = filled_store(1000);
    let chronology = concept(500, 3);

    c.bench_function("remerge_unchanged", |b| {
        b.iter(|| store.put(black_box(&chronology)).expect("put"));
    });
}

fn bench_get_entity(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_entity");

    for size in [1000, 10000].iter() {
        let store = filled_store(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(store.get_entity(Nid(size / 2)).expect("get")));
        });
    }

    group.finish();
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");

    for size in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let store = filled_store(size);
                black_box(store.flush(&FlushControl::new()).expect("flush"))
            });
        });
    }

    group.finish();
}

fn bench_latest(c: &mut Criterion) {
    let mut group = c.benchmark_group("latest");
    let registry = PathRegistry::standard().expect("standard paths");
    let calculator =
        StampCalculator::new(presets::stamp::development_latest(), &registry).expect("calculator");

    for versions in [3, 30, 300].iter() {
        let Chronology::Concept(chronology) = concept(100, *versions) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(versions),
            &chronology.versions,
            |b, versions| {
                b.iter(|| black_box(calculator.latest(versions)));
            },
        );
    }

    group.finish();
}

fn bench_graph_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_codec");

    for size in [10, 100, 1000].iter() {
        let mut builder = DiGraph::builder();
        builder.add_root(Vertex::new(0, Nid(1)));
        for index in 1..*size {
            builder.add(Vertex::new(index, Nid(index)), (index - 1) / 2);
        }
        let graph: DiGraph<Vertex> = builder.build().expect("graph");
        let bytes = to_record_bytes(&graph);

        group.bench_with_input(BenchmarkId::new("encode", size), &graph, |b, graph| {
            b.iter(|| black_box(to_record_bytes(graph)));
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
            b.iter(|| black_box(from_record_bytes::<DiGraph<Vertex>>(bytes).expect("decode")));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_merge,
    bench_remerge,
    bench_get_entity,
    bench_flush,
    bench_latest,
    bench_graph_codec,
);
criterion_main!(benches);
