//! Criterion micro-benchmarks for schema derivation and caching.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use plait_bench::{episode_profile, wide_profile};
use plait_schema::{Schema, SchemaCache, ShapeKey};

/// Benchmark: derive the schema of a 32-step episode.
fn bench_schema_of(c: &mut Criterion) {
    let record = episode_profile(32, 16);
    c.bench_function("schema_of_episode_32", |b| {
        b.iter(|| black_box(Schema::of(black_box(&record))));
    });
}

/// Benchmark: fingerprint a wide mapping.
fn bench_shape_key(c: &mut Criterion) {
    let record = wide_profile(1_000);
    c.bench_function("shape_key_wide_1000", |b| {
        b.iter(|| black_box(ShapeKey::of(black_box(&record))));
    });
}

/// Benchmark: warm cache lookup (fingerprint plus structural confirmation).
fn bench_cache_hit(c: &mut Criterion) {
    let record = episode_profile(32, 16);
    let cache = SchemaCache::new();
    cache.get_or_build(&record);
    c.bench_function("schema_cache_hit_episode_32", |b| {
        b.iter(|| black_box(cache.get_or_build(black_box(&record))));
    });
}

/// Benchmark: serialize and parse the schema interchange document.
fn bench_document_round_trip(c: &mut Criterion) {
    let schema = Schema::of(&episode_profile(32, 16));
    c.bench_function("schema_document_round_trip", |b| {
        b.iter(|| {
            let json = schema.to_json().unwrap();
            black_box(Schema::from_json(&json).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_schema_of,
    bench_shape_key,
    bench_cache_hit,
    bench_document_round_trip
);
criterion_main!(benches);
