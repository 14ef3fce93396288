//! Criterion micro-benchmarks for flatten, unflatten, and selection.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use plait_bench::{deep_profile, episode_profile, wide_profile};
use plait_flatten::{
    flatten_leaves, flatten_paths, select, unflatten, FlattenConfig, Flattener,
    NonNumericalPolicy, Pattern,
};
use plait_schema::Schema;

/// Benchmark: list flatten of a 32-step episode with 16x16x3 images.
fn bench_flatten_list(c: &mut Criterion) {
    let record = episode_profile(32, 16);
    c.bench_function("flatten_list_episode_32", |b| {
        b.iter(|| black_box(flatten_leaves(black_box(&record)).unwrap()));
    });
}

/// Benchmark: list flatten with non-numerical leaves dropped.
fn bench_flatten_list_numeric(c: &mut Criterion) {
    let record = episode_profile(32, 16);
    let flattener =
        Flattener::new(FlattenConfig::list().with_non_numerical(NonNumericalPolicy::Ignore))
            .unwrap();
    c.bench_function("flatten_list_numeric_episode_32", |b| {
        b.iter(|| black_box(flattener.leaves(black_box(&record)).unwrap()));
    });
}

/// Benchmark: dict flatten where every name collides (minimal-path growth).
fn bench_flatten_dict(c: &mut Criterion) {
    let record = wide_profile(1_000);
    c.bench_function("flatten_dict_wide_1000", |b| {
        b.iter(|| black_box(flatten_paths(black_box(&record)).unwrap()));
    });
}

/// Benchmark: unflatten an episode from its leaves and schema.
fn bench_unflatten(c: &mut Criterion) {
    let record = episode_profile(32, 16);
    let schema = Schema::of(&record);
    let leaves = flatten_leaves(&record).unwrap();
    c.bench_function("unflatten_episode_32", |b| {
        b.iter(|| black_box(unflatten(black_box(&leaves), &schema).unwrap()));
    });
}

/// Benchmark: wildcard selection of every step's action.
fn bench_select(c: &mut Criterion) {
    let record = episode_profile(256, 4);
    let pattern: Pattern = "steps.*.action".parse().unwrap();
    c.bench_function("select_actions_256", |b| {
        b.iter(|| black_box(select(black_box(&record), &pattern, 256).unwrap()));
    });
}

/// Benchmark: list flatten of a deeply nested single leaf.
fn bench_flatten_deep(c: &mut Criterion) {
    let record = deep_profile(200);
    c.bench_function("flatten_deep_200", |b| {
        b.iter(|| black_box(flatten_leaves(black_box(&record)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_flatten_list,
    bench_flatten_list_numeric,
    bench_flatten_dict,
    bench_unflatten,
    bench_select,
    bench_flatten_deep
);
criterion_main!(benches);
