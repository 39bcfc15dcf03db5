#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::similar_names
)]
use std::collections::HashMap;

use criterion::{Criterion, criterion_group, criterion_main};
use proptest::{
    prelude::{Strategy, any},
    strategy::ValueTree,
    test_runner::TestRunner,
};
use transpose_map::{MapConfig, TransposeMap};

const ITEMS_AMOUNT: usize = 1000;
const SAMPLE_SIZE: usize = 10;

fn hash_map_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let items = any::<[(String, String); ITEMS_AMOUNT]>().new_tree(&mut runner).unwrap().current();
    let missing = any::<[String; ITEMS_AMOUNT]>().new_tree(&mut runner).unwrap().current();

    let mut group = c.benchmark_group("Hash map comparison benchmark");
    group.sample_size(SAMPLE_SIZE);
    let mut transpose_map = TransposeMap::new();
    let mut filtered_map =
        TransposeMap::with_config(MapConfig::default().with_bloom_filter(true)).unwrap();
    let mut rust_map = HashMap::new();
    group.bench_function("transpose insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                transpose_map.insert(key, value);
            }
        });
    });
    group.bench_function("filtered insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                filtered_map.insert(key, value);
            }
        });
    });
    group.bench_function("rust std insert", |b| {
        b.iter(|| {
            for (key, value) in items.clone() {
                rust_map.insert(key, value);
            }
        });
    });
    group.bench_function("transpose get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                let _ = transpose_map.get(key);
            }
        });
    });
    group.bench_function("rust std get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                let _ = rust_map.get(key);
            }
        });
    });
    group.bench_function("transpose miss", |b| {
        b.iter(|| {
            for key in &missing {
                let _ = transpose_map.contains_key(key);
            }
        });
    });
    group.bench_function("filtered miss", |b| {
        b.iter(|| {
            for key in &missing {
                let _ = filtered_map.contains_key(key);
            }
        });
    });
    group.finish();
}

criterion_group!(benches, hash_map_benches);

criterion_main!(benches);
