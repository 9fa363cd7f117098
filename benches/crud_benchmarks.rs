use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ordered_index::{AnyIndex, AvlTree, OrderStatistic, OrderedIndex, RedBlackTree, Treap, Variant, WavlTree};
use std::collections::BTreeMap;
use std::hint::black_box;

const N: usize = 10_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn reverse_ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).rev().collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn build(variant: Variant, keys: &[i64]) -> AnyIndex<i64, i64> {
    let mut index = AnyIndex::new(variant);
    for &k in keys {
        index.insert(k, k);
    }
    index
}

fn build_btreemap(keys: &[i64]) -> BTreeMap<i64, i64> {
    keys.iter().map(|&k| (k, k)).collect()
}

// ─── Insert Benchmarks ──────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion, name: &str, keys: &[i64]) {
    let mut group = c.benchmark_group(name);

    for variant in Variant::ALL {
        group.bench_function(BenchmarkId::new(variant.as_str(), N), |b| {
            b.iter(|| build(variant, keys));
        });
    }

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| build_btreemap(keys));
    });

    group.finish();
}

fn bench_insert_ordered(c: &mut Criterion) {
    bench_insert(c, "insert_ordered", &ordered_keys(N));
}

fn bench_insert_reverse(c: &mut Criterion) {
    bench_insert(c, "insert_reverse", &reverse_ordered_keys(N));
}

fn bench_insert_random(c: &mut Criterion) {
    bench_insert(c, "insert_random", &random_keys(N));
}

// ─── Lookup Benchmarks ──────────────────────────────────────────────────────

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_random");
    let keys = random_keys(N);

    for variant in Variant::ALL {
        let index = build(variant, &keys);
        group.bench_function(BenchmarkId::new(variant.as_str(), N), |b| {
            b.iter(|| {
                for k in &keys {
                    black_box(index.get(k));
                }
            });
        });
    }

    let map = build_btreemap(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            for k in &keys {
                black_box(map.get(k));
            }
        });
    });

    group.finish();
}

// ─── Remove Benchmarks ──────────────────────────────────────────────────────

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_random");
    let keys = random_keys(N);

    for variant in Variant::ALL {
        let index = build(variant, &keys);
        group.bench_function(BenchmarkId::new(variant.as_str(), N), |b| {
            b.iter(|| {
                let mut index = index.clone();
                for k in &keys {
                    black_box(index.remove(k));
                }
                index
            });
        });
    }

    let map = build_btreemap(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = map.clone();
            for k in &keys {
                black_box(map.remove(k));
            }
            map
        });
    });

    group.finish();
}

// ─── Range Benchmarks ───────────────────────────────────────────────────────

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_1pct");
    let keys = ordered_keys(N);
    let span = (N / 100) as i64;

    for variant in Variant::ALL {
        let index = build(variant, &keys);
        group.bench_function(BenchmarkId::new(variant.as_str(), N), |b| {
            b.iter(|| {
                let mut total = 0i64;
                for low in (0..N as i64).step_by(span as usize) {
                    total += index.range(&low, &(low + span - 1)).map(|(_, v)| *v).sum::<i64>();
                }
                total
            });
        });
    }

    let map = build_btreemap(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut total = 0i64;
            for low in (0..N as i64).step_by(span as usize) {
                total += map.range(low..low + span).map(|(_, v)| *v).sum::<i64>();
            }
            total
        });
    });

    group.finish();
}

// ─── Order Statistic Benchmarks ─────────────────────────────────────────────

fn bench_rank<T>(c: &mut Criterion, name: &str, mut tree: T)
where
    T: OrderedIndex<i64, i64> + OrderStatistic<i64, i64>,
{
    for k in random_keys(N) {
        tree.insert(k, k);
    }
    let len = tree.len();
    c.bench_function(&format!("get_by_rank/{name}"), |b| {
        b.iter(|| {
            for rank in (0..len).step_by(7) {
                black_box(tree.get_by_rank(rank));
            }
        });
    });
}

fn bench_order_statistic(c: &mut Criterion) {
    bench_rank(c, "avl", AvlTree::new());
    bench_rank(c, "red-black", RedBlackTree::new());
    bench_rank(c, "wavl", WavlTree::new());
    bench_rank(c, "treap", Treap::new());
}

criterion_group!(
    benches,
    bench_insert_ordered,
    bench_insert_reverse,
    bench_insert_random,
    bench_get,
    bench_remove,
    bench_range,
    bench_order_statistic,
);
criterion_main!(benches);
