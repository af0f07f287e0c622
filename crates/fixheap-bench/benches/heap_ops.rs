//! Criterion micro-benchmarks for allocate, release, and churn workloads.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use fixheap_bench::{checkerboard_heap, fragmented_heap, replay};
use fixheap_core::FixedHeap;
use fixheap_test_utils::ChurnPlan;

const ARENA: usize = 64 * 1024;

/// Benchmark: one allocate + release pair on an empty heap.
fn bench_alloc_release_pair(c: &mut Criterion) {
    let mut heap = FixedHeap::<ARENA>::with_defaults();
    c.bench_function("alloc_release_pair", |b| {
        b.iter(|| {
            let h = heap.allocate(black_box(128)).unwrap();
            heap.release(h).unwrap();
        });
    });
}

/// Benchmark: allocate + release with 1000 allocated blocks in the list.
///
/// The free space sits at the head, so first fit succeeds immediately.
fn bench_alloc_head_fit(c: &mut Criterion) {
    let (mut heap, _live) = fragmented_heap::<ARENA>(1_000, 24);
    c.bench_function("alloc_head_fit_1k_blocks", |b| {
        b.iter(|| {
            let h = heap.allocate(black_box(16)).unwrap();
            heap.release(h).unwrap();
        });
    });
}

/// Benchmark: a failing first-fit scan over 1000 blocks.
///
/// Every free hole is 40 bytes, so a 64-byte request walks the whole list
/// before reporting out of memory.
fn bench_alloc_worst_scan(c: &mut Criterion) {
    let mut heap = checkerboard_heap::<ARENA>(1_000, 24);
    c.bench_function("alloc_worst_scan_1k_blocks", |b| {
        b.iter(|| black_box(heap.allocate(black_box(64)).is_err()));
    });
}

/// Benchmark: a 10K-step seeded churn workload from a fresh heap.
fn bench_churn_10k(c: &mut Criterion) {
    let ops = ChurnPlan::new(42, 10_000, 256).ops();
    c.bench_function("churn_10k", |b| {
        b.iter(|| black_box(replay::<ARENA>(&ops).stats()));
    });
}

criterion_group!(
    benches,
    bench_alloc_release_pair,
    bench_alloc_head_fit,
    bench_alloc_worst_scan,
    bench_churn_10k
);
criterion_main!(benches);
