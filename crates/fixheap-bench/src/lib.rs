//! Benchmark workloads for the fixheap allocator.
//!
//! - [`fragmented_heap`]: an arena tiled with equal small blocks
//! - [`checkerboard_heap`]: the same tiling with every other block freed
//! - [`replay`]: run a churn plan against a fresh heap

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use fixheap_core::{FixedHeap, Handle};
use fixheap_test_utils::Op;

/// Build a heap holding `count` allocations of `size` bytes each.
///
/// Tail carving places them from the top of the arena down, leaving the
/// remaining free space at offset 0.
pub fn fragmented_heap<const N: usize>(count: usize, size: usize) -> (FixedHeap<N>, Vec<Handle>) {
    let mut heap = FixedHeap::<N>::with_defaults();
    let handles = (0..count)
        .map_while(|_| heap.allocate(size).ok())
        .collect();
    (heap, handles)
}

/// Build a heap of `count` blocks where every other block is free and the
/// head is fully allocated, so no free block is larger than one tile.
pub fn checkerboard_heap<const N: usize>(count: usize, size: usize) -> FixedHeap<N> {
    let (mut heap, live) = fragmented_heap::<N>(count, size);
    let rest = heap.largest_free_block().saturating_sub(heap.header_size());
    let _ = heap.allocate(rest);
    for h in live.iter().step_by(2) {
        let _ = heap.release(*h);
    }
    heap
}

/// Replay `ops` against a fresh heap and return it.
///
/// `Op::Release(i)` releases live allocation `i % live`; allocations that
/// do not fit are skipped.
pub fn replay<const N: usize>(ops: &[Op]) -> FixedHeap<N> {
    let mut heap = FixedHeap::<N>::with_defaults();
    let mut live: Vec<Handle> = Vec::new();
    for op in ops {
        match *op {
            Op::Allocate(size) => {
                if let Ok(h) = heap.allocate(size) {
                    live.push(h);
                }
            }
            Op::Release(index) => {
                if !live.is_empty() {
                    let h = live.swap_remove(index % live.len());
                    let _ = heap.release(h);
                }
            }
        }
    }
    heap
}
