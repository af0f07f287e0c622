//! Test utilities for fixheap development.
//!
//! - [`check_invariants`] walks a heap's block list and verifies tiling,
//!   alignment, back-links and eager coalescing.
//! - [`ShadowHeap`] drives a heap while tracking every live allocation and
//!   the byte pattern written into it, so overlap shows up as a corrupted
//!   pattern.
//! - [`plan`] generates deterministic allocate/release workloads.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod plan;

use std::fmt;

use fixheap_core::{BlockInfo, FixedHeap, Handle, HeapError};
use indexmap::IndexMap;

pub use plan::{ChurnPlan, Op};

/// A broken structural invariant of a heap's block list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The first block does not start at offset 0.
    HeadNotAtZero { offset: u32 },
    /// A block does not start where its predecessor ends.
    Gap { expected: u64, found: u32 },
    /// A block's size is below the header size or not aligned.
    BadSize { offset: u32, size: u32 },
    /// A block's `prev` does not name its predecessor.
    BrokenBackLink { offset: u32, prev: Option<u32> },
    /// The blocks do not end exactly at the arena's end.
    Coverage { end: u64, capacity: usize },
    /// Two physically adjacent blocks are both free.
    AdjacentFree { first: u32, second: u32 },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadNotAtZero { offset } => write!(f, "head block at {offset}, expected 0"),
            Self::Gap { expected, found } => {
                write!(f, "block at {found}, expected one at {expected}")
            }
            Self::BadSize { offset, size } => write!(f, "block at {offset} has size {size}"),
            Self::BrokenBackLink { offset, prev } => {
                write!(f, "block at {offset} has prev {prev:?}")
            }
            Self::Coverage { end, capacity } => {
                write!(f, "blocks end at {end}, capacity is {capacity}")
            }
            Self::AdjacentFree { first, second } => {
                write!(f, "adjacent free blocks at {first} and {second}")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Verify every structural invariant of `heap`'s block list.
pub fn check_invariants<const N: usize>(heap: &FixedHeap<N>) -> Result<(), InvariantViolation> {
    let mut expected_start = 0u64;
    let mut previous: Option<BlockInfo> = None;

    for block in heap.blocks() {
        if previous.is_none() && block.offset != 0 {
            return Err(InvariantViolation::HeadNotAtZero {
                offset: block.offset,
            });
        }
        if block.offset as u64 != expected_start {
            return Err(InvariantViolation::Gap {
                expected: expected_start,
                found: block.offset,
            });
        }
        let size = block.size as usize;
        if size < heap.header_size() || size % heap.alignment() != 0 {
            return Err(InvariantViolation::BadSize {
                offset: block.offset,
                size: block.size,
            });
        }
        if block.prev != previous.map(|p| p.offset) {
            return Err(InvariantViolation::BrokenBackLink {
                offset: block.offset,
                prev: block.prev,
            });
        }
        if let Some(prev) = previous {
            if prev.is_free() && block.is_free() {
                return Err(InvariantViolation::AdjacentFree {
                    first: prev.offset,
                    second: block.offset,
                });
            }
        }
        expected_start = block.end();
        previous = Some(block);
    }

    if expected_start != N as u64 {
        return Err(InvariantViolation::Coverage {
            end: expected_start,
            capacity: N,
        });
    }
    Ok(())
}

/// Panic with a readable message if `heap` breaks an invariant.
#[track_caller]
pub fn assert_invariants<const N: usize>(heap: &FixedHeap<N>) {
    if let Err(violation) = check_invariants(heap) {
        let layout: Vec<_> = heap
            .blocks()
            .map(|b| (b.offset, b.size, b.status))
            .collect();
        panic!("heap invariant violated: {violation}\nlayout: {layout:?}");
    }
}

/// Address-ordered `(offset, size, is_free)` triples, for equality checks.
pub fn layout<const N: usize>(heap: &FixedHeap<N>) -> Vec<(u32, u32, bool)> {
    heap.blocks()
        .map(|b| (b.offset, b.size, b.is_free()))
        .collect()
}

/// Bookkeeping for one live allocation in a [`ShadowHeap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveAllocation {
    /// Bytes the caller asked for.
    pub requested: usize,
    /// Byte written across the requested range.
    pub fill: u8,
}

/// A heap driven alongside a model of its live allocations.
///
/// Every successful allocation is filled with a distinct byte; [`verify`]
/// re-reads all of them. A region handed out twice, or a header written
/// over user bytes, shows up as a mismatched fill.
///
/// [`verify`]: ShadowHeap::verify
pub struct ShadowHeap<const N: usize> {
    heap: FixedHeap<N>,
    live: IndexMap<Handle, LiveAllocation>,
    next_fill: u8,
}

impl<const N: usize> ShadowHeap<N> {
    pub fn new(heap: FixedHeap<N>) -> Self {
        Self {
            heap,
            live: IndexMap::new(),
            next_fill: 1,
        }
    }

    pub fn heap(&self) -> &FixedHeap<N> {
        &self.heap
    }

    pub fn live(&self) -> &IndexMap<Handle, LiveAllocation> {
        &self.live
    }

    /// Allocate, fill, and record. Failures are returned untouched.
    pub fn allocate(&mut self, requested: usize) -> Result<Handle, HeapError> {
        let handle = self.heap.allocate(requested)?;
        let fill = self.next_fill;
        self.next_fill = self.next_fill.wrapping_add(1).max(1);
        self.heap.bytes_mut(handle)?[..requested].fill(fill);
        let previous = self.live.insert(handle, LiveAllocation { requested, fill });
        assert!(previous.is_none(), "{handle} handed out while still live");
        Ok(handle)
    }

    /// Release the `index`-th live allocation (modulo the live count).
    ///
    /// Returns the released handle, or `None` if nothing is live.
    pub fn release_nth(&mut self, index: usize) -> Option<Handle> {
        if self.live.is_empty() {
            return None;
        }
        let (handle, _) = self.live.swap_remove_index(index % self.live.len())?;
        if let Err(err) = self.heap.release(handle) {
            panic!("release of live {handle} failed: {err}");
        }
        Some(handle)
    }

    /// Release a handle directly, keeping the model in step.
    pub fn release(&mut self, handle: Handle) -> Result<(), HeapError> {
        self.heap.release(handle)?;
        self.live.swap_remove(&handle);
        Ok(())
    }

    /// Apply one [`Op`] from a plan. Allocation failures are ignored.
    pub fn apply(&mut self, op: Op) {
        match op {
            Op::Allocate(size) => {
                let _ = self.allocate(size);
            }
            Op::Release(index) => {
                self.release_nth(index);
            }
        }
    }

    /// Check that every live allocation still holds its fill pattern,
    /// meets its requested size, and is aligned.
    #[track_caller]
    pub fn verify(&self) {
        for (handle, live) in &self.live {
            assert_eq!(
                handle.index() % self.heap.alignment(),
                0,
                "{handle} is misaligned"
            );
            let bytes = match self.heap.bytes(*handle) {
                Ok(bytes) => bytes,
                Err(err) => panic!("live {handle} rejected: {err}"),
            };
            assert!(
                bytes.len() >= live.requested,
                "{handle} has {} usable bytes, requested {}",
                bytes.len(),
                live.requested
            );
            assert!(
                bytes[..live.requested].iter().all(|&b| b == live.fill),
                "{handle} lost its fill pattern {:#04x}",
                live.fill
            );
        }
    }

    pub fn into_inner(self) -> FixedHeap<N> {
        self.heap
    }
}
