//! The fixed-capacity first-fit heap.
//!
//! [`FixedHeap`] owns an `N`-byte arena and an address-ordered,
//! doubly-linked list of blocks whose headers live inline at the start of
//! each block. Free and allocated blocks share the one list; the status
//! field tells them apart.
//!
//! ```text
//! offset 0                                                      offset N
//! ┌──────────────┬─────────────┬──────────────────┬─────────────┐
//! │ hdr │ free   │ hdr │ alloc │ hdr │ free       │ hdr │ alloc │
//! └──────────────┴─────────────┴──────────────────┴─────────────┘
//!   head ⇄ ─────── ⇄ ─────────── ⇄ ──────────────── ⇄ (next = none)
//! ```
//!
//! Allocation takes the first free block that fits and carves the request
//! off its high-address end, so the free block keeps its place in the list.
//! Release marks the block free and merges it with free physical
//! neighbours on both sides, so no two adjacent blocks are ever both free.

use core::fmt;

use log::{debug, trace};

use crate::block::{BlockHeader, BlockInfo, BlockStatus};
use crate::config::{checked_align_up, HeapConfig, MAX_ALIGNMENT};
use crate::error::{ConfigError, HandleFault, HeapError};
use crate::handle::Handle;
use crate::stats::HeapStats;

/// Arena bytes, aligned so offsets aligned to any supported alignment are
/// also address-aligned.
#[repr(C, align(64))]
struct Storage<const N: usize>([u8; N]);

const _: () = assert!(core::mem::align_of::<Storage<0>>() == MAX_ALIGNMENT);

/// A first-fit allocator over a fixed `N`-byte arena.
///
/// The arena is embedded in the value, so a `FixedHeap` placed in a
/// `static` needs no operating-system heap at all. The block list is
/// created lazily by the first [`allocate`](Self::allocate).
///
/// `FixedHeap` is single-writer: both operations take `&mut self`. Use
/// [`LockedHeap`](crate::LockedHeap) to share one heap between threads.
///
/// # Example
///
/// ```
/// use fixheap_core::FixedHeap;
///
/// let mut heap = FixedHeap::<1024>::with_defaults();
/// let handle = heap.allocate(100).unwrap();
/// heap.bytes_mut(handle).unwrap()[..5].copy_from_slice(b"hello");
/// assert_eq!(&heap.bytes(handle).unwrap()[..5], b"hello");
/// heap.release(handle).unwrap();
/// assert_eq!(heap.block_count(), 1);
/// ```
pub struct FixedHeap<const N: usize> {
    storage: Storage<N>,
    config: HeapConfig,
    /// Header footprint, cached from `config`.
    header_size: usize,
    /// Offset of the first block; `None` until the arena is initialized.
    head: Option<u32>,
    initialized: bool,
}

impl<const N: usize> FixedHeap<N> {
    /// Create a heap over an `N`-byte arena.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is unusable for `N` bytes
    /// (see [`HeapConfig::validate`]).
    pub fn new(config: HeapConfig) -> Result<Self, ConfigError> {
        config.validate(N)?;
        Ok(Self::from_valid_config(config))
    }

    /// Create a heap with [`HeapConfig::DEFAULT`].
    ///
    /// The configuration is checked at compile time, so this is usable in
    /// `static` initializers. An `N` that is not a multiple of 8, or is
    /// smaller than one header, fails to compile.
    pub const fn with_defaults() -> Self {
        const {
            assert!(
                HeapConfig::DEFAULT.validate(N).is_ok(),
                "arena size is invalid for the default heap config"
            );
        }
        Self::from_valid_config(HeapConfig::DEFAULT)
    }

    const fn from_valid_config(config: HeapConfig) -> Self {
        Self {
            storage: Storage([0; N]),
            config,
            header_size: config.header_size(),
            head: None,
            initialized: false,
        }
    }

    /// Allocate a block with at least `requested` usable bytes.
    ///
    /// The returned handle is a multiple of the configured alignment and
    /// its region does not overlap any other live allocation.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::OutOfMemory`] if no free block is large enough
    /// or the footprint exceeds the arena. A failed call changes nothing.
    pub fn allocate(&mut self, requested: usize) -> Result<Handle, HeapError> {
        let needed = requested
            .checked_add(self.header_size)
            .and_then(|total| checked_align_up(total, self.config.alignment));

        self.ensure_initialized();

        let (Some(head), Some(needed)) = (self.head, needed) else {
            return Err(self.out_of_memory(requested, needed));
        };
        let Some(needed) = u32::try_from(needed).ok().filter(|&n| n as usize <= N) else {
            return Err(self.out_of_memory(requested, Some(needed)));
        };

        let Some(candidate) = self.first_fit(head, needed) else {
            return Err(self.out_of_memory(requested, Some(needed as usize)));
        };

        let surplus = (candidate.size - needed) as usize;
        let at = if surplus > self.config.split_threshold && surplus >= self.header_size {
            self.split_tail(candidate, needed)
        } else {
            candidate.offset
        };

        BlockHeader::set_status(self.arena_mut(), at as usize, BlockStatus::Allocated);
        Ok(Handle::new(at + self.header_size as u32))
    }

    /// Allocate like [`allocate`](Self::allocate) and zero the whole usable
    /// region.
    ///
    /// # Errors
    ///
    /// Same as [`allocate`](Self::allocate).
    pub fn allocate_zeroed(&mut self, requested: usize) -> Result<Handle, HeapError> {
        let handle = self.allocate(requested)?;
        self.bytes_mut(handle)?.fill(0);
        Ok(handle)
    }

    /// Return a block to the heap, merging it with free neighbours.
    ///
    /// Accepts a [`Handle`] or an `Option<Handle>`; `None` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidRelease`] if the handle is not a live
    /// allocation of this heap, including a handle that was already
    /// released. The heap is left untouched in that case.
    pub fn release(&mut self, handle: impl Into<Option<Handle>>) -> Result<(), HeapError> {
        let Some(handle) = handle.into() else {
            return Ok(());
        };
        let (at, mut header) = self.locate(handle).map_err(|fault| {
            debug!("fixheap: rejected release of {handle}: {fault}");
            HeapError::InvalidRelease {
                offset: handle.offset(),
                fault,
            }
        })?;

        header.status = BlockStatus::Free;
        BlockHeader::set_status(self.arena_mut(), at as usize, BlockStatus::Free);
        let mut current = at;

        if let Some(prev_at) = header.prev {
            if let Some(prev) = self.header(prev_at).filter(BlockHeader::is_free) {
                header = self.absorb_next(prev_at, prev, current, header);
                current = prev_at;
            }
        }

        if let Some(next_at) = header.next {
            if let Some(next) = self.header(next_at).filter(BlockHeader::is_free) {
                self.absorb_next(current, header, next_at, next);
            }
        }
        Ok(())
    }

    /// Shared view of a live allocation's usable bytes.
    ///
    /// The slice covers the whole block past its header, which is at least
    /// the size originally requested.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not a live
    /// allocation.
    pub fn bytes(&self, handle: Handle) -> Result<&[u8], HeapError> {
        let (at, header) = self.locate(handle).map_err(|fault| invalid_handle(handle, fault))?;
        let end = at as usize + header.size as usize;
        Ok(&self.arena()[handle.index()..end])
    }

    /// Mutable view of a live allocation's usable bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not a live
    /// allocation.
    pub fn bytes_mut(&mut self, handle: Handle) -> Result<&mut [u8], HeapError> {
        let (at, header) = self.locate(handle).map_err(|fault| invalid_handle(handle, fault))?;
        let end = at as usize + header.size as usize;
        Ok(&mut self.arena_mut()[handle.index()..end])
    }

    /// Number of usable bytes behind a live allocation.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidHandle`] if the handle is not a live
    /// allocation.
    pub fn usable_size(&self, handle: Handle) -> Result<usize, HeapError> {
        self.bytes(handle).map(<[u8]>::len)
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Total arena capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Configured alignment in bytes.
    pub const fn alignment(&self) -> usize {
        self.config.alignment
    }

    /// Header footprint in bytes.
    pub const fn header_size(&self) -> usize {
        self.header_size
    }

    /// Configured split threshold in bytes.
    pub const fn split_threshold(&self) -> usize {
        self.config.split_threshold
    }

    /// The configuration this heap was built with.
    pub const fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Whether the first allocation has laid out the block list yet.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Iterate over every block in address order.
    ///
    /// Before the first allocation this yields a single free block spanning
    /// the arena, which is what initialization will create.
    pub fn blocks(&self) -> Blocks<'_> {
        if self.initialized {
            Blocks {
                arena: self.arena(),
                pending: None,
                next: self.head,
            }
        } else {
            Blocks {
                arena: self.arena(),
                pending: Some(BlockInfo {
                    offset: 0,
                    size: N as u32,
                    status: BlockStatus::Free,
                    prev: None,
                    next: None,
                }),
                next: None,
            }
        }
    }

    /// Number of blocks, free and allocated.
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Bytes held by free blocks, headers included.
    pub fn free_bytes(&self) -> usize {
        self.blocks()
            .filter(BlockInfo::is_free)
            .map(|b| b.size as usize)
            .sum()
    }

    /// Bytes held by allocated blocks, headers included.
    pub fn allocated_bytes(&self) -> usize {
        self.blocks()
            .filter(|b| !b.is_free())
            .map(|b| b.size as usize)
            .sum()
    }

    /// Size of the largest free block, header included; 0 if none.
    pub fn largest_free_block(&self) -> usize {
        self.blocks()
            .filter(BlockInfo::is_free)
            .map(|b| b.size as usize)
            .max()
            .unwrap_or(0)
    }

    /// Usage summary gathered in one pass over the block list.
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            capacity: N,
            ..HeapStats::default()
        };
        for block in self.blocks() {
            stats.record(&block);
        }
        stats
    }

    // ── Internals ───────────────────────────────────────────────────

    fn arena(&self) -> &[u8] {
        &self.storage.0
    }

    fn arena_mut(&mut self) -> &mut [u8] {
        &mut self.storage.0
    }

    fn header(&self, at: u32) -> Option<BlockHeader> {
        BlockHeader::read(self.arena(), at as usize)
    }

    fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        BlockHeader {
            size: N as u32,
            prev: None,
            next: None,
            status: BlockStatus::Free,
        }
        .write(self.arena_mut(), 0);
        self.head = Some(0);
        self.initialized = true;
        trace!("fixheap: initialized {} byte arena as one free block", N);
    }

    fn out_of_memory(&self, requested: usize, needed: Option<usize>) -> HeapError {
        let needed = needed.unwrap_or(usize::MAX);
        debug!(
            "fixheap: out of memory for {requested} bytes ({needed} with header), largest free block {}",
            self.largest_free_block()
        );
        HeapError::OutOfMemory {
            requested,
            needed,
            capacity: N,
        }
    }

    /// First free block in address order holding at least `needed` bytes.
    fn first_fit(&self, head: u32, needed: u32) -> Option<BlockInfo> {
        Blocks {
            arena: self.arena(),
            pending: None,
            next: Some(head),
        }
        .find(|b| b.is_free() && b.size >= needed)
    }

    /// Carve `needed` bytes off the high end of `candidate`.
    ///
    /// The new block is linked between `candidate` and its old successor;
    /// `candidate` shrinks in place and stays free. Returns the new block's
    /// offset.
    fn split_tail(&mut self, candidate: BlockInfo, needed: u32) -> u32 {
        let remaining = candidate.size - needed;
        let at = candidate.offset + remaining;
        let arena = self.arena_mut();

        BlockHeader {
            size: needed,
            prev: Some(candidate.offset),
            next: candidate.next,
            status: BlockStatus::Free,
        }
        .write(arena, at as usize);
        if let Some(next) = candidate.next {
            BlockHeader::set_prev(arena, next as usize, Some(at));
        }
        BlockHeader::set_next(arena, candidate.offset as usize, Some(at));
        BlockHeader::set_size(arena, candidate.offset as usize, remaining);

        trace!(
            "fixheap: split block at {} into {remaining} + {needed} bytes",
            candidate.offset
        );
        at
    }

    /// Merge the block at `next_at` into the free block at `at`, which
    /// must be its physical predecessor. Returns the merged header.
    fn absorb_next(
        &mut self,
        at: u32,
        header: BlockHeader,
        next_at: u32,
        next: BlockHeader,
    ) -> BlockHeader {
        let merged = BlockHeader {
            size: header.size + next.size,
            prev: header.prev,
            next: next.next,
            status: BlockStatus::Free,
        };
        let arena = self.arena_mut();
        merged.write(arena, at as usize);
        if let Some(after) = next.next {
            BlockHeader::set_prev(arena, after as usize, Some(at));
        }
        BlockHeader::scrub(arena, next_at as usize);

        trace!(
            "fixheap: merged block at {next_at} into {at}, now {} bytes",
            merged.size
        );
        merged
    }

    /// Find the live allocated block behind `handle`.
    ///
    /// Checks bounds and alignment, that a header is present, and that the
    /// header's links agree with its neighbours, before looking at the
    /// status. The links check keeps a stale handle whose bytes were
    /// reused from being taken for a block.
    fn locate(&self, handle: Handle) -> Result<(u32, BlockHeader), HandleFault> {
        let at = handle
            .offset()
            .checked_sub(self.header_size as u32)
            .ok_or(HandleFault::OutOfBounds)?;
        if at as usize + self.header_size > N {
            return Err(HandleFault::OutOfBounds);
        }
        if at as usize % self.config.alignment != 0 {
            return Err(HandleFault::Misaligned);
        }
        if !self.initialized {
            return Err(HandleFault::NotABlock);
        }
        let header = self.header(at).ok_or(HandleFault::NotABlock)?;
        if !self.is_linked(at, &header) {
            return Err(HandleFault::NotABlock);
        }
        if header.is_free() {
            return Err(HandleFault::AlreadyFree);
        }
        Ok((at, header))
    }

    fn is_linked(&self, at: u32, header: &BlockHeader) -> bool {
        let size = header.size as usize;
        let end = header.end(at);
        if size < self.header_size || size % self.config.alignment != 0 || end > N as u64 {
            return false;
        }
        let prev_ok = match header.prev {
            None => self.head == Some(at),
            Some(prev_at) => self
                .header(prev_at)
                .is_some_and(|prev| prev.next == Some(at) && prev.end(prev_at) == at as u64),
        };
        let next_ok = match header.next {
            None => end == N as u64,
            Some(next_at) => {
                next_at as u64 == end
                    && self.header(next_at).is_some_and(|next| next.prev == Some(at))
            }
        };
        prev_ok && next_ok
    }
}

impl<const N: usize> Default for FixedHeap<N> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<const N: usize> fmt::Debug for FixedHeap<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedHeap")
            .field("capacity", &N)
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("stats", &self.stats())
            .finish()
    }
}

fn invalid_handle(handle: Handle, fault: HandleFault) -> HeapError {
    debug!("fixheap: rejected {handle}: {fault}");
    HeapError::InvalidHandle {
        offset: handle.offset(),
        fault,
    }
}

/// Address-ordered iterator over a heap's blocks.
///
/// Created by [`FixedHeap::blocks`].
#[derive(Clone, Debug)]
pub struct Blocks<'a> {
    arena: &'a [u8],
    /// A block to yield before walking the list (the implicit initial
    /// block of an uninitialized heap).
    pending: Option<BlockInfo>,
    next: Option<u32>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        if let Some(info) = self.pending.take() {
            return Some(info);
        }
        let at = self.next?;
        let header = BlockHeader::read(self.arena, at as usize)?;
        self.next = header.next;
        Some(BlockInfo::from_header(at, header))
    }
}
