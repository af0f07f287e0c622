//! Heap usage summaries.

use core::fmt;

use crate::block::BlockInfo;

/// Point-in-time usage of a [`FixedHeap`](crate::FixedHeap).
///
/// All byte counts include block headers, so
/// `free_bytes + allocated_bytes == capacity` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total arena capacity in bytes.
    pub capacity: usize,
    /// Number of blocks on the list.
    pub block_count: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Bytes held by free blocks.
    pub free_bytes: usize,
    /// Bytes held by allocated blocks.
    pub allocated_bytes: usize,
    /// Size of the largest free block; 0 if the heap is full.
    pub largest_free_block: usize,
}

impl HeapStats {
    pub(crate) fn record(&mut self, block: &BlockInfo) {
        let size = block.size as usize;
        self.block_count += 1;
        if block.is_free() {
            self.free_blocks += 1;
            self.free_bytes += size;
            self.largest_free_block = self.largest_free_block.max(size);
        } else {
            self.allocated_blocks += 1;
            self.allocated_bytes += size;
        }
    }

    /// Share of free bytes not in the largest free block, in `[0, 1]`.
    ///
    /// 0 means all free space is one contiguous block.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block as f64 / self.free_bytes as f64
    }
}

impl fmt::Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} bytes free in {} of {} blocks (largest free {})",
            self.free_bytes,
            self.capacity,
            self.free_blocks,
            self.block_count,
            self.largest_free_block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockStatus;

    fn block(offset: u32, size: u32, status: BlockStatus) -> BlockInfo {
        BlockInfo {
            offset,
            size,
            status,
            prev: None,
            next: None,
        }
    }

    #[test]
    fn record_splits_free_and_allocated() {
        let mut stats = HeapStats {
            capacity: 256,
            ..HeapStats::default()
        };
        stats.record(&block(0, 64, BlockStatus::Free));
        stats.record(&block(64, 64, BlockStatus::Allocated));
        stats.record(&block(128, 128, BlockStatus::Free));
        assert_eq!(stats.block_count, 3);
        assert_eq!(stats.free_blocks, 2);
        assert_eq!(stats.allocated_blocks, 1);
        assert_eq!(stats.free_bytes, 192);
        assert_eq!(stats.allocated_bytes, 64);
        assert_eq!(stats.largest_free_block, 128);
    }

    #[test]
    fn fragmentation_of_single_free_block_is_zero() {
        let mut stats = HeapStats::default();
        stats.record(&block(0, 1024, BlockStatus::Free));
        assert_eq!(stats.fragmentation(), 0.0);
    }

    #[test]
    fn fragmentation_of_full_heap_is_zero() {
        let mut stats = HeapStats::default();
        stats.record(&block(0, 1024, BlockStatus::Allocated));
        assert_eq!(stats.fragmentation(), 0.0);
    }

    #[test]
    fn fragmentation_of_split_free_space() {
        let mut stats = HeapStats::default();
        stats.record(&block(0, 64, BlockStatus::Free));
        stats.record(&block(64, 64, BlockStatus::Allocated));
        stats.record(&block(128, 64, BlockStatus::Free));
        assert!((stats.fragmentation() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn display_summarises_usage() {
        let mut stats = HeapStats {
            capacity: 128,
            ..HeapStats::default()
        };
        stats.record(&block(0, 128, BlockStatus::Free));
        assert_eq!(
            stats.to_string(),
            "128/128 bytes free in 1 of 1 blocks (largest free 128)"
        );
    }
}
