//! Inline block headers.
//!
//! Every block starts with a header encoded little-endian into the arena
//! bytes themselves:
//!
//! ```text
//! 0        4        8        12   13       16
//! ┌────────┬────────┬────────┬────┬────────┐
//! │ size   │ prev   │ next   │ st │ (zero) │ padding to alignment, then user bytes
//! └────────┴────────┴────────┴────┴────────┘
//! ```
//!
//! `prev`/`next` hold neighbour offsets with `u32::MAX` meaning "none".
//! A status byte of 0 marks bytes that are not a live header.
//! Size and status are separate fields: the status never shares bits with
//! the size, so size arithmetic and comparisons never see a flag.

use crate::config::RAW_HEADER_SIZE;

const NIL: u32 = u32::MAX;

const SIZE_AT: usize = 0;
const PREV_AT: usize = 4;
const NEXT_AT: usize = 8;
const STATUS_AT: usize = 12;

/// Allocation state of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    /// On the block list and available to `allocate`.
    Free,
    /// Handed out to a caller.
    Allocated,
}

impl BlockStatus {
    fn encode(self) -> u8 {
        match self {
            Self::Free => 1,
            Self::Allocated => 2,
        }
    }

    fn decode(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Free),
            2 => Some(Self::Allocated),
            _ => None,
        }
    }
}

/// Decoded form of an inline header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    /// Total block size in bytes, header included.
    pub(crate) size: u32,
    /// Offset of the physically preceding block.
    pub(crate) prev: Option<u32>,
    /// Offset of the physically following block.
    pub(crate) next: Option<u32>,
    pub(crate) status: BlockStatus,
}

impl BlockHeader {
    /// Read the header at `at`.
    ///
    /// Returns `None` if the header would extend past the arena, or if the
    /// bytes do not carry a live status (a scrubbed header, or user data).
    pub(crate) fn read(arena: &[u8], at: usize) -> Option<Self> {
        let bytes = arena.get(at..at.checked_add(RAW_HEADER_SIZE)?)?;
        let status = BlockStatus::decode(bytes[STATUS_AT])?;
        Some(Self {
            size: read_u32(bytes, SIZE_AT),
            prev: link(read_u32(bytes, PREV_AT)),
            next: link(read_u32(bytes, NEXT_AT)),
            status,
        })
    }

    /// Encode this header at `at`.
    pub(crate) fn write(&self, arena: &mut [u8], at: usize) {
        let bytes = &mut arena[at..at + RAW_HEADER_SIZE];
        write_u32(bytes, SIZE_AT, self.size);
        write_u32(bytes, PREV_AT, self.prev.unwrap_or(NIL));
        write_u32(bytes, NEXT_AT, self.next.unwrap_or(NIL));
        bytes[STATUS_AT..].fill(0);
        bytes[STATUS_AT] = self.status.encode();
    }

    /// Zero the header at `at` so it no longer decodes as a block.
    pub(crate) fn scrub(arena: &mut [u8], at: usize) {
        arena[at..at + RAW_HEADER_SIZE].fill(0);
    }

    /// Overwrite only the `prev` link of the header at `at`.
    pub(crate) fn set_prev(arena: &mut [u8], at: usize, prev: Option<u32>) {
        write_u32(&mut arena[at..], PREV_AT, prev.unwrap_or(NIL));
    }

    /// Overwrite only the `next` link of the header at `at`.
    pub(crate) fn set_next(arena: &mut [u8], at: usize, next: Option<u32>) {
        write_u32(&mut arena[at..], NEXT_AT, next.unwrap_or(NIL));
    }

    /// Overwrite only the size of the header at `at`.
    pub(crate) fn set_size(arena: &mut [u8], at: usize, size: u32) {
        write_u32(&mut arena[at..], SIZE_AT, size);
    }

    /// Overwrite only the status of the header at `at`.
    pub(crate) fn set_status(arena: &mut [u8], at: usize, status: BlockStatus) {
        arena[at + STATUS_AT] = status.encode();
    }

    pub(crate) fn is_free(&self) -> bool {
        self.status == BlockStatus::Free
    }

    /// Offset one past the end of a block starting at `at`.
    pub(crate) fn end(&self, at: u32) -> u64 {
        at as u64 + self.size as u64
    }
}

fn link(raw: u32) -> Option<u32> {
    (raw != NIL).then_some(raw)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read-only description of one block, as yielded by
/// [`FixedHeap::blocks`](crate::FixedHeap::blocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block header from the start of the arena.
    pub offset: u32,
    /// Total size in bytes, header included.
    pub size: u32,
    /// Allocation state.
    pub status: BlockStatus,
    /// Offset of the physically preceding block, if any.
    pub prev: Option<u32>,
    /// Offset of the physically following block, if any.
    pub next: Option<u32>,
}

impl BlockInfo {
    pub(crate) fn from_header(offset: u32, header: BlockHeader) -> Self {
        Self {
            offset,
            size: header.size,
            status: header.status,
            prev: header.prev,
            next: header.next,
        }
    }

    /// Whether the block is free.
    pub fn is_free(&self) -> bool {
        self.status == BlockStatus::Free
    }

    /// Offset one past the last byte of the block.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}
