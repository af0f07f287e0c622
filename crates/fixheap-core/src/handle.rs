//! Allocation handles.
//!
//! A [`Handle`] is the arena offset of the first usable byte of an
//! allocation. The block header sits immediately in front of it, so the
//! header offset is recovered with one subtraction.

use core::fmt;

/// Location of a live allocation within a [`FixedHeap`](crate::FixedHeap).
///
/// Handles are plain offsets: copying one does not duplicate the
/// allocation, and a handle outlives its allocation after `release`.
/// The heap validates every handle it is given, so a stale or foreign
/// handle produces an error instead of corrupting the block list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    offset: u32,
}

impl Handle {
    pub(crate) const fn new(offset: u32) -> Self {
        Self { offset }
    }

    /// Byte offset of the usable region from the start of the arena.
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// [`offset`](Self::offset) as a `usize`, for indexing.
    pub const fn index(self) -> usize {
        self.offset as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(off={})", self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_index_agree() {
        let h = Handle::new(920);
        assert_eq!(h.offset(), 920);
        assert_eq!(h.index(), 920);
    }

    #[test]
    fn handles_order_by_offset() {
        assert!(Handle::new(16) < Handle::new(32));
    }

    #[test]
    fn release_accepts_bare_or_optional_handle() {
        fn takes(h: impl Into<Option<Handle>>) -> Option<Handle> {
            h.into()
        }
        assert_eq!(takes(Handle::new(8)), Some(Handle::new(8)));
        assert_eq!(takes(None), None);
    }
}
