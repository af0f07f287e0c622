//! A [`FixedHeap`] shared behind a single spin lock.
//!
//! [`FixedHeap`] assumes one writer. [`LockedHeap`] lifts that assumption
//! by putting the whole arena behind one `spin::Mutex`: each `allocate`
//! and `release` is a single critical section, and callers that need
//! several operations to appear atomic take the lock once via
//! [`LockedHeap::lock`]. This is a different contract from the core heap
//! (shared `&self` access, blocking on contention) and is opt-in.

use spin::{Mutex, MutexGuard};

use crate::config::HeapConfig;
use crate::error::{ConfigError, HeapError};
use crate::handle::Handle;
use crate::heap::FixedHeap;
use crate::stats::HeapStats;

/// A [`FixedHeap`] usable from several threads.
///
/// ```
/// use fixheap_core::LockedHeap;
///
/// static HEAP: LockedHeap<4096> = LockedHeap::with_defaults();
///
/// let h = HEAP.allocate(64).unwrap();
/// HEAP.release(h).unwrap();
/// assert_eq!(HEAP.stats().free_bytes, 4096);
/// ```
pub struct LockedHeap<const N: usize> {
    inner: Mutex<FixedHeap<N>>,
}

impl<const N: usize> LockedHeap<N> {
    /// Create a locked heap over an `N`-byte arena.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is unusable for `N` bytes.
    pub fn new(config: HeapConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Mutex::new(FixedHeap::new(config)?),
        })
    }

    /// Create a locked heap with the default config; usable in `static`s.
    pub const fn with_defaults() -> Self {
        Self {
            inner: Mutex::new(FixedHeap::with_defaults()),
        }
    }

    /// [`FixedHeap::allocate`] under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::OutOfMemory`] when no block fits.
    pub fn allocate(&self, requested: usize) -> Result<Handle, HeapError> {
        self.inner.lock().allocate(requested)
    }

    /// [`FixedHeap::allocate_zeroed`] under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::OutOfMemory`] when no block fits.
    pub fn allocate_zeroed(&self, requested: usize) -> Result<Handle, HeapError> {
        self.inner.lock().allocate_zeroed(requested)
    }

    /// [`FixedHeap::release`] under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`HeapError::InvalidRelease`] for handles that are not live.
    pub fn release(&self, handle: impl Into<Option<Handle>>) -> Result<(), HeapError> {
        self.inner.lock().release(handle)
    }

    /// Take the lock for a batch of operations.
    pub fn lock(&self) -> MutexGuard<'_, FixedHeap<N>> {
        self.inner.lock()
    }

    /// Usage summary taken under the lock.
    pub fn stats(&self) -> HeapStats {
        self.inner.lock().stats()
    }

    /// Unwrap the heap.
    pub fn into_inner(self) -> FixedHeap<N> {
        self.inner.into_inner()
    }
}

impl<const N: usize> Default for LockedHeap<N> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_release_through_lock() {
        let heap = LockedHeap::<1024>::with_defaults();
        let h = heap.allocate(100).unwrap();
        assert_eq!(heap.stats().allocated_blocks, 1);
        heap.release(h).unwrap();
        heap.release(None).unwrap();
        assert_eq!(heap.stats().block_count, 1);
    }

    #[test]
    fn batch_under_one_guard() {
        let heap = LockedHeap::<1024>::with_defaults();
        {
            let mut guard = heap.lock();
            let a = guard.allocate(32).unwrap();
            guard.bytes_mut(a).unwrap()[0] = 7;
            assert_eq!(guard.bytes(a).unwrap()[0], 7);
            guard.release(a).unwrap();
        }
        assert_eq!(heap.into_inner().free_bytes(), 1024);
    }

    #[test]
    fn new_propagates_config_errors() {
        assert!(matches!(
            LockedHeap::<1024>::new(HeapConfig::with_alignment(6)),
            Err(ConfigError::AlignmentNotPowerOfTwo { .. })
        ));
    }

    #[test]
    fn concurrent_churn_leaves_heap_whole() {
        let heap = LockedHeap::<{ 64 * 1024 }>::with_defaults();
        std::thread::scope(|s| {
            for t in 0..4u8 {
                let heap = &heap;
                s.spawn(move || {
                    for i in 0..200usize {
                        let size = 8 + (i * 13 + t as usize * 7) % 120;
                        let h = heap.allocate(size).unwrap();
                        heap.lock().bytes_mut(h).unwrap()[..size].fill(t);
                        assert!(heap.lock().bytes(h).unwrap()[..size]
                            .iter()
                            .all(|&v| v == t));
                        heap.release(h).unwrap();
                    }
                });
            }
        });
        let stats = heap.stats();
        assert_eq!(stats.block_count, 1);
        assert_eq!(stats.free_bytes, 64 * 1024);
    }
}
