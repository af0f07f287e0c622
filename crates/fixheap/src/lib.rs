//! fixheap: a fixed-size, statically backed heap for environments with no
//! operating-system allocator.
//!
//! This is the top-level facade crate. It re-exports the allocator from
//! `fixheap-core`; most users only need the [`prelude`].
//!
//! # Quick start
//!
//! ```rust
//! use fixheap::prelude::*;
//!
//! let mut heap = FixedHeap::<1024>::with_defaults();
//!
//! let a = heap.allocate(100).unwrap();
//! assert_eq!(a.index() % heap.alignment(), 0);
//! assert!(heap.allocate(1024).is_err());
//!
//! heap.release(a).unwrap();
//! let whole = heap.allocate(1024 - heap.header_size()).unwrap();
//! assert_eq!(heap.block_count(), 1);
//! heap.release(whole).unwrap();
//! ```
//!
//! A heap shared between threads, living in a `static`:
//!
//! ```rust
//! use fixheap::prelude::*;
//!
//! static HEAP: LockedHeap<8192> = LockedHeap::with_defaults();
//!
//! let h = HEAP.allocate_zeroed(256).unwrap();
//! HEAP.release(h).unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | `HeapConfig`, alignment helpers, limits |
//! | [`error`] | `HeapError`, `ConfigError`, `HandleFault` |
//! | [`heap`] | `FixedHeap`, block iterator |
//! | [`locked`] | `LockedHeap` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]
#![no_std]

pub use fixheap_core::{block, config, error, handle, heap, locked, stats};

pub use fixheap_core::{
    BlockInfo, BlockStatus, Blocks, ConfigError, FixedHeap, Handle, HandleFault, HeapConfig,
    HeapError, HeapStats, LockedHeap,
};

/// Common imports for heap users.
///
/// ```rust
/// use fixheap::prelude::*;
/// ```
pub mod prelude {
    pub use fixheap_core::{FixedHeap, Handle, HeapConfig, HeapError, HeapStats, LockedHeap};
}
