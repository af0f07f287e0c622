//! A fixed-capacity, statically backed first-fit heap.
//!
//! [`FixedHeap`] carves one `N`-byte arena into variable-sized blocks,
//! hands them out as offset [`Handle`]s, and merges neighbouring free
//! blocks on release. It needs no operating-system heap: the arena lives
//! inside the value, which can itself live in a `static`.
//!
//! # Architecture
//!
//! ```text
//! FixedHeap<N>
//! ├── Storage<N>            ([u8; N], 64-byte aligned)
//! │   └── block list        inline headers, address ordered, doubly linked
//! ├── HeapConfig            alignment, split threshold
//! └── head                  offset of the first block (always 0 once laid out)
//!
//! LockedHeap<N>             spin::Mutex<FixedHeap<N>> for shared use
//! ```
//!
//! # Block lifecycle
//!
//! - **Init:** the first `allocate` lays out one free block spanning the arena.
//! - **Split:** a free block with enough surplus gives up its tail end.
//! - **Merge:** a released block absorbs, or is absorbed by, free neighbours.
//!
//! # Safety
//!
//! No `unsafe`. Headers are encoded into the arena bytes and every offset
//! derived from a caller's handle is bounds-checked before use.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod heap;
pub mod locked;
pub mod stats;

// Public re-exports for the primary API surface.
pub use block::{BlockInfo, BlockStatus};
pub use config::HeapConfig;
pub use error::{ConfigError, HandleFault, HeapError};
pub use handle::Handle;
pub use heap::{Blocks, FixedHeap};
pub use locked::LockedHeap;
pub use stats::HeapStats;
