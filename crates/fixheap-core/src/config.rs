//! Heap configuration parameters.

use crate::error::ConfigError;

/// Bytes occupied by an encoded block header before alignment padding.
pub const RAW_HEADER_SIZE: usize = 16;

/// Largest supported alignment in bytes.
///
/// The arena storage is declared with this alignment, so every offset that
/// is a multiple of a supported alignment is also address-aligned.
pub const MAX_ALIGNMENT: usize = 64;

/// Largest supported arena capacity in bytes.
///
/// Block offsets are stored as `u32` with `u32::MAX` reserved for "no
/// neighbour", so no block can start at or beyond this value.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// Configuration for a [`FixedHeap`](crate::FixedHeap).
///
/// The arena capacity itself is the heap's const generic parameter; this
/// struct carries the remaining construction-time constants. Validated at
/// construction; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Alignment granularity in bytes.
    ///
    /// Default: 8. Must be a power of two and at most [`MAX_ALIGNMENT`].
    /// Every returned handle and every block size is a multiple of it.
    pub alignment: usize,

    /// Leftover bytes at or below which a free block is handed out whole
    /// instead of being split.
    ///
    /// Default: 8.
    pub split_threshold: usize,
}

impl HeapConfig {
    /// Default alignment in bytes.
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// Default split threshold in bytes.
    pub const DEFAULT_SPLIT_THRESHOLD: usize = 8;

    /// The default configuration, usable in `const` contexts.
    pub const DEFAULT: Self = Self {
        alignment: Self::DEFAULT_ALIGNMENT,
        split_threshold: Self::DEFAULT_SPLIT_THRESHOLD,
    };

    /// Create a config with the given alignment and the default threshold.
    pub const fn with_alignment(alignment: usize) -> Self {
        Self {
            alignment,
            split_threshold: Self::DEFAULT_SPLIT_THRESHOLD,
        }
    }

    /// Header footprint in bytes: [`RAW_HEADER_SIZE`] rounded up to the
    /// alignment.
    ///
    /// Only meaningful for a config whose alignment is a power of two.
    pub const fn header_size(&self) -> usize {
        align_up(RAW_HEADER_SIZE, self.alignment)
    }

    /// Check this config against an arena of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint, checked in this order:
    /// alignment is a power of two, alignment is at most
    /// [`MAX_ALIGNMENT`], capacity is at most [`MAX_CAPACITY`], capacity
    /// is a multiple of the alignment, capacity holds at least one header.
    pub const fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::AlignmentNotPowerOfTwo {
                alignment: self.alignment,
            });
        }
        if self.alignment > MAX_ALIGNMENT {
            return Err(ConfigError::AlignmentTooLarge {
                alignment: self.alignment,
                max: MAX_ALIGNMENT,
            });
        }
        if capacity > MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        if capacity % self.alignment != 0 {
            return Err(ConfigError::CapacityNotAligned {
                capacity,
                alignment: self.alignment,
            });
        }
        let header_size = self.header_size();
        if capacity < header_size {
            return Err(ConfigError::CapacityTooSmall {
                capacity,
                header_size,
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Round `value` up to the next multiple of `align` (a power of two).
///
/// Returns `None` on overflow.
pub const fn checked_align_up(value: usize, align: usize) -> Option<usize> {
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Round `value` up to the next multiple of `align` (a power of two).
///
/// # Panics
///
/// Panics on overflow; use [`checked_align_up`] for caller-supplied sizes.
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
