//! Heap-specific error types.

use core::error::Error;
use core::fmt;

/// Why a handle was not accepted as a live allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleFault {
    /// The handle's header would lie outside the arena.
    OutOfBounds,
    /// The handle's header offset is not a multiple of the alignment.
    Misaligned,
    /// No live block header sits in front of the handle, or its links
    /// disagree with its neighbours.
    NotABlock,
    /// The block is already free (double release or stale handle).
    AlreadyFree,
}

impl fmt::Display for HandleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutOfBounds => "out of bounds",
            Self::Misaligned => "misaligned",
            Self::NotABlock => "not a block",
            Self::AlreadyFree => "already free",
        };
        f.write_str(text)
    }
}

/// Errors returned by heap operations.
///
/// Every failing operation leaves the heap exactly as it found it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// No free block is large enough, or the footprint exceeds the arena.
    OutOfMemory {
        /// User bytes requested.
        requested: usize,
        /// Aligned footprint including the header, saturated on overflow.
        needed: usize,
        /// Total arena capacity in bytes.
        capacity: usize,
    },
    /// `release` was given a handle that is not a live allocation.
    InvalidRelease {
        /// The handle's offset.
        offset: u32,
        /// What the validation found.
        fault: HandleFault,
    },
    /// A data-access call was given a handle that is not a live allocation.
    InvalidHandle {
        /// The handle's offset.
        offset: u32,
        /// What the validation found.
        fault: HandleFault,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                needed,
                capacity,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes ({needed} with header), capacity {capacity} bytes"
                )
            }
            Self::InvalidRelease { offset, fault } => {
                write!(f, "invalid release of offset {offset}: {fault}")
            }
            Self::InvalidHandle { offset, fault } => {
                write!(f, "invalid handle at offset {offset}: {fault}")
            }
        }
    }
}

impl Error for HeapError {}

/// Construction-time configuration errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Alignment is zero or not a power of two.
    AlignmentNotPowerOfTwo {
        /// The configured alignment.
        alignment: usize,
    },
    /// Alignment exceeds what the arena storage guarantees.
    AlignmentTooLarge {
        /// The configured alignment.
        alignment: usize,
        /// Largest supported alignment.
        max: usize,
    },
    /// Capacity cannot hold even one block header.
    CapacityTooSmall {
        /// The arena capacity.
        capacity: usize,
        /// Header footprint for the configured alignment.
        header_size: usize,
    },
    /// Capacity is not a multiple of the alignment.
    CapacityNotAligned {
        /// The arena capacity.
        capacity: usize,
        /// The configured alignment.
        alignment: usize,
    },
    /// Capacity does not fit the `u32` offset encoding.
    CapacityTooLarge {
        /// The arena capacity.
        capacity: usize,
        /// Largest supported capacity.
        max: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlignmentNotPowerOfTwo { alignment } => {
                write!(f, "alignment {alignment} is not a power of two")
            }
            Self::AlignmentTooLarge { alignment, max } => {
                write!(f, "alignment {alignment} exceeds maximum {max}")
            }
            Self::CapacityTooSmall {
                capacity,
                header_size,
            } => {
                write!(
                    f,
                    "capacity {capacity} bytes cannot hold a {header_size}-byte header"
                )
            }
            Self::CapacityNotAligned {
                capacity,
                alignment,
            } => {
                write!(
                    f,
                    "capacity {capacity} bytes is not a multiple of alignment {alignment}"
                )
            }
            Self::CapacityTooLarge { capacity, max } => {
                write!(f, "capacity {capacity} bytes exceeds maximum {max}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_message_names_sizes() {
        let err = HeapError::OutOfMemory {
            requested: 100,
            needed: 120,
            capacity: 64,
        };
        assert_eq!(
            err.to_string(),
            "out of memory: requested 100 bytes (120 with header), capacity 64 bytes"
        );
    }

    #[test]
    fn invalid_release_message_names_fault() {
        let err = HeapError::InvalidRelease {
            offset: 40,
            fault: HandleFault::AlreadyFree,
        };
        assert_eq!(err.to_string(), "invalid release of offset 40: already free");
    }

    #[test]
    fn config_error_message() {
        let err = ConfigError::CapacityNotAligned {
            capacity: 1020,
            alignment: 8,
        };
        assert_eq!(
            err.to_string(),
            "capacity 1020 bytes is not a multiple of alignment 8"
        );
    }
}
