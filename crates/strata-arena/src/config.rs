//! Arena configuration parameters and alignment constants.

use std::alloc::Layout;

use crate::error::ArenaError;

/// Alignment guaranteed by [`Arena::allocate_aligned`](crate::Arena::allocate_aligned).
///
/// The platform pointer size, but never less than 8 bytes.
pub const ALIGN: usize = if std::mem::size_of::<*const u8>() > 8 {
    std::mem::size_of::<*const u8>()
} else {
    8
};

const _: () = assert!(ALIGN.is_power_of_two(), "pointer size should be a power of 2");

/// Alignment requested from the block provider for every block.
///
/// Matches what the system allocator hands out for small objects on
/// 64-bit targets. Any fresh block therefore already satisfies [`ALIGN`].
pub const BLOCK_ALIGN: usize = if ALIGN > 16 { ALIGN } else { 16 };

const _: () = assert!(BLOCK_ALIGN.is_power_of_two() && BLOCK_ALIGN >= ALIGN);

/// Configuration for the arena allocator.
///
/// Controls standard block sizing and the cutoff above which a request
/// gets a dedicated block. Validated at construction; immutable after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each standard block in bytes.
    ///
    /// Default: 4096. Larger blocks mean fewer provider calls but more
    /// memory pinned by a mostly-empty trailing block.
    pub block_size: usize,

    /// Requests strictly larger than this that miss the active block get
    /// a dedicated block of exactly their size.
    ///
    /// Default: `block_size / 4`. This bounds the space abandoned at the
    /// end of a standard block to a quarter of the block, while moderate
    /// requests still share blocks instead of paying one provider call each.
    pub large_threshold: usize,
}

impl ArenaConfig {
    /// Default standard block size in bytes.
    pub const DEFAULT_BLOCK_SIZE: usize = 4096;

    /// Default large-request threshold: a quarter of the default block.
    pub const DEFAULT_LARGE_THRESHOLD: usize = Self::DEFAULT_BLOCK_SIZE / 4;

    /// Create a config with the default block size and threshold.
    pub fn new() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            large_threshold: Self::DEFAULT_LARGE_THRESHOLD,
        }
    }

    /// Create a config with the given block size and a threshold of a
    /// quarter block.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            large_threshold: block_size / 4,
        }
    }

    /// Check that this configuration can drive an arena.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the block is smaller than [`ALIGN`], too large to
    /// describe as a `Layout`, or smaller than the large threshold.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.block_size < ALIGN {
            return Err(ArenaError::BlockTooSmall {
                block_size: self.block_size,
                minimum: ALIGN,
            });
        }
        if Layout::from_size_align(self.block_size, BLOCK_ALIGN).is_err() {
            return Err(ArenaError::BlockTooLarge {
                block_size: self.block_size,
            });
        }
        if self.large_threshold > self.block_size {
            return Err(ArenaError::ThresholdExceedsBlock {
                threshold: self.large_threshold,
                block_size: self.block_size,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
