//! Arena-specific error types.
//!
//! Allocation itself never returns an error: an exhausted provider
//! terminates the process. The only recoverable failures are rejected
//! configurations.

use std::error::Error;
use std::fmt;

/// Errors that can occur while configuring an arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The standard block is smaller than the alignment target, so an
    /// aligned allocation could never be served from it.
    BlockTooSmall {
        /// The configured block size in bytes.
        block_size: usize,
        /// The smallest accepted block size in bytes.
        minimum: usize,
    },
    /// The standard block size cannot be described by a `Layout`.
    BlockTooLarge {
        /// The configured block size in bytes.
        block_size: usize,
    },
    /// The large-request threshold exceeds the standard block size.
    ///
    /// Such a threshold would route requests that can never fit into a
    /// standard block down the standard-block path.
    ThresholdExceedsBlock {
        /// The configured threshold in bytes.
        threshold: usize,
        /// The configured block size in bytes.
        block_size: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockTooSmall {
                block_size,
                minimum,
            } => {
                write!(
                    f,
                    "block size too small: {block_size} bytes, minimum {minimum} bytes"
                )
            }
            Self::BlockTooLarge { block_size } => {
                write!(f, "block size too large: {block_size} bytes")
            }
            Self::ThresholdExceedsBlock {
                threshold,
                block_size,
            } => {
                write!(
                    f,
                    "large-request threshold {threshold} bytes exceeds block size {block_size} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}
