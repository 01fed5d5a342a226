//! The arena allocator: bump allocation over provider-backed blocks.
//!
//! Small requests are carved from the active standard block. When it runs
//! out, requests above the large threshold get a dedicated block of their
//! exact size and leave the active block alone; everything else abandons
//! the active block's tail and starts a fresh standard block.

use std::fmt;
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::config::{ArenaConfig, ALIGN};
use crate::error::ArenaError;
use crate::raw::{
    BlockList, BlockProvider, BumpCursor, Span, SystemProvider, BLOCK_HANDLE_OVERHEAD,
};
use crate::usage::{UsageCounter, UsageMonitor};

/// Region allocator that frees everything at once when dropped.
///
/// Returned pointers address uninitialized memory that stays valid and
/// exclusively owned by the caller until the arena is dropped. Dropping
/// the arena invalidates every pointer it ever returned.
///
/// Allocation takes `&mut self`: one arena serves one thread at a time.
/// Use one arena per thread, or wrap it in a `Mutex`. The usage counter
/// can still be watched from other threads via [`Arena::usage_monitor`].
pub struct Arena<P: BlockProvider = SystemProvider> {
    cursor: BumpCursor,
    blocks: BlockList<P>,
    usage: UsageCounter,
    config: ArenaConfig,
}

/// Point-in-time summary of an arena's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks acquired so far, standard and dedicated.
    pub blocks: usize,
    /// Bytes reserved, as reported by [`Arena::memory_usage`].
    pub memory_usage: usize,
    /// Free bytes left in the active standard block.
    pub remaining: usize,
}

impl Arena<SystemProvider> {
    /// Create an empty arena with the default configuration.
    ///
    /// No memory is reserved until the first allocation.
    pub fn new() -> Self {
        Self::from_parts(ArenaConfig::default(), SystemProvider)
    }

    /// Create an empty arena with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `config` fails [`ArenaConfig::validate`].
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_provider(config, SystemProvider)
    }
}

impl Default for Arena<SystemProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: BlockProvider> Arena<P> {
    /// Create an empty arena drawing its blocks from `provider`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `config` fails [`ArenaConfig::validate`].
    pub fn with_provider(config: ArenaConfig, provider: P) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::from_parts(config, provider))
    }

    fn from_parts(config: ArenaConfig, provider: P) -> Self {
        Self {
            cursor: BumpCursor::empty(),
            blocks: BlockList::new(provider),
            usage: UsageCounter::default(),
            config,
        }
    }

    /// Allocate `bytes` bytes with no alignment guarantee.
    ///
    /// `bytes` must be non-zero; zero-byte requests are rejected in debug
    /// builds and return an unusable pointer otherwise.
    #[inline]
    pub fn allocate(&mut self, bytes: usize) -> NonNull<u8> {
        debug_assert!(bytes > 0, "zero-byte arena allocation");
        if let Some(ptr) = self.cursor.take(bytes) {
            return ptr;
        }
        self.allocate_fallback(bytes)
    }

    /// Allocate `bytes` bytes aligned to [`ALIGN`].
    ///
    /// Padding skipped to reach alignment inside the active block is
    /// never reused.
    pub fn allocate_aligned(&mut self, bytes: usize) -> NonNull<u8> {
        debug_assert!(bytes > 0, "zero-byte arena allocation");
        let result = match self.cursor.take_aligned(bytes, ALIGN) {
            Some(ptr) => ptr,
            // Fresh blocks are BLOCK_ALIGN-aligned, so no slop is needed here.
            None => self.allocate_fallback(bytes),
        };
        debug_assert_eq!(result.as_ptr() as usize & (ALIGN - 1), 0);
        result
    }

    /// Copy `src` into freshly allocated arena memory.
    ///
    /// `src` must be non-empty, as for [`allocate`](Self::allocate).
    pub fn allocate_copy(&mut self, src: &[u8]) -> NonNull<u8> {
        let dst = self.allocate(src.len());
        #[allow(unsafe_code)]
        // SAFETY: dst is valid for src.len() bytes and was just handed out,
        // so it cannot overlap src.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len());
        }
        dst
    }

    /// Slow path: the active block cannot hold `bytes`.
    #[cold]
    #[inline(never)]
    fn allocate_fallback(&mut self, bytes: usize) -> NonNull<u8> {
        if bytes > self.config.large_threshold {
            // Keep the active block's tail for later small requests.
            return self.acquire_block(bytes, true).base();
        }

        // The active block's tail is abandoned.
        let span = self.acquire_block(self.config.block_size, false);
        self.cursor = BumpCursor::within(span, bytes);
        span.base()
    }

    fn acquire_block(&mut self, block_bytes: usize, dedicated: bool) -> Span {
        let span = self.blocks.acquire(block_bytes);
        let memory_usage = self.usage.add(block_bytes + BLOCK_HANDLE_OVERHEAD);
        trace!(
            block_bytes,
            dedicated,
            blocks = self.blocks.len(),
            memory_usage,
            "arena acquired block"
        );
        span
    }

    /// Estimated bytes reserved by this arena.
    ///
    /// Counts every block in full plus [`BLOCK_HANDLE_OVERHEAD`] per
    /// block, so it is at least the sum of all requested sizes. The read
    /// is `Relaxed`: suitable for monitoring only.
    pub fn memory_usage(&self) -> usize {
        self.usage.get()
    }

    /// A handle for reading [`memory_usage`](Self::memory_usage) from
    /// other threads while this arena keeps allocating.
    pub fn usage_monitor(&self) -> UsageMonitor {
        self.usage.monitor()
    }

    /// Number of blocks acquired so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sizes of all acquired blocks, in acquisition order.
    pub fn block_sizes(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.blocks.sizes()
    }

    /// Free bytes left in the active standard block.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Snapshot of block count, usage and remaining space.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            blocks: self.block_count(),
            memory_usage: self.memory_usage(),
            remaining: self.remaining(),
        }
    }
}

impl<P: BlockProvider> fmt::Debug for Arena<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("blocks", &self.blocks.len())
            .field("remaining", &self.cursor.remaining())
            .field("memory_usage", &self.usage.get())
            .finish()
    }
}

impl<P: BlockProvider> Drop for Arena<P> {
    fn drop(&mut self) {
        // Blocks themselves are returned by `BlockList`'s drop.
        debug!(
            blocks = self.blocks.len(),
            memory_usage = self.usage.get(),
            "arena released"
        );
    }
}
