//! Low-level primitives for arena memory operations.
//!
//! Every `unsafe` operation in the crate lives here, behind three types
//! with safe interfaces:
//!
//! - [`BlockProvider`] / [`SystemProvider`]: where block memory comes from.
//! - `BlockList`: owns acquired blocks and returns them all on drop.
//! - `BumpCursor`: the bump pointer over the active block.
//!
//! Each `unsafe` block carries a mandatory `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::config::BLOCK_ALIGN;

/// Source of raw memory blocks for an arena.
///
/// # Safety
///
/// Implementors must guarantee that [`acquire`](BlockProvider::acquire)
/// returns a pointer valid for reads and writes of `layout.size()` bytes,
/// aligned to `layout.align()`, and not aliased by any other live block,
/// until it is passed back to [`release`](BlockProvider::release).
/// If memory cannot be obtained, `acquire` must not return: it should
/// call [`std::alloc::handle_alloc_error`] or otherwise diverge.
pub unsafe trait BlockProvider {
    /// Obtain a block described by `layout`.
    fn acquire(&self, layout: Layout) -> NonNull<u8>;

    /// Return a block previously obtained from [`acquire`](BlockProvider::acquire).
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `self.acquire(layout)` with this exact
    /// `layout`, and must not have been released already.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Block provider backed by the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProvider;

// SAFETY: the global allocator upholds the provider contract for
// non-zero sizes; zero-sized layouts get a dangling, aligned pointer that
// is never dereferenced and never handed to `dealloc`.
unsafe impl BlockProvider for SystemProvider {
    fn acquire(&self, layout: Layout) -> NonNull<u8> {
        if layout.size() == 0 {
            return NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling());
        }
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: caller guarantees ptr came from `acquire(layout)`,
        // which for non-zero sizes is `alloc::alloc(layout)`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Bookkeeping for one acquired block: base address and layout.
pub(crate) struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

/// Per-block bookkeeping cost charged to the arena's usage counter.
pub const BLOCK_HANDLE_OVERHEAD: usize = std::mem::size_of::<Block>();

/// A view of a freshly acquired block, used to seed a [`BumpCursor`].
///
/// Only constructed by [`BlockList::acquire`], so `base..base + len` is
/// always memory owned by a live block.
#[derive(Clone, Copy)]
pub(crate) struct Span {
    base: NonNull<u8>,
    len: usize,
}

impl Span {
    /// First byte of the block.
    pub(crate) fn base(self) -> NonNull<u8> {
        self.base
    }
}

/// Ordered collection of blocks obtained from a single provider.
///
/// Blocks are never moved, resized, or released individually. Dropping
/// the list returns every block to the provider in acquisition order.
pub(crate) struct BlockList<P: BlockProvider> {
    blocks: Vec<Block>,
    provider: P,
}

impl<P: BlockProvider> BlockList<P> {
    pub(crate) fn new(provider: P) -> Self {
        Self {
            blocks: Vec::new(),
            provider,
        }
    }

    /// Acquire a new block of exactly `size` bytes aligned to [`BLOCK_ALIGN`].
    ///
    /// # Panics
    ///
    /// Panics if `size` cannot be described by a `Layout`. Provider
    /// exhaustion does not return.
    pub(crate) fn acquire(&mut self, size: usize) -> Span {
        let layout = match Layout::from_size_align(size, BLOCK_ALIGN) {
            Ok(layout) => layout,
            Err(_) => capacity_overflow(size),
        };
        let ptr = self.provider.acquire(layout);
        self.blocks.push(Block { ptr, layout });
        Span {
            base: ptr,
            len: size,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Sizes of all blocks in acquisition order.
    pub(crate) fn sizes(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.blocks.iter().map(|b| b.layout.size())
    }
}

impl<P: BlockProvider> Drop for BlockList<P> {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            // SAFETY: every block was obtained from `self.provider.acquire`
            // with its stored layout, and draining visits each exactly once.
            unsafe { self.provider.release(block.ptr, block.layout) }
        }
    }
}

// SAFETY: the list exclusively owns its blocks; moving it to another
// thread moves that ownership along with the provider.
unsafe impl<P: BlockProvider + Send> Send for BlockList<P> {}

#[cold]
#[inline(never)]
fn capacity_overflow(size: usize) -> ! {
    panic!("arena block of {size} bytes exceeds the maximum allocation size")
}

/// Bump pointer over the unused tail of the active block.
///
/// Invariant: `remaining` bytes starting at `ptr` lie inside a block owned
/// by the arena's `BlockList`. The empty cursor has `remaining == 0` and a
/// dangling `ptr` that is only ever returned for zero-byte requests.
pub(crate) struct BumpCursor {
    ptr: NonNull<u8>,
    remaining: usize,
}

impl BumpCursor {
    pub(crate) const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            remaining: 0,
        }
    }

    /// Cursor over `span` with its first `consumed` bytes already handed out.
    ///
    /// # Panics
    ///
    /// Panics if `consumed` exceeds the span.
    pub(crate) fn within(span: Span, consumed: usize) -> Self {
        assert!(consumed <= span.len, "consumed past the end of a block");
        Self {
            // SAFETY: consumed <= span.len, so the result is within or one
            // past the end of the block.
            ptr: unsafe { span.base.add(consumed) },
            remaining: span.len - consumed,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    /// Bytes needed to round the cursor up to a multiple of `align`.
    ///
    /// `align` must be a power of two.
    #[inline]
    pub(crate) fn slop(&self, align: usize) -> usize {
        let current_mod = self.ptr.as_ptr() as usize & (align - 1);
        if current_mod == 0 {
            0
        } else {
            align - current_mod
        }
    }

    /// Hand out `bytes` from the front of the remaining space.
    #[inline]
    pub(crate) fn take(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes > self.remaining {
            return None;
        }
        let result = self.ptr;
        // SAFETY: bytes <= remaining, so the new cursor stays within or one
        // past the end of the active block.
        self.ptr = unsafe { self.ptr.add(bytes) };
        self.remaining -= bytes;
        Some(result)
    }

    /// Hand out `bytes` at the next multiple of `align`, discarding the
    /// padding in front of it.
    #[inline]
    pub(crate) fn take_aligned(&mut self, bytes: usize, align: usize) -> Option<NonNull<u8>> {
        let slop = self.slop(align);
        let needed = bytes.checked_add(slop)?;
        let start = self.take(needed)?;
        // SAFETY: slop <= needed bytes were just taken starting at `start`.
        Some(unsafe { start.add(slop) })
    }
}

// SAFETY: the cursor points into blocks owned by the same arena and moves
// between threads together with them.
unsafe impl Send for BumpCursor {}
