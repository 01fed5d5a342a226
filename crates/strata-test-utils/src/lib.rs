//! Test utilities for strata development.
//!
//! Provides [`TrackingProvider`], a [`BlockProvider`] that forwards to the
//! system allocator while recording every acquire and release, so tests
//! can check block sizes, alignment, and that dropping an arena returns
//! each block exactly once.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use strata_arena::{BlockProvider, SystemProvider};

/// One acquire or release observed by a [`TrackingProvider`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockEvent {
    Acquired { addr: usize, layout: Layout },
    Released { addr: usize, layout: Layout },
}

#[derive(Debug, Default)]
struct Ledger {
    events: Vec<BlockEvent>,
    live: Vec<(usize, Layout)>,
}

/// Block provider that records what it hands out.
///
/// Clones share one ledger, so a test can keep a clone after moving the
/// provider into an arena and inspect it once the arena is dropped.
#[derive(Clone, Debug, Default)]
pub struct TrackingProvider {
    ledger: Arc<Mutex<Ledger>>,
}

impl TrackingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // A panicking test thread must not hide the ledger from the others.
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every event so far, in order.
    pub fn events(&self) -> Vec<BlockEvent> {
        self.ledger().events.clone()
    }

    /// Number of blocks acquired so far.
    pub fn acquired(&self) -> usize {
        self.ledger()
            .events
            .iter()
            .filter(|e| matches!(e, BlockEvent::Acquired { .. }))
            .count()
    }

    /// Number of blocks released so far.
    pub fn released(&self) -> usize {
        self.ledger()
            .events
            .iter()
            .filter(|e| matches!(e, BlockEvent::Released { .. }))
            .count()
    }

    /// Blocks acquired and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.ledger().live.len()
    }

    /// Bytes held in blocks acquired and not yet released.
    pub fn live_bytes(&self) -> usize {
        self.ledger().live.iter().map(|(_, l)| l.size()).sum()
    }

    /// Sizes of acquired blocks in acquisition order.
    pub fn acquired_sizes(&self) -> Vec<usize> {
        self.ledger()
            .events
            .iter()
            .filter_map(|e| match e {
                BlockEvent::Acquired { layout, .. } => Some(layout.size()),
                BlockEvent::Released { .. } => None,
            })
            .collect()
    }

    /// Whether `addr..addr + len` lies inside a live block.
    pub fn contains(&self, addr: usize, len: usize) -> bool {
        self.ledger()
            .live
            .iter()
            .any(|&(base, layout)| addr >= base && addr + len <= base + layout.size())
    }
}

// SAFETY: every call is forwarded unchanged to `SystemProvider`, which
// upholds the provider contract; the ledger only observes.
unsafe impl BlockProvider for TrackingProvider {
    fn acquire(&self, layout: Layout) -> NonNull<u8> {
        let ptr = SystemProvider.acquire(layout);
        let addr = ptr.as_ptr() as usize;
        let mut ledger = self.ledger();
        ledger.events.push(BlockEvent::Acquired { addr, layout });
        ledger.live.push((addr, layout));
        ptr
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        let addr = ptr.as_ptr() as usize;
        {
            let mut ledger = self.ledger();
            let index = ledger
                .live
                .iter()
                .position(|&(a, l)| a == addr && l == layout);
            assert!(
                index.is_some(),
                "released block {addr:#x} ({} bytes) that is not live",
                layout.size()
            );
            if let Some(index) = index {
                ledger.live.swap_remove(index);
            }
            ledger.events.push(BlockEvent::Released { addr, layout });
        }
        // SAFETY: the ledger confirmed ptr is a live block acquired from
        // SystemProvider with this layout.
        unsafe { SystemProvider.release(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_acquire_and_release() {
        let provider = TrackingProvider::new();
        let layout = Layout::from_size_align(64, 16).unwrap();
        let ptr = provider.acquire(layout);
        assert_eq!(provider.live_blocks(), 1);
        assert_eq!(provider.live_bytes(), 64);
        assert!(provider.contains(ptr.as_ptr() as usize, 64));
        assert!(!provider.contains(ptr.as_ptr() as usize + 1, 64));

        unsafe { provider.release(ptr, layout) };
        assert_eq!(provider.live_blocks(), 0);
        assert_eq!(provider.acquired(), 1);
        assert_eq!(provider.released(), 1);
        assert_eq!(provider.acquired_sizes(), vec![64]);
    }

    #[test]
    fn clones_share_the_ledger() {
        let provider = TrackingProvider::new();
        let observer = provider.clone();
        let layout = Layout::from_size_align(32, 16).unwrap();
        let ptr = provider.acquire(layout);
        assert_eq!(observer.acquired(), 1);
        unsafe { provider.release(ptr, layout) };
        assert_eq!(observer.released(), 1);
    }

    #[test]
    #[should_panic(expected = "that is not live")]
    fn double_release_is_caught() {
        let provider = TrackingProvider::new();
        let layout = Layout::from_size_align(32, 16).unwrap();
        let ptr = provider.acquire(layout);
        unsafe {
            provider.release(ptr, layout);
            provider.release(ptr, layout);
        }
    }
}
