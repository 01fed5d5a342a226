//! Approximate memory-usage accounting.
//!
//! The arena mutates its blocks from a single owning thread, but the
//! reserved-bytes counter can be read from anywhere through a
//! [`UsageMonitor`]. Reads use `Relaxed` ordering: they never tear and
//! never go backwards, but they may lag the owner and do not synchronize
//! any other memory. Use them for telemetry, not for correctness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared counter of bytes reserved by an arena.
#[derive(Debug, Default)]
pub(crate) struct UsageCounter(Arc<AtomicUsize>);

impl UsageCounter {
    /// Add `bytes` and return the new total.
    pub(crate) fn add(&self, bytes: usize) -> usize {
        self.0.fetch_add(bytes, Ordering::Relaxed) + bytes
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn monitor(&self) -> UsageMonitor {
        UsageMonitor {
            counter: Arc::clone(&self.0),
        }
    }
}

/// Read-only, thread-safe view of an arena's reserved bytes.
///
/// Obtained from [`Arena::usage_monitor`](crate::Arena::usage_monitor).
/// The monitor may outlive the arena; it then keeps reporting the final
/// total.
#[derive(Clone, Debug)]
pub struct UsageMonitor {
    counter: Arc<AtomicUsize>,
}

impl UsageMonitor {
    /// Total bytes reserved so far, including block bookkeeping and
    /// space abandoned at the end of blocks.
    ///
    /// Possibly stale when the arena is being mutated on another thread.
    pub fn get(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}
