//! Allocation workloads and utilities for benchmarking strata.
//!
//! Provides deterministic request streams for benchmarks and examples:
//!
//! - [`memtable_profile`]: skiplist-node and key/value sized requests,
//!   with an occasional oversized value
//! - [`uniform_profile`]: small unaligned requests of uniform size range
//! - [`replay`]: drive an [`Arena`] through a request stream

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::{Arena, BlockProvider};

/// One allocation request in a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Requested size in bytes, always at least 1.
    pub bytes: usize,
    /// Whether the request goes through `allocate_aligned`.
    pub aligned: bool,
}

/// Deterministic 64-bit LCG step.
fn next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

/// Build a memtable-like workload of `n` requests.
///
/// Alternates an aligned skiplist node (8 bytes per level plus a header,
/// 1..=12 levels) with an unaligned encoded entry of 16..=200 bytes.
/// Roughly one entry in 64 is a 2-8 KiB value that exceeds the default
/// large threshold.
pub fn memtable_profile(seed: u64, n: usize) -> Vec<Request> {
    let mut state = seed;
    let mut requests = Vec::with_capacity(n);
    while requests.len() < n {
        let levels = 1 + (next(&mut state) % 12) as usize;
        requests.push(Request {
            bytes: 16 + 8 * levels,
            aligned: true,
        });
        if requests.len() == n {
            break;
        }
        let bytes = if next(&mut state) % 64 == 0 {
            2048 + (next(&mut state) % 6144) as usize
        } else {
            16 + (next(&mut state) % 185) as usize
        };
        requests.push(Request {
            bytes,
            aligned: false,
        });
    }
    requests
}

/// Build `n` unaligned requests uniformly sized in `1..=max_bytes`.
pub fn uniform_profile(seed: u64, n: usize, max_bytes: usize) -> Vec<Request> {
    let max = max_bytes.max(1) as u64;
    let mut state = seed;
    (0..n)
        .map(|_| Request {
            bytes: 1 + (next(&mut state) % max) as usize,
            aligned: false,
        })
        .collect()
}

/// Issue every request in `requests` against `arena`.
///
/// Returns the sum of the returned addresses so the work cannot be
/// optimised away.
pub fn replay<P: BlockProvider>(arena: &mut Arena<P>, requests: &[Request]) -> usize {
    requests.iter().fold(0usize, |acc, r| {
        let ptr = if r.aligned {
            arena.allocate_aligned(r.bytes)
        } else {
            arena.allocate(r.bytes)
        };
        acc.wrapping_add(ptr.as_ptr() as usize)
    })
}

/// Fraction of reserved bytes that were actually requested.
///
/// 1.0 means no waste; lower values include abandoned block tails,
/// alignment padding and block bookkeeping.
pub fn utilisation<P: BlockProvider>(arena: &Arena<P>, requests: &[Request]) -> f64 {
    let requested: usize = requests.iter().map(|r| r.bytes).sum();
    let reserved = arena.memory_usage();
    if reserved == 0 {
        return 0.0;
    }
    requested as f64 / reserved as f64
}
