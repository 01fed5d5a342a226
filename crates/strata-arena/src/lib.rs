//! Block-based bump arena allocation with bulk release.
//!
//! An [`Arena`] hands out many small, variable-sized allocations from
//! large blocks and frees all of them together when it is dropped. It is
//! meant for hot paths that build immutable structures (skiplists,
//! memtables, interned keys) where per-object `malloc`/`free` dominates.
//!
//! # Allocation policy
//!
//! ```text
//! allocate(n)
//! ├── n fits in active block   → bump cursor (fast path)
//! ├── n > large_threshold      → dedicated block of exactly n bytes,
//! │                              active block untouched
//! └── otherwise                → new standard block becomes active,
//!                                old block's tail is abandoned
//! ```
//!
//! With the defaults (4096-byte blocks, 1024-byte threshold) at most a
//! quarter of any standard block is ever abandoned.
//!
//! # Threading
//!
//! Allocation needs `&mut Arena`, so a single arena is used from one
//! thread at a time. [`Arena::usage_monitor`] returns a [`UsageMonitor`]
//! that other threads can poll for an approximate reserved-bytes figure.
//!
//! # Safety
//!
//! This crate contains `unsafe` code, confined to the `raw` module and a
//! single copy in [`Arena::allocate_copy`]. Pointers returned by the
//! arena are plain [`NonNull<u8>`](std::ptr::NonNull); dereferencing
//! them is the caller's `unsafe` and is only valid until the arena drops.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
mod raw;
pub mod usage;

// Public re-exports for the primary API surface.
pub use arena::{Arena, ArenaStats};
pub use config::{ArenaConfig, ALIGN, BLOCK_ALIGN};
pub use error::ArenaError;
pub use raw::{BlockProvider, SystemProvider, BLOCK_HANDLE_OVERHEAD};
pub use usage::UsageMonitor;
