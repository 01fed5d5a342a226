//! Integration test: reading memory usage from other threads while the
//! owning thread allocates.
//!
//! Readers must never observe a value that goes backwards or exceeds the
//! final total, and once the owner is done every reader sees the final
//! figure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use strata_arena::Arena;

#[test]
fn monitors_see_monotonic_usage_during_allocation() {
    let mut arena = Arena::new();
    let done = AtomicBool::new(false);
    let monitor = arena.usage_monitor();

    let final_usage = thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let monitor = monitor.clone();
                let done = &done;
                s.spawn(move || {
                    let mut last = 0;
                    let mut samples = 0usize;
                    while !done.load(Ordering::Acquire) {
                        let now = monitor.get();
                        assert!(now >= last, "usage went backwards: {last} -> {now}");
                        last = now;
                        samples += 1;
                    }
                    (last, samples)
                })
            })
            .collect();

        for i in 0..20_000usize {
            arena.allocate(1 + i % 2_000);
        }
        let final_usage = arena.memory_usage();
        done.store(true, Ordering::Release);

        for reader in readers {
            let (last, _samples) = reader.join().unwrap();
            assert!(last <= final_usage);
        }
        final_usage
    });

    assert_eq!(monitor.get(), final_usage);
}

#[test]
fn arena_moves_to_another_thread() {
    let mut arena = Arena::new();
    arena.allocate(64);
    let monitor = arena.usage_monitor();

    let handle = thread::spawn(move || {
        for _ in 0..100 {
            arena.allocate(100);
        }
        arena.block_count()
    });
    let blocks = handle.join().unwrap();
    assert!(blocks >= 3);
    assert!(monitor.get() >= 64 + 100 * 100);
}

#[test]
fn mutex_serializes_shared_arena() {
    let arena = Arc::new(Mutex::new(Arena::new()));
    thread::scope(|s| {
        for t in 0..4usize {
            let arena = Arc::clone(&arena);
            s.spawn(move || {
                for i in 0..1_000usize {
                    let mut guard = arena.lock().unwrap();
                    let p = guard.allocate_aligned(1 + (t + i) % 64);
                    assert_eq!(p.as_ptr() as usize % strata_arena::ALIGN, 0);
                }
            });
        }
    });
    let arena = arena.lock().unwrap();
    let requested: usize = (0..4usize)
        .flat_map(|t| (0..1_000usize).map(move |i| 1 + (t + i) % 64))
        .sum();
    assert!(arena.memory_usage() >= requested);
}
