//! Integration test: block acquisition and release through an
//! instrumented provider.
//!
//! Every block the arena acquires must be released exactly once when the
//! arena drops, with the same layout it was acquired with, and every
//! pointer the arena hands out must lie inside a live block.

use strata_arena::{Arena, ArenaConfig, ALIGN, BLOCK_ALIGN, BLOCK_HANDLE_OVERHEAD};
use strata_test_utils::{BlockEvent, TrackingProvider};

fn tracked_arena(config: ArenaConfig) -> (Arena<TrackingProvider>, TrackingProvider) {
    let provider = TrackingProvider::new();
    let arena = Arena::with_provider(config, provider.clone()).unwrap();
    (arena, provider)
}

#[test]
fn empty_arena_acquires_nothing() {
    let (arena, provider) = tracked_arena(ArenaConfig::default());
    drop(arena);
    assert!(provider.events().is_empty());
}

#[test]
fn drop_releases_every_block_once() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::default());
    for i in 0..500usize {
        arena.allocate(1 + i % 300);
    }
    arena.allocate(10_000);
    arena.allocate_aligned(2_000);
    let acquired = provider.acquired();
    assert_eq!(acquired, arena.block_count());
    assert_eq!(provider.released(), 0);

    drop(arena);

    assert_eq!(provider.released(), acquired);
    assert_eq!(provider.live_blocks(), 0);
    assert_eq!(provider.live_bytes(), 0);
}

#[test]
fn releases_use_acquired_layouts_in_order() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::default());
    arena.allocate(100);
    arena.allocate(3000);
    arena.allocate(4000);
    drop(arena);

    let events = provider.events();
    let (acquired, released): (Vec<_>, Vec<_>) = events
        .iter()
        .partition(|e| matches!(e, BlockEvent::Acquired { .. }));
    assert_eq!(acquired.len(), released.len());
    for (a, r) in acquired.iter().zip(&released) {
        match (a, r) {
            (
                BlockEvent::Acquired { addr: a, layout: la },
                BlockEvent::Released { addr: r, layout: lr },
            ) => {
                assert_eq!(a, r);
                assert_eq!(la, lr);
                assert_eq!(la.align(), BLOCK_ALIGN);
            }
            other => panic!("unexpected event pair {other:?}"),
        }
    }
}

#[test]
fn pointers_lie_inside_live_blocks() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::default());
    for i in 0..2_000usize {
        let len = 1 + (i * 37) % 1500;
        let p = if i % 3 == 0 {
            arena.allocate_aligned(len)
        } else {
            arena.allocate(len)
        };
        assert!(provider.contains(p.as_ptr() as usize, len));
    }
}

#[test]
fn large_then_small_scenario() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::default());
    arena.allocate(4000);
    arena.allocate(200);
    assert_eq!(provider.acquired_sizes(), vec![4000, 4096]);
    assert_eq!(
        arena.memory_usage(),
        4000 + 4096 + 2 * BLOCK_HANDLE_OVERHEAD
    );
}

#[test]
fn dedicated_block_preserves_active_block() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::default());
    let first = arena.allocate(1000);
    arena.allocate(1000);
    arena.allocate(1000);
    arena.allocate(2000);
    assert_eq!(provider.acquired_sizes(), vec![4096, 2000]);

    let next = arena.allocate(500);
    assert_eq!(next.as_ptr() as usize, first.as_ptr() as usize + 3000);
    assert_eq!(provider.acquired(), 2);
}

#[test]
fn usage_matches_provider_bytes() {
    let (mut arena, provider) = tracked_arena(ArenaConfig::with_block_size(16 * 1024));
    for i in 0..300usize {
        arena.allocate_aligned(1 + (i * 131) % 9000);
    }
    let expected = provider.live_bytes() + provider.live_blocks() * BLOCK_HANDLE_OVERHEAD;
    assert_eq!(arena.memory_usage(), expected);
}

#[test]
fn aligned_allocations_from_tracked_blocks_are_aligned() {
    let (mut arena, _provider) = tracked_arena(ArenaConfig::default());
    for i in 0..1_000usize {
        arena.allocate(1 + i % 7);
        let p = arena.allocate_aligned(1 + (i * 13) % 2_500);
        assert_eq!(p.as_ptr() as usize % ALIGN, 0);
    }
}
