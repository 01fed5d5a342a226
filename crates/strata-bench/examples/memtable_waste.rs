//! Block-size sweep over a memtable-like workload.
//!
//! Demonstrates: build a workload → replay it into arenas with different
//! block sizes → compare blocks acquired and utilisation. Set
//! `RUST_LOG=strata_arena=trace` to see each block acquisition.

use strata_arena::{Arena, ArenaConfig};
use strata_bench::{memtable_profile, replay, utilisation};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== strata memtable waste sweep ===\n");

    let requests = memtable_profile(42, 100_000);
    let requested: usize = requests.iter().map(|r| r.bytes).sum();
    println!("{} requests, {} bytes requested\n", requests.len(), requested);
    println!("{:>10} {:>8} {:>12} {:>8}", "block", "blocks", "reserved", "util");

    for block_size in [1024, 4096, 16 * 1024, 64 * 1024, 256 * 1024] {
        let mut arena = match Arena::with_config(ArenaConfig::with_block_size(block_size)) {
            Ok(arena) => arena,
            Err(e) => {
                eprintln!("skipping block size {block_size}: {e}");
                continue;
            }
        };
        replay(&mut arena, &requests);
        println!(
            "{:>10} {:>8} {:>12} {:>7.1}%",
            block_size,
            arena.block_count(),
            arena.memory_usage(),
            utilisation(&arena, &requests) * 100.0
        );
    }
}
