//! Integration tests for the `fixed_pool` package.
//!
//! These tests exercise `PoolAllocator` through its public API only, checking the block
//! partition after each step the way an external consumer would observe it.

use fixed_pool::{Address, DESCRIPTOR_SIZE, Error, PoolAllocator, ReinitPolicy};

/// Asserts that the blocks cover the whole pool without gaps or overlaps and that no two free
/// blocks are adjacent.
fn assert_partition(pool: &PoolAllocator) {
    let capacity = pool.capacity().unwrap();
    let mut expected_offset = 0;
    let mut previous_was_free = false;

    for block in pool.blocks().unwrap() {
        assert_eq!(block.offset(), expected_offset);
        assert!(block.length() > DESCRIPTOR_SIZE);
        assert!(!(previous_was_free && block.is_free()));

        expected_offset = block.end();
        previous_was_free = block.is_free();
    }

    assert_eq!(expected_offset, capacity);
}

fn ranges_overlap(a: Address, a_len: usize, b: Address, b_len: usize) -> bool {
    a.offset() < b.offset() + b_len && b.offset() < a.offset() + a_len
}

#[test]
fn full_life_cycle() {
    let mut pool = PoolAllocator::new();
    pool.init(4096).unwrap();

    let a = pool.alloc(100).unwrap();
    let b = pool.alloc(200).unwrap();
    assert_partition(&pool);

    let a = pool.resize(Some(a), 50).unwrap().unwrap();
    assert_partition(&pool);

    pool.free(a).unwrap();
    pool.free(b).unwrap();
    assert_partition(&pool);

    pool.deinit().unwrap();
    assert_eq!(pool.alloc(1), Err(Error::NotInitialized));
}

#[test]
fn allocations_are_exclusive() {
    let mut pool = PoolAllocator::with_capacity(4096).unwrap();

    let sizes = [1, 7, 64, 3, 128, 16, 999, 2];
    let allocations = sizes
        .iter()
        .map(|&size| (pool.alloc(size).unwrap(), size))
        .collect::<Vec<_>>();

    for (i, &(a, a_len)) in allocations.iter().enumerate() {
        for &(b, b_len) in allocations.iter().skip(i + 1) {
            assert!(!ranges_overlap(a, a_len, b, b_len));
        }

        assert!(a.offset() + a_len <= 4096);
    }

    assert_partition(&pool);
}

#[test]
fn exhaustion_after_metadata_overhead() {
    let mut pool = PoolAllocator::with_capacity(64).unwrap();

    let first = pool.alloc(40).unwrap();
    let stats_before = pool.stats().unwrap();

    assert_eq!(pool.alloc(40), Err(Error::OutOfMemory { requested: 40 }));
    assert_eq!(pool.stats().unwrap(), stats_before);

    pool.free(first).unwrap();
    assert_partition(&pool);
}

#[test]
fn alloc_free_alloc_returns_same_address() {
    let mut pool = PoolAllocator::with_capacity(1024).unwrap();

    let first = pool.alloc(77).unwrap();
    pool.free(first).unwrap();
    let second = pool.alloc(77).unwrap();

    assert_eq!(first, second);
}

#[test]
fn double_free_does_not_corrupt() {
    let mut pool = PoolAllocator::with_capacity(1024).unwrap();

    let a = pool.alloc(10).unwrap();
    let b = pool.alloc(10).unwrap();

    pool.free(a).unwrap();
    let blocks_before = pool.blocks().unwrap().collect::<Vec<_>>();

    assert_eq!(
        pool.free(a),
        Err(Error::InvalidPointer {
            offset: a.offset()
        })
    );
    assert_eq!(pool.blocks().unwrap().collect::<Vec<_>>(), blocks_before);

    pool.free(b).unwrap();
    assert_eq!(pool.blocks().unwrap().count(), 1);
}

#[test]
fn resize_grow_and_shrink_preserve_prefix() {
    let mut pool = PoolAllocator::with_capacity(1024).unwrap();

    let content = (0..32_u8).collect::<Vec<_>>();
    let a = pool.alloc(32).unwrap();
    pool.bytes_mut(a).unwrap()[..32].copy_from_slice(&content);

    // Grows in place: everything after `a` is free.
    let grown = pool.resize(Some(a), 64).unwrap().unwrap();
    assert_eq!(grown, a);
    assert_eq!(&pool.bytes(grown).unwrap()[..32], content.as_slice());

    // Block the way so the next growth has to move.
    let _blocker = pool.alloc(8).unwrap();
    let moved = pool.resize(Some(grown), 512).unwrap().unwrap();
    assert_ne!(moved, grown);
    assert_eq!(&pool.bytes(moved).unwrap()[..32], content.as_slice());

    let shrunk = pool.resize(Some(moved), 10).unwrap().unwrap();
    assert_eq!(shrunk, moved);
    assert_eq!(&pool.bytes(shrunk).unwrap()[..10], &content[..10]);

    assert_partition(&pool);
}

#[test]
fn reinit_with_reject_policy_keeps_pool() {
    let mut pool = PoolAllocator::builder()
        .reinit_policy(ReinitPolicy::Reject)
        .build()
        .unwrap();

    pool.init(128).unwrap();
    let a = pool.alloc(8).unwrap();

    assert_eq!(pool.init(128), Err(Error::AlreadyInitialized));
    assert_eq!(pool.bytes(a).unwrap().len(), 8);
}

#[test]
fn stats_balance_capacity() {
    let mut pool = PoolAllocator::with_capacity(3000).unwrap();

    let mut live = Vec::new();
    for size in [10, 20, 30, 40, 50] {
        live.push(pool.alloc(size).unwrap());
    }
    pool.free(live[1]).unwrap();
    pool.free(live[3]).unwrap();

    let stats = pool.stats().unwrap();

    assert_eq!(stats.allocation_count(), 3);
    assert_eq!(stats.allocated_bytes(), 10 + 30 + 50);
    assert_eq!(
        stats.allocated_bytes() + stats.free_bytes() + stats.block_count() * DESCRIPTOR_SIZE,
        3000
    );
}
