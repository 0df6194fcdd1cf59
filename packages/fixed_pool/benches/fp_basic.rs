//! Basic benchmarks for the `fixed_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use fixed_pool::PoolAllocator;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const POOL_CAPACITY: usize = 64 * 1024;
const ALLOC_SIZE: usize = 48;

fn new_pool() -> PoolAllocator {
    PoolAllocator::with_capacity(POOL_CAPACITY).unwrap()
}

/// A pool with `count` allocations where every other one has been freed again, which gives
/// the first-fit scan plenty of holes that are too small for larger requests.
fn fragmented_pool(count: usize) -> PoolAllocator {
    let mut pool = new_pool();

    let addresses = iter::repeat_with(|| pool.alloc(ALLOC_SIZE).unwrap())
        .take(count)
        .collect::<Vec<_>>();

    for address in addresses.into_iter().step_by(2) {
        pool.free(address).unwrap();
    }

    pool
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fp_basic");

    group.bench_function("init", |b| {
        b.iter(|| drop(black_box(new_pool())));
    });

    group.bench_function("alloc_first", |b| {
        b.iter_custom(|iters| {
            let mut pools = iter::repeat_with(new_pool)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for pool in &mut pools {
                _ = black_box(pool.alloc(black_box(ALLOC_SIZE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("alloc_free", |b| {
        let mut pool = new_pool();

        b.iter(|| {
            let address = pool.alloc(black_box(ALLOC_SIZE)).unwrap();
            pool.free(black_box(address)).unwrap();
        });
    });

    group.bench_function("alloc_past_100_holes", |b| {
        let mut pool = fragmented_pool(200);

        b.iter(|| {
            // Too large for any of the holes, so the scan walks the whole chain.
            let address = pool.alloc(black_box(ALLOC_SIZE * 4)).unwrap();
            pool.free(address).unwrap();
        });
    });

    group.bench_function("resize_grow_in_place", |b| {
        let mut pool = new_pool();

        b.iter(|| {
            let address = pool.alloc(ALLOC_SIZE).unwrap();
            let address = pool
                .resize(Some(address), black_box(ALLOC_SIZE * 2))
                .unwrap()
                .unwrap();
            pool.free(address).unwrap();
        });
    });

    group.finish();
}
