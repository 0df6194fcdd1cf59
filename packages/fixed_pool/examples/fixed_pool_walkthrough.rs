//! Walks through the life cycle of a pool: init, alloc, resize, free and deinit, printing the
//! block layout after each step.
//!
//! Run with `cargo run --example fixed_pool_walkthrough -p fixed_pool`.

use fixed_pool::{Error, PoolAllocator};
use tracing::Level;

fn print_layout(step: &str, pool: &PoolAllocator) -> Result<(), Error> {
    println!("{step}:");

    for block in pool.blocks()? {
        let state = if block.is_free() { "free" } else { "used" };
        println!(
            "  [{:>4}..{:>4}) {state} payload {:?}",
            block.offset(),
            block.end(),
            block.payload()
        );
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).init();

    let mut pool = PoolAllocator::new();
    pool.init(256)?;
    print_layout("After init", &pool)?;

    let greeting = pool.alloc(5)?;
    pool.bytes_mut(greeting)?[..5].copy_from_slice(b"hello");
    let numbers = pool.alloc(32)?;
    print_layout("After two allocations", &pool)?;

    // The next block is in use, so growing has to move the greeting.
    let greeting = pool
        .resize(Some(greeting), 64)?
        .expect("non-zero size always yields an address");
    println!(
        "Greeting moved to offset {} and still reads {:?}",
        greeting.offset(),
        String::from_utf8_lossy(&pool.bytes(greeting)?[..5])
    );
    print_layout("After growing the greeting", &pool)?;

    pool.free(numbers)?;
    if let Err(error) = pool.free(numbers) {
        println!("Freeing twice: {error}");
    }
    pool.free(greeting)?;
    print_layout("After freeing everything", &pool)?;

    let stats = pool.stats()?;
    println!(
        "{} of {} bytes free, largest possible allocation is {} bytes",
        stats.free_bytes(),
        stats.capacity(),
        stats.largest_free_payload()
    );

    pool.deinit()?;

    Ok(())
}
