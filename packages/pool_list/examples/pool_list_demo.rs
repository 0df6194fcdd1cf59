//! Walks through the list operations on top of a small pool, logging every pool operation.
//!
//! Run with `cargo run --example pool_list_demo -p pool_list`.

use fixed_pool::PoolAllocator;
use pool_list::PoolList;
use tracing::Level;

fn main() -> Result<(), pool_list::Error> {
    tracing_subscriber::fmt().with_max_level(Level::TRACE).init();

    let mut pool = PoolAllocator::new();
    pool.init(256)?;

    {
        let mut list = PoolList::new(&mut pool);

        for value in [10, 20, 30, 40, 50] {
            list.insert_tail(value)?;
        }
        println!("Initial list: {list}");

        let thirty = list.search(30)?;
        list.insert_after(thirty, 35)?;
        list.insert_before(thirty, 25)?;
        println!("After insertions: {list}");

        let forty = list.search(40)?;
        println!(
            "From 30 to 40: {}",
            list.display_range(Some(thirty), Some(forty))?
        );

        list.delete(20)?;
        println!("After deleting 20: {list} ({} nodes)", list.count());

        if let Err(error) = list.delete(99) {
            println!("Deleting 99: {error}");
        }

        let stats = list.pool().stats()?;
        println!(
            "Pool: {} live allocations, {} bytes free in {} blocks",
            stats.allocation_count(),
            stats.free_bytes(),
            stats.block_count()
        );

        list.clear()?;
        println!("After clear: {list}");
    }

    pool.deinit()?;

    Ok(())
}
