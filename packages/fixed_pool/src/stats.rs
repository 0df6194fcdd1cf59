/// Point-in-time accounting of how the pool capacity is used.
///
/// Every byte of the pool is either descriptor overhead, payload of a live allocation or
/// payload of a free block:
///
/// ```rust
/// use fixed_pool::{DESCRIPTOR_SIZE, PoolAllocator};
///
/// let mut pool = PoolAllocator::with_capacity(1024)?;
/// let _a = pool.alloc(100)?;
/// let _b = pool.alloc(200)?;
///
/// let stats = pool.stats()?;
/// assert_eq!(
///     stats.allocated_bytes() + stats.free_bytes() + stats.block_count() * DESCRIPTOR_SIZE,
///     stats.capacity()
/// );
/// # Ok::<(), fixed_pool::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    pub(crate) capacity: usize,
    pub(crate) block_count: usize,
    pub(crate) allocation_count: usize,
    pub(crate) allocated_bytes: usize,
    pub(crate) free_bytes: usize,
    pub(crate) largest_free_payload: usize,
}

impl PoolStats {
    /// Total size of the pool in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks (free and allocated) the pool is currently divided into.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Number of live allocations.
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }

    /// Payload bytes held by live allocations. This may exceed the sum of the requested sizes
    /// when a block was too small to split and was handed out whole.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Payload bytes held by free blocks.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.free_bytes
    }

    /// The largest allocation request that would currently succeed.
    #[must_use]
    pub fn largest_free_payload(&self) -> usize {
        self.largest_free_payload
    }
}
