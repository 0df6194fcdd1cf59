/// Identifies an allocation made by a [`PoolAllocator`][crate::PoolAllocator].
///
/// An address is the byte offset of the allocation's payload from the start of the pool,
/// tagged with the incarnation of the pool that issued it. Addresses are plain values: they
/// can be copied and stored freely and never dangle in the memory-safety sense. Using an
/// address after its allocation has been freed is detected by the allocator as long as the
/// block has not been handed out again.
///
/// Addresses issued before the pool was reinitialized are always rejected.
///
/// # Example
///
/// ```rust
/// use fixed_pool::PoolAllocator;
///
/// let mut pool = PoolAllocator::with_capacity(256)?;
///
/// let first = pool.alloc(32)?;
/// let second = pool.alloc(32)?;
///
/// // Blocks are carved in ascending offset order.
/// assert!(first.offset() < second.offset());
/// # Ok::<(), fixed_pool::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Address {
    offset: usize,
    generation: u64,
}

impl Address {
    pub(crate) fn new(offset: usize, generation: u64) -> Self {
        Self { offset, generation }
    }

    /// The byte offset of the allocation's payload from the start of the pool.
    #[must_use]
    pub fn offset(self) -> usize {
        self.offset
    }

    pub(crate) fn generation(self) -> u64 {
        self.generation
    }
}
