use tracing::{debug, warn};

use crate::{
    Address, Blocks, Error, PoolAllocatorBuilder, PoolStats, Region, ReinitPolicy, Result,
};

/// A memory allocator that hands out blocks of one fixed-size byte region.
///
/// The allocator has an explicit life cycle. It starts uninitialized, acquires its region in
/// [`init()`][1] and releases it in [`deinit()`][2] (or when dropped). Allocation, freeing and
/// resizing are only possible while a pool is present; otherwise they fail with
/// [`Error::NotInitialized`].
///
/// Blocks are found with a first-fit scan in ascending offset order. A free block larger than a
/// request is split in two, with the remainder staying free. Freed blocks are merged with their
/// free neighbors immediately, so the pool never contains two adjacent free blocks.
///
/// Block descriptors are stored inline at the start of each block, taking up
/// [`DESCRIPTOR_SIZE`][3] bytes of the pool per block.
///
/// # Thread safety
///
/// All mutating operations take `&mut self`. The allocator can be moved between threads but
/// requires external synchronization (e.g. a `Mutex`) to be shared.
///
/// # Example
///
/// ```rust
/// use fixed_pool::PoolAllocator;
///
/// let mut pool = PoolAllocator::new();
/// pool.init(1024)?;
///
/// let address = pool.alloc(5)?;
/// pool.bytes_mut(address)?[..5].copy_from_slice(b"hello");
///
/// // Growing keeps the content.
/// let address = pool.resize(Some(address), 500)?.expect("non-zero size always yields an address");
/// assert_eq!(&pool.bytes(address)?[..5], b"hello");
///
/// pool.free(address)?;
/// pool.deinit()?;
/// # Ok::<(), fixed_pool::Error>(())
/// ```
///
/// [1]: Self::init
/// [2]: Self::deinit
/// [3]: crate::DESCRIPTOR_SIZE
#[derive(Debug)]
pub struct PoolAllocator {
    region: Option<Region>,

    /// The generation that will be assigned to the next region we acquire.
    next_generation: u64,

    reinit_policy: ReinitPolicy,
}

impl PoolAllocator {
    #[must_use]
    pub(crate) fn new_inner(reinit_policy: ReinitPolicy) -> Self {
        Self {
            region: None,
            next_generation: 0,
            reinit_policy,
        }
    }

    /// Creates an uninitialized allocator with the default configuration.
    ///
    /// Call [`init()`][Self::init] before allocating.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::PoolAllocator;
    ///
    /// let pool = PoolAllocator::new();
    ///
    /// assert!(!pool.is_initialized());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::new_inner(ReinitPolicy::default())
    }

    /// Creates an allocator with the default configuration and initializes it with a pool of
    /// `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`init()`][Self::init].
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::PoolAllocator;
    ///
    /// let pool = PoolAllocator::with_capacity(4096)?;
    ///
    /// assert_eq!(pool.capacity(), Some(4096));
    /// # Ok::<(), fixed_pool::Error>(())
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::builder().capacity(capacity).build()
    }

    /// Starts building a new allocator with a custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::{PoolAllocator, ReinitPolicy};
    ///
    /// let pool = PoolAllocator::builder()
    ///     .reinit_policy(ReinitPolicy::Reject)
    ///     .build()?;
    /// # Ok::<(), fixed_pool::Error>(())
    /// ```
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    pub fn builder() -> PoolAllocatorBuilder {
        PoolAllocatorBuilder::new()
    }

    /// Acquires a pool of exactly `capacity` bytes and covers it with a single free block.
    ///
    /// If the allocator already owns a pool, the [reinitialization policy][ReinitPolicy]
    /// decides whether the existing pool is replaced or the call fails. The new region is
    /// acquired before the old one is released, so a failed reinitialization leaves the
    /// existing pool in place.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidCapacity`] if `capacity` cannot hold one block descriptor and at least
    ///   one payload byte. This includes a capacity of zero.
    /// * [`Error::OutOfMemory`] if the region cannot be acquired from the system.
    /// * [`Error::AlreadyInitialized`] if a pool exists and the policy is
    ///   [`ReinitPolicy::Reject`].
    pub fn init(&mut self, capacity: usize) -> Result<()> {
        if self.region.is_some() {
            match self.reinit_policy {
                ReinitPolicy::Reset => {
                    debug!(capacity, "replacing existing pool");
                }
                ReinitPolicy::Reject => {
                    warn!(capacity, "refusing to replace existing pool");
                    return Err(Error::AlreadyInitialized);
                }
            }
        }

        let generation = self.next_generation;
        let region = Region::acquire(capacity, generation)?;

        self.next_generation = generation.wrapping_add(1);
        self.region = Some(region);

        debug!(capacity, generation, "pool initialized");
        Ok(())
    }

    /// Releases the pool. All addresses issued by it become invalid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if there is no pool to release.
    pub fn deinit(&mut self) -> Result<()> {
        let Some(region) = self.region.take() else {
            warn!("deinit called on an allocator without a pool");
            return Err(Error::NotInitialized);
        };

        debug!(capacity = region.capacity(), "pool deinitialized");
        Ok(())
    }

    /// Whether the allocator currently owns a pool.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    /// The size of the current pool in bytes, or `None` if the allocator is not initialized.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.region.as_ref().map(Region::capacity)
    }

    /// Allocates a block with room for at least `size` bytes.
    ///
    /// The first free block (in offset order) that is large enough is used. If it is larger
    /// than needed, it is split and the remainder stays free. If the remainder would be too small
    /// to become a block of its own, the whole block is handed out, in which case the payload is
    /// slightly larger than requested.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidSize`] if `size` is zero.
    /// * [`Error::OutOfMemory`] if no free block is large enough.
    /// * [`Error::NotInitialized`] if there is no pool.
    pub fn alloc(&mut self, size: usize) -> Result<Address> {
        self.region_mut()?.alloc(size)
    }

    /// Frees the allocation at `address`, merging the block with any free neighbors.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidPointer`] if `address` is not the start of a live allocation in the
    ///   current pool. Freeing an address twice is reported this way and changes nothing.
    /// * [`Error::NotInitialized`] if there is no pool.
    pub fn free(&mut self, address: Address) -> Result<()> {
        self.region_mut()?.free(address)
    }

    /// Changes the size of an allocation, keeping its content up to the smaller of the old and
    /// new size.
    ///
    /// * With no `address`, this is the same as [`alloc(new_size)`][Self::alloc].
    /// * With a `new_size` of zero, this is the same as [`free(address)`][Self::free] and
    ///   returns `None`.
    /// * If the block is already large enough, it shrinks in place and the same address is
    ///   returned.
    /// * If the block directly after it is free and large enough to make up the difference,
    ///   the allocation grows in place and the same address is returned.
    /// * Otherwise a new block is allocated, the content is copied over and the old block is
    ///   freed.
    ///
    /// # Errors
    ///
    /// * [`Error::OutOfMemory`] if the allocation needs to move and no free block is large
    ///   enough. The original allocation remains valid and unchanged.
    /// * [`Error::InvalidPointer`] if `address` is not the start of a live allocation.
    /// * [`Error::InvalidSize`] if `address` is `None` and `new_size` is zero.
    /// * [`Error::NotInitialized`] if there is no pool.
    pub fn resize(&mut self, address: Option<Address>, new_size: usize) -> Result<Option<Address>> {
        let region = self.region_mut()?;

        match (address, new_size) {
            (None, size) => region.alloc(size).map(Some),
            (Some(address), 0) => region.free(address).map(|()| None),
            (Some(address), size) => region.resize(address, size).map(Some),
        }
    }

    /// Turns a payload offset back into the address of the live allocation it belongs to.
    ///
    /// This is useful for data structures that store links between allocations inside the
    /// pool itself, where only the offset can be persisted.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidPointer`] if no live allocation has its payload at `offset`.
    /// * [`Error::NotInitialized`] if there is no pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::PoolAllocator;
    ///
    /// let mut pool = PoolAllocator::with_capacity(256)?;
    /// let address = pool.alloc(10)?;
    ///
    /// let stored_offset = address.offset();
    /// assert_eq!(pool.address_of(stored_offset)?, address);
    /// # Ok::<(), fixed_pool::Error>(())
    /// ```
    pub fn address_of(&self, offset: usize) -> Result<Address> {
        self.region()?.address_at(offset)
    }

    /// The payload of the live allocation at `address`.
    ///
    /// The slice covers the whole block payload, which may be longer than the size that was
    /// requested.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidPointer`] if `address` is not the start of a live allocation.
    /// * [`Error::NotInitialized`] if there is no pool.
    pub fn bytes(&self, address: Address) -> Result<&[u8]> {
        self.region()?.payload(address)
    }

    /// The payload of the live allocation at `address`, for writing.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidPointer`] if `address` is not the start of a live allocation.
    /// * [`Error::NotInitialized`] if there is no pool.
    pub fn bytes_mut(&mut self, address: Address) -> Result<&mut [u8]> {
        self.region_mut()?.payload_mut(address)
    }

    /// Iterates over the blocks of the pool in ascending offset order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if there is no pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::PoolAllocator;
    ///
    /// let mut pool = PoolAllocator::with_capacity(256)?;
    /// let _address = pool.alloc(10)?;
    ///
    /// let free_blocks = pool.blocks()?.filter(|block| block.is_free()).count();
    /// assert_eq!(free_blocks, 1);
    /// # Ok::<(), fixed_pool::Error>(())
    /// ```
    pub fn blocks(&self) -> Result<Blocks<'_>> {
        Ok(self.region()?.blocks())
    }

    /// Summarizes how the pool capacity is currently used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if there is no pool.
    pub fn stats(&self) -> Result<PoolStats> {
        Ok(self.region()?.stats())
    }

    fn region(&self) -> Result<&Region> {
        self.region.as_ref().ok_or(Error::NotInitialized)
    }

    fn region_mut(&mut self) -> Result<&mut Region> {
        self.region.as_mut().ok_or(Error::NotInitialized)
    }

    #[cfg(test)]
    fn assert_integrity(&self) {
        if let Some(region) = &self.region {
            region.assert_integrity();
        }
    }
}

impl Default for PoolAllocator {
    fn default() -> Self {
        Self::new()
    }
}
