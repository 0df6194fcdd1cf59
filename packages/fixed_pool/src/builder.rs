use crate::{PoolAllocator, ReinitPolicy, Result};

/// Builder for creating an instance of [`PoolAllocator`].
///
/// You only need to use this builder if you want to customize the allocator configuration.
/// [`PoolAllocator::new()`][1] and [`PoolAllocator::with_capacity()`][2] use the defaults.
///
/// # Examples
///
/// ```
/// use fixed_pool::{PoolAllocator, ReinitPolicy};
///
/// let pool = PoolAllocator::builder()
///     .capacity(4096)
///     .reinit_policy(ReinitPolicy::Reject)
///     .build()?;
///
/// assert_eq!(pool.capacity(), Some(4096));
/// # Ok::<(), fixed_pool::Error>(())
/// ```
///
/// [1]: PoolAllocator::new
/// [2]: PoolAllocator::with_capacity
#[derive(Debug)]
#[must_use]
pub struct PoolAllocatorBuilder {
    capacity: Option<usize>,
    reinit_policy: ReinitPolicy,
}

impl PoolAllocatorBuilder {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            reinit_policy: ReinitPolicy::default(),
        }
    }

    /// Sets the capacity of the pool in bytes, including the space used by block descriptors.
    ///
    /// If a capacity is set, the allocator returned by [`build()`][Self::build] is initialized
    /// with it. Otherwise the allocator starts uninitialized and [`PoolAllocator::init()`] must
    /// be called before allocating.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the [reinitialization policy][ReinitPolicy] for the allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::{PoolAllocator, ReinitPolicy};
    ///
    /// let pool = PoolAllocator::builder()
    ///     .reinit_policy(ReinitPolicy::Reset)
    ///     .build()?;
    ///
    /// assert!(!pool.is_initialized());
    /// # Ok::<(), fixed_pool::Error>(())
    /// ```
    pub fn reinit_policy(mut self, policy: ReinitPolicy) -> Self {
        self.reinit_policy = policy;
        self
    }

    /// Builds the allocator with the specified configuration.
    ///
    /// # Errors
    ///
    /// If a capacity was set, returns the errors of [`PoolAllocator::init()`].
    pub fn build(self) -> Result<PoolAllocator> {
        let mut allocator = PoolAllocator::new_inner(self.reinit_policy);

        if let Some(capacity) = self.capacity {
            allocator.init(capacity)?;
        }

        Ok(allocator)
    }
}
