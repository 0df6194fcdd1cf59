use thiserror::Error;

/// Errors that can occur when operating a [`PoolAllocator`][crate::PoolAllocator].
///
/// Every operation that returns an error leaves the pool exactly as it was before the call.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The requested capacity cannot hold a single block.
    ///
    /// A pool must be large enough to hold one block descriptor plus at least one payload byte.
    #[error(
        "invalid pool capacity {capacity}: must be greater than the {descriptor_size}-byte block descriptor",
        descriptor_size = crate::DESCRIPTOR_SIZE
    )]
    InvalidCapacity {
        /// The capacity that was requested.
        capacity: usize,
    },

    /// There is no free block large enough to satisfy the request, or the backing region could
    /// not be acquired from the system when initializing the pool.
    #[error("out of memory: no free block can hold {requested} bytes")]
    OutOfMemory {
        /// The number of bytes that were requested.
        requested: usize,
    },

    /// Zero-sized allocations are not supported.
    #[error("invalid allocation size: zero-sized allocations are not supported")]
    InvalidSize,

    /// The address does not identify the start of a live allocation in the current pool.
    ///
    /// This is reported for addresses issued by an earlier incarnation of the pool, addresses
    /// outside the pool bounds, addresses that point into the middle of a block and addresses
    /// of blocks that have already been freed.
    #[error("invalid pointer: offset {offset} is not the start of a live allocation")]
    InvalidPointer {
        /// The payload offset carried by the rejected address.
        offset: usize,
    },

    /// The allocator has no pool, either because it was never initialized or because it was
    /// deinitialized.
    #[error("the pool allocator is not initialized")]
    NotInitialized,

    /// The allocator already owns a pool and is configured to reject reinitialization.
    #[error("the pool allocator is already initialized")]
    AlreadyInitialized,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
