//! A fixed-capacity memory pool that carves one contiguous byte region into blocks.
//!
//! This crate provides [`PoolAllocator`], which acquires a single region of a chosen size at
//! initialization time and afterwards serves every allocation from that region alone. It does
//! not touch the global allocator again until the pool is released.
//!
//! # Key Features
//!
//! - **Fixed capacity**: The pool is sized once and never grows
//! - **First-fit allocation**: Blocks are scanned in ascending offset order and the first free
//!   block that is large enough is used, split if larger than needed
//! - **Eager coalescing**: Freed blocks merge with free neighbors immediately, so there are never
//!   two free blocks next to each other
//! - **In-place resizing**: Allocations shrink in place and grow into a free successor where
//!   possible, moving (with their content) only when they have to
//! - **Checked addresses**: Frees of unknown addresses, double frees and addresses issued by an
//!   earlier incarnation of the pool are reported as errors and change nothing
//! - **No unsafe code**: Blocks are byte offsets into an owned buffer, not raw pointers
//!
//! # Memory layout
//!
//! Every block starts with a [`DESCRIPTOR_SIZE`]-byte descriptor holding the block length and
//! whether the block is free. The block after it starts where it ends, so the descriptors form
//! a chain that covers the pool from the first byte to the last:
//!
//! ```text
//!   offset 0                                                            capacity
//!   ┌──────┬───────────────┬──────┬────────────────────┬──────┬─────────────────┐
//!   │ desc │  payload (A)  │ desc │     free space     │ desc │   payload (B)   │
//!   └──────┴───────────────┴──────┴────────────────────┴──────┴─────────────────┘
//!          ▲                                                  ▲
//!          └── address of A                                   └── address of B
//! ```
//!
//! # Example
//!
//! ```rust
//! use fixed_pool::{DESCRIPTOR_SIZE, Error, PoolAllocator};
//!
//! let mut pool = PoolAllocator::with_capacity(64)?;
//!
//! let first = pool.alloc(40)?;
//!
//! // The remaining 8 bytes cannot even hold a descriptor.
//! assert_eq!(pool.alloc(40), Err(Error::OutOfMemory { requested: 40 }));
//!
//! pool.free(first)?;
//!
//! // Freeing the same address twice is detected.
//! assert!(matches!(pool.free(first), Err(Error::InvalidPointer { .. })));
//!
//! // The pool is back to a single free block.
//! assert_eq!(pool.stats()?.largest_free_payload(), 64 - DESCRIPTOR_SIZE);
//! # Ok::<(), fixed_pool::Error>(())
//! ```

mod address;
mod allocator;
mod block;
mod builder;
mod descriptor;
mod error;
mod region;
mod reinit_policy;
mod stats;

pub use address::Address;
pub use allocator::PoolAllocator;
pub use block::{Block, Blocks};
pub use builder::*;
pub use descriptor::DESCRIPTOR_SIZE;
pub(crate) use descriptor::{Descriptor, can_split};
pub use error::Error;
pub(crate) use error::Result;
pub(crate) use region::Region;
pub use reinit_policy::ReinitPolicy;
pub use stats::PoolStats;
