//! A singly-linked list whose nodes are carved out of a [`fixed_pool`] memory pool.
//!
//! This crate provides [`PoolList`], a list of `u16` values that never touches the global
//! allocator. Every node is an allocation from a [`PoolAllocator`][fixed_pool::PoolAllocator]
//! that the list borrows for its whole lifetime, and the links between nodes are stored inside
//! the pool next to the values.
//!
//! # Operations
//!
//! - **Insertion**: at the head, at the tail, or directly before or after a known node
//! - **Deletion**: of the first node holding a value
//! - **Lookup**: of the first node holding a value, or of the value held by a node
//! - **Inspection**: counting, iteration and `[a, b, c]` formatting of the whole list or of a
//!   range of it
//! - **Cleanup**: [`clear()`][PoolList::clear] returns all nodes to the pool, as does dropping
//!   the list
//!
//! # Example
//!
//! ```rust
//! use fixed_pool::PoolAllocator;
//! use pool_list::{Error, PoolList};
//!
//! let mut pool = PoolAllocator::with_capacity(1024)?;
//!
//! {
//!     let mut list = PoolList::new(&mut pool);
//!
//!     for value in [3, 1, 4, 1, 5] {
//!         list.insert_tail(value)?;
//!     }
//!
//!     let four = list.search(4)?;
//!     list.insert_after(four, 9)?;
//!     list.delete(1)?;
//!
//!     assert_eq!(list.to_string(), "[3, 4, 9, 1, 5]");
//!     assert_eq!(list.search(7), Err(Error::NotFound { value: 7 }));
//! }
//!
//! // Dropping the list returned every node to the pool.
//! assert_eq!(pool.stats()?.allocation_count(), 0);
//! # Ok::<(), pool_list::Error>(())
//! ```

mod error;
mod list;
mod node;

pub use error::Error;
pub(crate) use error::Result;
pub use list::{DisplayRange, Iter, PoolList};
pub use node::{NODE_SIZE, NodeRef};
pub(crate) use node::Node;
