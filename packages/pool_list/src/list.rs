use std::fmt;
use std::iter::FusedIterator;

use fixed_pool::PoolAllocator;
use tracing::{trace, warn};

use crate::{Error, NODE_SIZE, Node, NodeRef, Result};

/// A singly-linked list of `u16` values whose nodes are allocated from a [`PoolAllocator`].
///
/// The list borrows the allocator exclusively for its whole lifetime. Every node is one pool
/// allocation of [`NODE_SIZE`] bytes holding the value, a serial number and the link to the
/// next node, so the list itself only remembers where the first node is.
///
/// Operations that add nodes call [`PoolAllocator::alloc()`] once per node and operations that
/// remove nodes call [`PoolAllocator::free()`] once per node. Dropping the list frees all its
/// remaining nodes.
///
/// # Example
///
/// ```rust
/// use fixed_pool::PoolAllocator;
/// use pool_list::PoolList;
///
/// let mut pool = PoolAllocator::with_capacity(1024)?;
/// let mut list = PoolList::new(&mut pool);
///
/// list.insert_tail(1)?;
/// let three = list.insert_tail(3)?;
/// list.insert_before(three, 2)?;
///
/// assert_eq!(list.to_string(), "[1, 2, 3]");
///
/// list.delete(2)?;
/// assert_eq!(list.count(), 2);
/// # Ok::<(), pool_list::Error>(())
/// ```
pub struct PoolList<'pool> {
    pool: &'pool mut PoolAllocator,
    head: Option<NodeRef>,

    /// The serial number that will be assigned to the next node we insert.
    next_serial: u64,
}

impl<'pool> PoolList<'pool> {
    /// Creates an empty list that will allocate its nodes from `pool`.
    ///
    /// No memory is allocated until the first value is inserted.
    #[must_use]
    pub fn new(pool: &'pool mut PoolAllocator) -> Self {
        Self {
            pool,
            head: None,
            next_serial: 0,
        }
    }

    /// The allocator that stores the nodes of the list.
    #[must_use]
    pub fn pool(&self) -> &PoolAllocator {
        &*self.pool
    }

    /// Whether the list has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Counts the nodes of the list by walking it.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Iterates over the values of the list from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: Nodes::starting_at(&*self.pool, self.head),
        }
    }

    fn nodes(&self) -> Nodes<'_> {
        Nodes::starting_at(&*self.pool, self.head)
    }

    fn allocate_node(&mut self, value: u16, next: Option<NodeRef>) -> Result<NodeRef> {
        let node = NodeRef::new(self.pool.alloc(NODE_SIZE)?, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);

        Node { value, next }.write(self.pool, node)?;

        trace!(value, offset = node.address().offset(), "allocated list node");
        Ok(node)
    }

    fn set_next(&mut self, node: NodeRef, next: Option<NodeRef>) -> Result<()> {
        let mut content = Node::read(self.pool, node)?;
        content.next = next;
        content.write(self.pool, node)
    }

    fn ensure_member(&self, node: NodeRef) -> Result<()> {
        for entry in self.nodes() {
            let (current, _) = entry?;

            if current == node {
                return Ok(());
            }
        }

        Err(Error::UnknownNode)
    }

    /// Inserts a value at the front of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pool`] if the node cannot be allocated.
    pub fn insert_head(&mut self, value: u16) -> Result<NodeRef> {
        let node = self.allocate_node(value, self.head)?;
        self.head = Some(node);

        Ok(node)
    }

    /// Inserts a value at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pool`] if the node cannot be allocated.
    pub fn insert_tail(&mut self, value: u16) -> Result<NodeRef> {
        let mut last = None;
        for entry in self.nodes() {
            let (current, _) = entry?;
            last = Some(current);
        }

        let node = self.allocate_node(value, None)?;

        match last {
            Some(last) => self.set_next(last, Some(node))?,
            None => self.head = Some(node),
        }

        Ok(node)
    }

    /// Inserts a value directly after `node`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownNode`] if `node` is not part of this list.
    /// * [`Error::Pool`] if the node cannot be allocated.
    pub fn insert_after(&mut self, node: NodeRef, value: u16) -> Result<NodeRef> {
        self.ensure_member(node)?;

        self.link_after(node, value)
    }

    fn link_after(&mut self, node: NodeRef, value: u16) -> Result<NodeRef> {
        let next = Node::read(self.pool, node)?.next;
        let inserted = self.allocate_node(value, next)?;
        self.set_next(node, Some(inserted))?;

        Ok(inserted)
    }

    /// Inserts a value directly before `node`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownNode`] if `node` is not part of this list.
    /// * [`Error::Pool`] if the node cannot be allocated.
    pub fn insert_before(&mut self, node: NodeRef, value: u16) -> Result<NodeRef> {
        if self.head == Some(node) {
            return self.insert_head(value);
        }

        let mut previous = None;
        for entry in self.nodes() {
            let (current, content) = entry?;

            if content.next == Some(node) {
                previous = Some(current);
                break;
            }
        }

        let Some(previous) = previous else {
            warn!(offset = node.address().offset(), "insert_before target is not in the list");
            return Err(Error::UnknownNode);
        };

        self.link_after(previous, value)
    }

    /// Deletes the first node holding `value`, returning its storage to the pool.
    ///
    /// # Errors
    ///
    /// * [`Error::NotFound`] if no node holds `value`.
    /// * [`Error::Pool`] if the pool rejects the operation.
    pub fn delete(&mut self, value: u16) -> Result<()> {
        let mut previous = None;
        let mut found = None;

        for entry in self.nodes() {
            let (current, content) = entry?;

            if content.value == value {
                found = Some((current, content.next));
                break;
            }

            previous = Some(current);
        }

        let Some((node, next)) = found else {
            return Err(Error::NotFound { value });
        };

        match previous {
            Some(previous) => self.set_next(previous, next)?,
            None => self.head = next,
        }

        self.pool.free(node.address())?;

        trace!(value, offset = node.address().offset(), "deleted list node");
        Ok(())
    }

    /// Finds the first node holding `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no node holds `value`.
    pub fn search(&self, value: u16) -> Result<NodeRef> {
        for entry in self.nodes() {
            let (current, content) = entry?;

            if content.value == value {
                return Ok(current);
            }
        }

        Err(Error::NotFound { value })
    }

    /// The value held by `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `node` is not part of this list.
    pub fn value(&self, node: NodeRef) -> Result<u16> {
        self.ensure_member(node)?;

        Ok(Node::read(&*self.pool, node)?.value)
    }

    /// Formats the part of the list from `start` to `end`, both inclusive, as `[a, b, c]`.
    ///
    /// Without a `start`, formatting starts at the head. Without an `end`, or if `end` does not
    /// come after `start`, formatting continues to the end of the list. An empty list formats
    /// as `[]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `start` or `end` is not part of this list.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fixed_pool::PoolAllocator;
    /// use pool_list::PoolList;
    ///
    /// let mut pool = PoolAllocator::with_capacity(1024)?;
    /// let mut list = PoolList::new(&mut pool);
    ///
    /// list.insert_tail(10)?;
    /// let start = list.insert_tail(20)?;
    /// let end = list.insert_tail(30)?;
    /// list.insert_tail(40)?;
    ///
    /// assert_eq!(list.display_range(Some(start), Some(end))?.to_string(), "[20, 30]");
    /// assert_eq!(list.display_range(None, Some(start))?.to_string(), "[10, 20]");
    /// # Ok::<(), pool_list::Error>(())
    /// ```
    pub fn display_range(
        &self,
        start: Option<NodeRef>,
        end: Option<NodeRef>,
    ) -> Result<DisplayRange<'_>> {
        for node in [start, end].into_iter().flatten() {
            self.ensure_member(node)?;
        }

        Ok(DisplayRange {
            pool: &*self.pool,
            start: start.or(self.head),
            end,
        })
    }

    /// Removes every node from the list, returning their storage to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pool`] if the pool rejects the operation. The nodes that were freed
    /// before the failure are no longer part of the list.
    pub fn clear(&mut self) -> Result<()> {
        let mut freed: usize = 0;

        while let Some(node) = self.head {
            let next = Node::read(self.pool, node)?.next;
            self.pool.free(node.address())?;
            self.head = next;
            freed = freed.wrapping_add(1);
        }

        trace!(freed, "cleared list");
        Ok(())
    }
}

impl fmt::Debug for PoolList<'_> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolList")
            .field("head", &self.head)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PoolList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DisplayRange {
            pool: &*self.pool,
            start: self.head,
            end: None,
        }
        .fmt(f)
    }
}

impl Drop for PoolList<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.clear() {
            warn!(%error, "could not return all list nodes to the pool");
        }
    }
}

impl<'a> IntoIterator for &'a PoolList<'_> {
    type Item = u16;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Walks the node chain starting at a given node.
///
/// Stops after the first read error, which it yields.
#[derive(Debug)]
struct Nodes<'a> {
    pool: &'a PoolAllocator,
    next: Option<NodeRef>,
}

impl<'a> Nodes<'a> {
    fn starting_at(pool: &'a PoolAllocator, start: Option<NodeRef>) -> Self {
        Self { pool, next: start }
    }
}

impl Iterator for Nodes<'_> {
    type Item = Result<(NodeRef, Node)>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        Some(Node::read(self.pool, current).map(|content| {
            self.next = content.next;
            (current, content)
        }))
    }
}

impl FusedIterator for Nodes<'_> {}

/// Iterator over the values of a [`PoolList`], from head to tail.
///
/// Returned by [`PoolList::iter()`].
#[derive(Debug)]
pub struct Iter<'a> {
    nodes: Nodes<'a>,
}

impl Iterator for Iter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        match self.nodes.next()? {
            Ok((_, content)) => Some(content.value),
            // Unreachable through the public API: every link is checked when it is written.
            Err(error) => {
                warn!(%error, "list node could not be read, ending iteration");
                None
            }
        }
    }
}

impl FusedIterator for Iter<'_> {}

/// Formats a range of a [`PoolList`] as `[a, b, c]`.
///
/// Returned by [`PoolList::display_range()`].
#[derive(Debug)]
pub struct DisplayRange<'a> {
    pool: &'a PoolAllocator,
    start: Option<NodeRef>,
    end: Option<NodeRef>,
}

impl fmt::Display for DisplayRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (index, entry) in Nodes::starting_at(self.pool, self.start).enumerate() {
            let (current, content) = entry.map_err(|error| {
                warn!(%error, "list node could not be read while formatting");
                fmt::Error
            })?;

            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", content.value)?;

            if Some(current) == self.end {
                break;
            }
        }

        write!(f, "]")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use fixed_pool::DESCRIPTOR_SIZE;

    use super::*;

    fn values(list: &PoolList<'_>) -> Vec<u16> {
        list.iter().collect()
    }

    #[test]
    fn smoke_test() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        assert!(list.is_empty());
        assert_eq!(list.count(), 0);

        list.insert_tail(1).unwrap();
        list.insert_tail(2).unwrap();
        list.insert_head(0).unwrap();

        assert_eq!(values(&list), vec![0, 1, 2]);
        assert_eq!(list.count(), 3);
        assert_eq!(list.pool().stats().unwrap().allocation_count(), 3);
    }

    #[test]
    fn insert_after_and_before() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        let first = list.insert_tail(10).unwrap();
        let last = list.insert_tail(40).unwrap();

        let second = list.insert_after(first, 20).unwrap();
        list.insert_before(last, 30).unwrap();
        list.insert_before(first, 5).unwrap();
        list.insert_after(last, 50).unwrap();

        assert_eq!(values(&list), vec![5, 10, 20, 30, 40, 50]);
        assert_eq!(list.value(second).unwrap(), 20);
    }

    #[test]
    fn insert_relative_to_deleted_node_fails() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        list.insert_tail(1).unwrap();
        let gone = list.insert_tail(2).unwrap();
        list.delete(2).unwrap();

        assert_eq!(list.insert_after(gone, 3).unwrap_err(), Error::UnknownNode);
        assert_eq!(list.insert_before(gone, 3).unwrap_err(), Error::UnknownNode);
        assert_eq!(list.value(gone).unwrap_err(), Error::UnknownNode);
        assert_eq!(values(&list), vec![1]);
    }

    #[test]
    fn deleted_node_handle_is_rejected_after_storage_reuse() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        list.insert_tail(1).unwrap();
        let gone = list.insert_tail(2).unwrap();
        list.delete(2).unwrap();
        let fresh = list.insert_tail(9).unwrap();

        // First fit hands the freed storage to the new node.
        assert_eq!(fresh.address(), gone.address());
        assert_ne!(fresh, gone);

        assert_eq!(list.insert_after(gone, 3).unwrap_err(), Error::UnknownNode);
        assert_eq!(list.insert_before(gone, 3).unwrap_err(), Error::UnknownNode);
        assert_eq!(list.value(gone).unwrap_err(), Error::UnknownNode);
        assert_eq!(
            list.display_range(Some(gone), None).unwrap_err(),
            Error::UnknownNode
        );

        assert_eq!(list.value(fresh).unwrap(), 9);
        assert_eq!(values(&list), vec![1, 9]);
    }

    #[test]
    fn delete_removes_first_match_only() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        for value in [1, 2, 1, 3] {
            list.insert_tail(value).unwrap();
        }

        list.delete(1).unwrap();
        assert_eq!(values(&list), vec![2, 1, 3]);

        list.delete(3).unwrap();
        assert_eq!(values(&list), vec![2, 1]);

        assert_eq!(list.delete(9).unwrap_err(), Error::NotFound { value: 9 });
        assert_eq!(list.pool().stats().unwrap().allocation_count(), 2);
    }

    #[test]
    fn search_finds_first_match() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        list.insert_tail(4).unwrap();
        let first_seven = list.insert_tail(7).unwrap();
        list.insert_tail(7).unwrap();

        assert_eq!(list.search(7).unwrap(), first_seven);
        assert_eq!(list.search(8).unwrap_err(), Error::NotFound { value: 8 });
    }

    #[test]
    fn display_formats() {
        let mut pool = PoolAllocator::with_capacity(1024).unwrap();
        let mut list = PoolList::new(&mut pool);

        assert_eq!(list.to_string(), "[]");
        assert_eq!(list.display_range(None, None).unwrap().to_string(), "[]");

        let a = list.insert_tail(1).unwrap();
        let b = list.insert_tail(2).unwrap();
        list.insert_tail(3).unwrap();

        assert_eq!(list.to_string(), "[1, 2, 3]");
        assert_eq!(
            list.display_range(Some(b), None).unwrap().to_string(),
            "[2, 3]"
        );
        assert_eq!(
            list.display_range(Some(a), Some(a)).unwrap().to_string(),
            "[1]"
        );
        // An end before the start is never reached.
        assert_eq!(
            list.display_range(Some(b), Some(a)).unwrap().to_string(),
            "[2, 3]"
        );
    }

    #[test]
    fn clear_returns_all_storage() {
        let mut pool = PoolAllocator::with_capacity(512).unwrap();

        {
            let mut list = PoolList::new(&mut pool);
            for value in 0..10 {
                list.insert_tail(value).unwrap();
            }

            list.clear().unwrap();

            assert_eq!(list.count(), 0);
            assert!(list.is_empty());
            assert_eq!(list.pool().stats().unwrap().allocation_count(), 0);
        }

        // The whole pool is one free block again.
        pool.alloc(512 - DESCRIPTOR_SIZE).unwrap();
    }

    #[test]
    fn drop_frees_nodes() {
        let mut pool = PoolAllocator::with_capacity(512).unwrap();

        {
            let mut list = PoolList::new(&mut pool);
            list.insert_tail(1).unwrap();
            list.insert_tail(2).unwrap();
        }

        assert_eq!(pool.stats().unwrap().allocation_count(), 0);
    }

    #[test]
    fn out_of_memory_passes_through() {
        // Room for exactly two nodes.
        let mut pool = PoolAllocator::with_capacity(2 * (NODE_SIZE + DESCRIPTOR_SIZE)).unwrap();
        let mut list = PoolList::new(&mut pool);

        list.insert_tail(1).unwrap();
        list.insert_tail(2).unwrap();

        assert_eq!(
            list.insert_tail(3).unwrap_err(),
            Error::Pool(fixed_pool::Error::OutOfMemory {
                requested: NODE_SIZE
            })
        );
        assert_eq!(values(&list), vec![1, 2]);
    }
}
