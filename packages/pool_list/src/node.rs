use std::ops::Range;

use fixed_pool::{Address, PoolAllocator};

use crate::{Error, Result};

/// The number of pool payload bytes used by one list node.
///
/// The pool adds its own block descriptor on top of this for every node.
pub const NODE_SIZE: usize = 18;

const VALUE_FIELD: Range<usize> = 0..2;
const SERIAL_FIELD: Range<usize> = 2..10;
const NEXT_FIELD: Range<usize> = 10..18;

/// Marks the last node of the list in the link field.
const NO_NEXT: u64 = u64::MAX;

/// Identifies a node of a [`PoolList`][crate::PoolList].
///
/// Handles are returned by the insertion methods and by [`search()`][1]. They are plain values
/// that can be copied freely. Every node inserted into a list gets a serial number that is
/// stored in the node and in its handle, so passing the handle of a deleted node to a list
/// method is reported as [`Error::UnknownNode`][2] even after its storage has been reused for
/// a newer node of the same list.
///
/// [1]: crate::PoolList::search
/// [2]: crate::Error::UnknownNode
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeRef {
    address: Address,
    serial: u64,
}

impl NodeRef {
    pub(crate) fn new(address: Address, serial: u64) -> Self {
        Self { address, serial }
    }

    /// The pool address of the allocation that stores this node.
    #[must_use]
    pub fn address(self) -> Address {
        self.address
    }
}

/// The decoded content of a node as stored in the pool.
///
/// The link to the next node is stored as the payload offset of its allocation. The serial
/// number of the node itself is stored next to the value and is taken from the handle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Node {
    pub(crate) value: u16,
    pub(crate) next: Option<NodeRef>,
}

impl Node {
    /// Reads the node behind `node`.
    ///
    /// Fails with [`Error::UnknownNode`][crate::Error::UnknownNode] if the storage now holds a
    /// node with a different serial number.
    pub(crate) fn read(pool: &PoolAllocator, node: NodeRef) -> Result<Self> {
        let payload = pool.bytes(node.address)?;

        if u64::from_le_bytes(field(payload, SERIAL_FIELD)) != node.serial {
            return Err(Error::UnknownNode);
        }

        let value = u16::from_le_bytes(field(payload, VALUE_FIELD));

        let next = match u64::from_le_bytes(field(payload, NEXT_FIELD)) {
            NO_NEXT => None,
            offset => {
                let offset =
                    usize::try_from(offset).expect("links are written from usize offsets");
                let address = pool.address_of(offset)?;
                let serial = u64::from_le_bytes(field(pool.bytes(address)?, SERIAL_FIELD));

                Some(NodeRef::new(address, serial))
            }
        };

        Ok(Self { value, next })
    }

    pub(crate) fn write(self, pool: &mut PoolAllocator, node: NodeRef) -> Result<()> {
        let payload = pool.bytes_mut(node.address)?;

        let next = self.next.map_or(NO_NEXT, |next| {
            u64::try_from(next.address.offset()).expect("usize always fits in u64")
        });

        field_mut(payload, VALUE_FIELD).copy_from_slice(&self.value.to_le_bytes());
        field_mut(payload, SERIAL_FIELD).copy_from_slice(&node.serial.to_le_bytes());
        field_mut(payload, NEXT_FIELD).copy_from_slice(&next.to_le_bytes());

        Ok(())
    }
}

fn field<const N: usize>(payload: &[u8], range: Range<usize>) -> [u8; N] {
    payload
        .get(range)
        .and_then(|bytes| bytes.try_into().ok())
        .expect("node allocations are NODE_SIZE bytes")
}

fn field_mut(payload: &mut [u8], range: Range<usize>) -> &mut [u8] {
    payload
        .get_mut(range)
        .expect("node allocations are NODE_SIZE bytes")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn node_round_trips_through_pool() {
        let mut pool = PoolAllocator::with_capacity(256).unwrap();

        let first = NodeRef::new(pool.alloc(NODE_SIZE).unwrap(), 0);
        let second = NodeRef::new(pool.alloc(NODE_SIZE).unwrap(), 1);

        Node {
            value: 7,
            next: Some(second),
        }
        .write(&mut pool, first)
        .unwrap();
        Node {
            value: 0xBEEF,
            next: None,
        }
        .write(&mut pool, second)
        .unwrap();

        assert_eq!(
            Node::read(&pool, first).unwrap(),
            Node {
                value: 7,
                next: Some(second)
            }
        );
        assert_eq!(Node::read(&pool, second).unwrap().value, 0xBEEF);
    }

    #[test]
    fn dangling_link_is_reported() {
        let mut pool = PoolAllocator::with_capacity(256).unwrap();

        let first = NodeRef::new(pool.alloc(NODE_SIZE).unwrap(), 0);
        let second = NodeRef::new(pool.alloc(NODE_SIZE).unwrap(), 1);
        Node {
            value: 1,
            next: Some(second),
        }
        .write(&mut pool, first)
        .unwrap();

        pool.free(second.address()).unwrap();

        assert!(matches!(
            Node::read(&pool, first),
            Err(Error::Pool(fixed_pool::Error::InvalidPointer { .. }))
        ));
    }

    #[test]
    fn serial_mismatch_is_unknown_node() {
        let mut pool = PoolAllocator::with_capacity(256).unwrap();

        let address = pool.alloc(NODE_SIZE).unwrap();
        let old = NodeRef::new(address, 4);
        let new = NodeRef::new(address, 5);
        Node {
            value: 9,
            next: None,
        }
        .write(&mut pool, new)
        .unwrap();

        assert_eq!(Node::read(&pool, old).unwrap_err(), Error::UnknownNode);
        assert_eq!(Node::read(&pool, new).unwrap().value, 9);
    }
}
