use std::iter::FusedIterator;
use std::ops::Range;

use crate::{DESCRIPTOR_SIZE, Descriptor};

/// A snapshot of one block of the pool, as seen by [`PoolAllocator::blocks()`][1].
///
/// Blocks partition the pool: the first block starts at offset 0, every block starts where the
/// previous one ends and the last block ends at the pool capacity. The range of a block
/// includes its descriptor, which occupies the first [`DESCRIPTOR_SIZE`] bytes.
///
/// [1]: crate::PoolAllocator::blocks
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Block {
    offset: usize,
    descriptor: Descriptor,
}

impl Block {
    pub(crate) fn new(offset: usize, descriptor: Descriptor) -> Self {
        Self { offset, descriptor }
    }

    /// Offset of the first byte of the block (its descriptor) from the start of the pool.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of pool bytes owned by the block, descriptor included.
    #[must_use]
    pub fn length(&self) -> usize {
        self.descriptor.length
    }

    /// Offset one past the last byte of the block.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset
            .checked_add(self.descriptor.length)
            .expect("blocks never extend past the pool")
    }

    /// Whether the block is available for allocation.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.descriptor.is_free
    }

    /// The bytes of the block that are handed out to the owner of an allocation.
    #[must_use]
    pub fn payload(&self) -> Range<usize> {
        self.payload_offset()..self.end()
    }

    pub(crate) fn payload_offset(&self) -> usize {
        self.offset
            .checked_add(DESCRIPTOR_SIZE)
            .expect("blocks never extend past the pool")
    }

    pub(crate) fn payload_len(&self) -> usize {
        self.descriptor.payload_len()
    }
}

/// Iterator over the blocks of a pool in ascending offset order.
///
/// Returned by [`PoolAllocator::blocks()`][1].
///
/// [1]: crate::PoolAllocator::blocks
#[derive(Debug)]
pub struct Blocks<'a> {
    region: &'a [u8],
    next_offset: usize,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(region: &'a [u8]) -> Self {
        Self {
            region,
            next_offset: 0,
        }
    }

    /// Starts the walk at a block boundary other than the first block.
    pub(crate) fn starting_at(region: &'a [u8], offset: usize) -> Self {
        Self {
            region,
            next_offset: offset,
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_offset >= self.region.len() {
            return None;
        }

        let block = Block::new(
            self.next_offset,
            Descriptor::read(self.region, self.next_offset),
        );
        self.next_offset = block.end();

        Some(block)
    }
}

impl FusedIterator for Blocks<'_> {}
