use std::cmp;
use std::fmt;

use tracing::{trace, warn};

use crate::{
    Address, Block, Blocks, DESCRIPTOR_SIZE, Descriptor, Error, PoolStats, Result, can_split,
};

/// One incarnation of a pool: the owned byte region and the block chain stored inside it.
///
/// The region is acquired once and never resized. Every byte belongs to exactly one block and
/// the block descriptors live in the region itself, so no memory beyond the region is used
/// once it has been acquired.
pub(crate) struct Region {
    bytes: Box<[u8]>,

    /// Distinguishes addresses issued by this region from those issued by earlier regions of
    /// the same allocator, which may well point at the same offsets.
    generation: u64,
}

/// A live allocation found by walking the block chain, together with its predecessor.
///
/// The predecessor is needed for coalescing because the chain can only be walked forward.
struct Located {
    previous: Option<Block>,
    block: Block,
}

impl Region {
    /// Acquires a zeroed region of exactly `capacity` bytes and covers it with one free block.
    pub(crate) fn acquire(capacity: usize, generation: u64) -> Result<Self> {
        if capacity <= DESCRIPTOR_SIZE {
            return Err(Error::InvalidCapacity { capacity });
        }

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity).map_err(|error| {
            warn!(capacity, %error, "could not acquire pool region");
            Error::OutOfMemory {
                requested: capacity,
            }
        })?;
        bytes.resize(capacity, 0);

        let mut bytes = bytes.into_boxed_slice();
        Descriptor::free(capacity).write(&mut bytes, 0);

        Ok(Self { bytes, generation })
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn blocks(&self) -> Blocks<'_> {
        Blocks::new(&self.bytes)
    }

    /// The block that starts at `offset`, if `offset` is not the end of the pool.
    fn block_at(&self, offset: usize) -> Option<Block> {
        Blocks::starting_at(&self.bytes, offset).next()
    }

    fn following(&self, block: Block) -> Option<Block> {
        self.block_at(block.end())
    }

    /// Finds the live allocation whose payload starts at `address`.
    fn locate(&self, address: Address) -> Result<Located> {
        let offset = address.offset();
        let invalid = Error::InvalidPointer { offset };

        if address.generation() != self.generation {
            warn!(
                offset,
                generation = address.generation(),
                current_generation = self.generation,
                "address was issued by an earlier pool"
            );
            return Err(invalid);
        }

        if offset < DESCRIPTOR_SIZE || offset >= self.capacity() {
            warn!(offset, capacity = self.capacity(), "address is outside the pool");
            return Err(invalid);
        }

        let mut previous = None;

        for block in self.blocks() {
            if block.payload_offset() == offset {
                if block.is_free() {
                    warn!(offset, "address refers to a block that is already free");
                    return Err(invalid);
                }

                return Ok(Located { previous, block });
            }

            // Blocks are in ascending offset order, so once we are past the target there is
            // no point in looking further.
            if block.payload_offset() > offset {
                break;
            }

            previous = Some(block);
        }

        warn!(offset, "address does not start a block");
        Err(invalid)
    }

    /// The number of pool bytes needed to hold a block with `size` payload bytes.
    fn block_length_for(size: usize) -> Result<usize> {
        size.checked_add(DESCRIPTOR_SIZE)
            .ok_or(Error::OutOfMemory { requested: size })
    }

    /// Turns the range `[offset, offset + length)` into an allocated block of `needed` bytes,
    /// returning any excess to the free chain.
    ///
    /// If the excess is too small to become a block of its own, the allocated block keeps it.
    fn carve(&mut self, offset: usize, length: usize, needed: usize) {
        let excess = length
            .checked_sub(needed)
            .expect("callers only carve blocks that are large enough");

        if !can_split(excess) {
            Descriptor::allocated(length).write(&mut self.bytes, offset);
            return;
        }

        Descriptor::allocated(needed).write(&mut self.bytes, offset);

        let remainder_offset = offset
            .checked_add(needed)
            .expect("the remainder lies inside the pool");
        let mut remainder_length = excess;

        // When shrinking a block in place, the block after it may be free. Absorb it so that
        // no two free blocks ever sit next to each other.
        let remainder_end = remainder_offset
            .checked_add(excess)
            .expect("the remainder lies inside the pool");
        if let Some(next) = self.block_at(remainder_end) {
            if next.is_free() {
                remainder_length = remainder_length
                    .checked_add(next.length())
                    .expect("merged blocks never exceed the pool");
                trace!(
                    offset = remainder_offset,
                    absorbed = next.offset(),
                    "merged split remainder with following free block"
                );
            }
        }

        Descriptor::free(remainder_length).write(&mut self.bytes, remainder_offset);
        trace!(
            offset,
            length = needed,
            remainder_offset,
            remainder_length,
            "split block"
        );
    }

    /// First-fit allocation of `size` payload bytes.
    pub(crate) fn alloc(&mut self, size: usize) -> Result<Address> {
        if size == 0 {
            warn!("rejected zero-sized allocation");
            return Err(Error::InvalidSize);
        }

        let needed = Self::block_length_for(size)?;

        let Some(block) = self
            .blocks()
            .find(|block| block.is_free() && block.length() >= needed)
        else {
            trace!(size, "no free block is large enough");
            return Err(Error::OutOfMemory { requested: size });
        };

        self.carve(block.offset(), block.length(), needed);

        trace!(size, offset = block.payload_offset(), "allocated");
        Ok(Address::new(block.payload_offset(), self.generation))
    }

    /// Returns the block at `address` to the free chain, merging it with free neighbors.
    pub(crate) fn free(&mut self, address: Address) -> Result<()> {
        let Located { previous, block } = self.locate(address)?;

        let mut start = block.offset();
        let mut length = block.length();

        if let Some(next) = self.following(block) {
            if next.is_free() {
                length = length
                    .checked_add(next.length())
                    .expect("merged blocks never exceed the pool");
                trace!(offset = start, absorbed = next.offset(), "merged with following block");
            }
        }

        if let Some(previous) = previous {
            if previous.is_free() {
                start = previous.offset();
                length = length
                    .checked_add(previous.length())
                    .expect("merged blocks never exceed the pool");
                trace!(offset = start, absorbed = block.offset(), "merged into preceding block");
            }
        }

        Descriptor::free(length).write(&mut self.bytes, start);

        trace!(offset = address.offset(), "freed");
        Ok(())
    }

    /// Resizes the live allocation at `address` to `new_size` payload bytes, in place if
    /// possible and by relocation otherwise.
    pub(crate) fn resize(&mut self, address: Address, new_size: usize) -> Result<Address> {
        debug_assert!(new_size > 0, "zero-sized resize is handled by the allocator");

        let Located { block, .. } = self.locate(address)?;
        let needed = Self::block_length_for(new_size)?;

        if block.length() >= needed {
            self.carve(block.offset(), block.length(), needed);
            trace!(offset = address.offset(), new_size, "resized in place");
            return Ok(address);
        }

        if let Some(next) = self.following(block) {
            let combined = block
                .length()
                .checked_add(next.length())
                .expect("merged blocks never exceed the pool");

            if next.is_free() && combined >= needed {
                self.carve(block.offset(), combined, needed);
                trace!(
                    offset = address.offset(),
                    new_size,
                    absorbed = next.offset(),
                    "grew in place"
                );
                return Ok(address);
            }
        }

        // On failure the original allocation has not been touched.
        let relocated = self.alloc(new_size)?;

        let copy_len = cmp::min(block.payload_len(), new_size);
        let source_end = address
            .offset()
            .checked_add(copy_len)
            .expect("the copied bytes lie inside the old payload");
        self.bytes
            .copy_within(address.offset()..source_end, relocated.offset());

        self.free(address)?;

        trace!(
            from = address.offset(),
            to = relocated.offset(),
            copied = copy_len,
            "relocated"
        );
        Ok(relocated)
    }

    /// The address of the live allocation whose payload starts at `offset`.
    pub(crate) fn address_at(&self, offset: usize) -> Result<Address> {
        let address = Address::new(offset, self.generation);
        self.locate(address)?;

        Ok(address)
    }

    pub(crate) fn payload(&self, address: Address) -> Result<&[u8]> {
        let Located { block, .. } = self.locate(address)?;

        Ok(self
            .bytes
            .get(block.payload())
            .expect("block payloads lie inside the pool"))
    }

    pub(crate) fn payload_mut(&mut self, address: Address) -> Result<&mut [u8]> {
        let Located { block, .. } = self.locate(address)?;

        Ok(self
            .bytes
            .get_mut(block.payload())
            .expect("block payloads lie inside the pool"))
    }

    pub(crate) fn stats(&self) -> PoolStats {
        self.blocks().fold(
            PoolStats {
                capacity: self.capacity(),
                ..PoolStats::default()
            },
            |mut stats, block| {
                stats.block_count = stats.block_count.wrapping_add(1);

                if block.is_free() {
                    stats.free_bytes = stats.free_bytes.wrapping_add(block.payload_len());
                    stats.largest_free_payload =
                        cmp::max(stats.largest_free_payload, block.payload_len());
                } else {
                    stats.allocation_count = stats.allocation_count.wrapping_add(1);
                    stats.allocated_bytes =
                        stats.allocated_bytes.wrapping_add(block.payload_len());
                }

                stats
            },
        )
    }

    /// Checks the partition and coalescing invariants of the block chain.
    ///
    /// # Panics
    ///
    /// Panics if any invariant is violated.
    #[cfg(test)]
    pub(crate) fn assert_integrity(&self) {
        let mut expected_offset = 0;
        let mut previous_was_free = false;

        for block in self.blocks() {
            assert_eq!(block.offset(), expected_offset, "gap or overlap in block chain");
            assert!(
                block.length() > DESCRIPTOR_SIZE,
                "block at {} has no payload",
                block.offset()
            );
            assert!(
                !(previous_was_free && block.is_free()),
                "adjacent free blocks at {}",
                block.offset()
            );

            expected_offset = block.end();
            previous_was_free = block.is_free();
        }

        assert_eq!(expected_offset, self.capacity(), "block chain does not cover the pool");
    }
}

impl fmt::Debug for Region {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("capacity", &self.capacity())
            .field("generation", &self.generation)
            .field("block_count", &self.blocks().count())
            .finish_non_exhaustive()
    }
}
