use std::ops::Range;

/// The number of pool bytes consumed by the descriptor at the start of every block.
///
/// Block metadata is stored inline, so a block that can hand out `n` payload bytes occupies
/// `n + DESCRIPTOR_SIZE` bytes of the pool. Callers sizing a pool for a known set of
/// allocations need to account for this overhead.
///
/// # Example
///
/// ```rust
/// use fixed_pool::{DESCRIPTOR_SIZE, PoolAllocator};
///
/// // Room for exactly one 100-byte allocation.
/// let mut pool = PoolAllocator::with_capacity(100 + DESCRIPTOR_SIZE)?;
///
/// let address = pool.alloc(100)?;
/// assert_eq!(address.offset(), DESCRIPTOR_SIZE);
/// # Ok::<(), fixed_pool::Error>(())
/// ```
pub const DESCRIPTOR_SIZE: usize = 16;

const LENGTH_FIELD: Range<usize> = 0..8;
const STATE_FIELD: Range<usize> = 8..16;

// Distinct non-zero tags make a zeroed or half-written header obvious when debugging.
const STATE_FREE: u64 = 0x4545_5246; // "FREE"
const STATE_ALLOCATED: u64 = 0x4445_5355; // "USED"

/// The header stored at the start of every block in the pool.
///
/// The length covers the whole block, header included. The successor of a block starts at
/// `offset + length`, so the chain of blocks needs no explicit link field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Descriptor {
    pub(crate) length: usize,
    pub(crate) is_free: bool,
}

impl Descriptor {
    pub(crate) fn free(length: usize) -> Self {
        Self {
            length,
            is_free: true,
        }
    }

    pub(crate) fn allocated(length: usize) -> Self {
        Self {
            length,
            is_free: false,
        }
    }

    /// Decodes the descriptor stored at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if there is no valid descriptor at `offset`. The caller is expected to only
    /// read offsets reached by walking the block chain.
    pub(crate) fn read(region: &[u8], offset: usize) -> Self {
        let header = header(region, offset);

        let length = u64::from_le_bytes(field(header, LENGTH_FIELD));
        let length = usize::try_from(length).expect("block lengths never exceed the pool size");

        let is_free = match u64::from_le_bytes(field(header, STATE_FIELD)) {
            STATE_FREE => true,
            STATE_ALLOCATED => false,
            other => panic!("corrupted block descriptor at offset {offset}: state tag {other:#x}"),
        };

        Self { length, is_free }
    }

    pub(crate) fn write(self, region: &mut [u8], offset: usize) {
        let header = region
            .get_mut(offset..header_end(offset))
            .expect("descriptors are only written inside the pool");

        let length = u64::try_from(self.length).expect("usize always fits in u64");
        let state = if self.is_free {
            STATE_FREE
        } else {
            STATE_ALLOCATED
        };

        let (length_bytes, state_bytes) = header.split_at_mut(LENGTH_FIELD.end);
        length_bytes.copy_from_slice(&length.to_le_bytes());
        state_bytes.copy_from_slice(&state.to_le_bytes());
    }

    /// The number of bytes available to the owner of the block.
    pub(crate) fn payload_len(self) -> usize {
        self.length
            .checked_sub(DESCRIPTOR_SIZE)
            .expect("every block is larger than its descriptor")
    }
}

/// Whether the space left over after carving a block is worth turning into a block of its own.
///
/// The remainder must hold a descriptor and at least one payload byte.
pub(crate) fn can_split(excess: usize) -> bool {
    excess > DESCRIPTOR_SIZE
}

fn header_end(offset: usize) -> usize {
    offset
        .checked_add(DESCRIPTOR_SIZE)
        .expect("descriptor offsets are bounded by the pool size")
}

fn header(region: &[u8], offset: usize) -> &[u8] {
    region
        .get(offset..header_end(offset))
        .expect("descriptors are only read inside the pool")
}

fn field(header: &[u8], range: Range<usize>) -> [u8; 8] {
    header
        .get(range)
        .and_then(|bytes| bytes.try_into().ok())
        .expect("descriptor fields are 8 bytes wide")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_at_unaligned_offset() {
        let mut region = vec![0_u8; 64];

        Descriptor::allocated(33).write(&mut region, 3);
        Descriptor::free(28).write(&mut region, 36);

        assert_eq!(Descriptor::read(&region, 3), Descriptor::allocated(33));
        assert_eq!(Descriptor::read(&region, 36), Descriptor::free(28));
    }

    #[test]
    fn payload_excludes_header() {
        assert_eq!(Descriptor::free(DESCRIPTOR_SIZE + 10).payload_len(), 10);
    }

    #[test]
    fn split_requires_room_for_payload() {
        assert!(!can_split(0));
        assert!(!can_split(DESCRIPTOR_SIZE));
        assert!(can_split(DESCRIPTOR_SIZE + 1));
    }

    #[test]
    #[should_panic]
    fn panic_on_zeroed_header() {
        let region = vec![0_u8; DESCRIPTOR_SIZE];

        _ = Descriptor::read(&region, 0);
    }

    #[test]
    #[should_panic]
    fn panic_on_header_past_end() {
        let region = vec![0_u8; DESCRIPTOR_SIZE];

        _ = Descriptor::read(&region, 1);
    }
}
