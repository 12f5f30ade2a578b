//! Block allocation policies.
use super::{AllocationTable, FatEntry};
use crate::{FsError, FsResult};
use alloc::vec::Vec;
use log::debug;

/// Chooses the blocks of a new chain.
///
/// Allocators only read the table: linking the chosen blocks
/// is left to the caller.
pub trait Allocator {
    /// Returns `count` block indices, in chain order.
    fn allocate<B: AsRef<[u8]>>(&self, table: &AllocationTable<B>, count: u32) -> FsResult<Vec<u32>>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Takes the first free block, then the blocks that directly follow it.
///
/// Blocks after the first one are not checked: free space is assumed to be
/// contiguous from the first free block onwards. On a fragmented volume this
/// hands out blocks that already belong to other chains.
pub struct SequentialAllocator;

impl Allocator for SequentialAllocator {
    fn allocate<B: AsRef<[u8]>>(&self, table: &AllocationTable<B>, count: u32) -> FsResult<Vec<u32>> {
        let space = table.count_free()?;
        let insufficient = FsError::InsufficientSpace {
            required: count,
            available: space.free,
        };

        if space.free < count {
            return Err(insufficient);
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let first = space.first_free.ok_or(insufficient)?;

        debug!("Allocating {count} blocks from block {first}");
        (0..count)
            .map(|i| first.checked_add(i).ok_or(FsError::OutOfRange))
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Takes the first `count` blocks whose entry is actually free.
pub struct FreeListAllocator;

impl Allocator for FreeListAllocator {
    fn allocate<B: AsRef<[u8]>>(&self, table: &AllocationTable<B>, count: u32) -> FsResult<Vec<u32>> {
        let wanted = usize::try_from(count).map_err(|_| FsError::OutOfRange)?;
        let mut blocks = Vec::with_capacity(wanted);

        for index in 0..table.len() {
            if blocks.len() == wanted {
                break;
            }
            if table.get(index)? == FatEntry::Free {
                blocks.push(index);
            }
        }

        if blocks.len() < wanted {
            let available = table.count_free()?.free;
            return Err(FsError::InsufficientSpace {
                required: count,
                available,
            });
        }

        debug!("Allocating {count} free-listed blocks from block {:?}", blocks.first());
        Ok(blocks)
    }
}
