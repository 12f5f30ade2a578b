//! File allocation table.
//!
//! One big-endian `u32` per block: `0` is free, `1` is reserved,
//! any value from `0xFFFF_FF00` upwards terminates a chain,
//! and anything else is the index of the next block of the chain.
use crate::{FsError, FsResult};
use log::debug;

pub mod allocator;

/// Size of a table entry in bytes
pub const ENTRY_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Allocation table entry
pub enum FatEntry {
    /// Free block
    Free,
    /// Reserved block, never allocated
    Reserved,
    /// Used block, pointing to the next block in the chain
    Next(u32),
    /// Last block in the chain
    EndOfChain,
}

impl FatEntry {
    pub const FREE: u32 = 0x0000_0000;
    pub const RESERVED: u32 = 0x0000_0001;
    /// Canonical end-of-chain marker, the one written by the engine
    pub const END_OF_CHAIN: u32 = 0xFFFF_FFFF;
    /// Any value from this one upwards terminates a chain
    pub const TERMINAL: u32 = 0xFFFF_FF00;

    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            Self::FREE => Self::Free,
            Self::RESERVED => Self::Reserved,
            Self::TERMINAL..=u32::MAX => Self::EndOfChain,
            next => Self::Next(next),
        }
    }

    #[must_use]
    #[inline]
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Free => Self::FREE,
            Self::Reserved => Self::RESERVED,
            Self::Next(next) => next,
            Self::EndOfChain => Self::END_OF_CHAIN,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Census of the allocation table
pub struct FreeSpace {
    /// Number of free entries
    pub free: u32,
    /// Number of reserved entries
    pub reserved: u32,
    /// Number of entries that are part of a chain
    pub allocated: u32,
    /// Index of the first free entry, if any
    pub first_free: Option<u32>,
}

/// Typed view over the bytes of the allocation table region.
///
/// `B` is either a shared or a mutable byte slice;
/// only the latter allows modifying entries.
pub struct AllocationTable<B> {
    data: B,
}

impl<B: AsRef<[u8]>> AllocationTable<B> {
    #[must_use]
    #[inline]
    pub const fn new(data: B) -> Self {
        Self { data }
    }

    #[must_use]
    #[inline]
    /// Returns the number of entries of the table.
    pub fn len(&self) -> u32 {
        u32::try_from(self.data.as_ref().len() / ENTRY_SIZE).unwrap_or(u32::MAX)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn offset(&self, index: u32) -> FsResult<usize> {
        if index >= self.len() {
            return Err(FsError::OutOfRange);
        }
        usize::try_from(index)
            .map(|index| index * ENTRY_SIZE)
            .map_err(|_| FsError::OutOfRange)
    }

    /// Returns the raw value of the entry at `index`.
    pub fn entry_at(&self, index: u32) -> FsResult<u32> {
        let offset = self.offset(index)?;
        let data = self.data.as_ref();
        Ok(u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]))
    }

    #[inline]
    pub fn get(&self, index: u32) -> FsResult<FatEntry> {
        self.entry_at(index).map(FatEntry::from_raw)
    }

    #[must_use]
    /// Returns an iterator over all blocks in a chain starting from the given block.
    ///
    /// The iterator ends after a block whose entry is not `FatEntry::Next`,
    /// or after as many steps as the table has entries.
    pub const fn chain_iter(&self, start: u32) -> ChainIter<'_, B> {
        ChainIter {
            table: self,
            next: Some(start),
            steps: 0,
        }
    }

    /// Classifies every entry of the table as free, reserved or allocated.
    ///
    /// This is a single linear scan from index 0.
    pub fn count_free(&self) -> FsResult<FreeSpace> {
        let mut space = FreeSpace::default();
        for index in 0..self.len() {
            match self.get(index)? {
                FatEntry::Free => {
                    space.free += 1;
                    space.first_free.get_or_insert(index);
                }
                FatEntry::Reserved => space.reserved += 1,
                FatEntry::Next(_) | FatEntry::EndOfChain => space.allocated += 1,
            }
        }
        Ok(space)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> AllocationTable<B> {
    /// Overwrites the raw value of the entry at `index`.
    pub fn set_entry(&mut self, index: u32, value: u32) -> FsResult<()> {
        let offset = self.offset(index)?;
        self.data.as_mut()[offset..offset + ENTRY_SIZE].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    #[inline]
    pub fn set(&mut self, index: u32, entry: FatEntry) -> FsResult<()> {
        self.set_entry(index, entry.to_raw())
    }

    /// Frees every block of the chain starting at `start`, the last one included.
    ///
    /// Walking stops early on a free or reserved entry: such a chain is broken
    /// and whatever it would point to does not belong to it.
    ///
    /// Returns the number of freed blocks.
    pub fn free_chain(&mut self, start: u32) -> FsResult<u32> {
        let mut current = start;
        let mut freed = 0;

        loop {
            let entry = self.get(current)?;
            if matches!(entry, FatEntry::Free | FatEntry::Reserved) {
                break;
            }

            self.set(current, FatEntry::Free)?;
            freed += 1;

            match entry {
                FatEntry::Next(next) => current = next,
                _ => break,
            }
        }

        debug!("Freed {freed} blocks of the chain starting at block {start}");
        Ok(freed)
    }
}

/// Iterator over a chain of blocks
pub struct ChainIter<'a, B> {
    table: &'a AllocationTable<B>,
    next: Option<u32>,
    steps: u32,
}

impl<B: AsRef<[u8]>> Iterator for ChainIter<'_, B> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // A well-formed chain cannot be longer than the table itself
        if self.steps >= self.table.len() {
            self.next = None;
            return None;
        }
        self.steps += 1;

        self.next = match self.table.get(current) {
            Ok(FatEntry::Next(next)) => Some(next),
            _ => None,
        };

        Some(current)
    }
}
