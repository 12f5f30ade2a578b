//! Directory regions and the records they hold.
use crate::{Clock, FsError, FsResult, Volume, fat::FatEntry};
use alloc::vec::Vec;
use dirent::{DIR_ENTRY_SIZE, DirEntry, EntryMeta, EntryName};
use log::debug;

pub mod dirent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Contiguous run of blocks holding the records of a directory
pub struct Directory {
    start_block: u32,
    block_count: u32,
}

impl Directory {
    #[must_use]
    #[inline]
    pub const fn new(start_block: u32, block_count: u32) -> Self {
        Self {
            start_block,
            block_count,
        }
    }

    #[must_use]
    #[inline]
    pub const fn start_block(&self) -> u32 {
        self.start_block
    }

    #[must_use]
    #[inline]
    pub const fn block_count(&self) -> u32 {
        self.block_count
    }
}

impl From<&EntryMeta> for Directory {
    #[inline]
    fn from(meta: &EntryMeta) -> Self {
        Self::new(meta.start_block(), meta.block_count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Name comparison policy
pub enum NameMatch {
    /// Byte-for-byte, used when reading and listing
    Exact,
    /// ASCII case-insensitive, used when writing
    CaseFolded,
}

impl NameMatch {
    #[must_use]
    #[inline]
    pub fn matches(self, name: &EntryName, other: &str) -> bool {
        match self {
            Self::Exact => name.exact_match(other),
            Self::CaseFolded => name.case_folded_match(other),
        }
    }
}

impl Volume<'_> {
    /// Decodes every record of a directory region, empty slots included.
    pub fn entries(&self, dir: Directory) -> FsResult<Vec<DirEntry>> {
        self.store()
            .blocks(dir.start_block(), dir.block_count())?
            .chunks_exact(DIR_ENTRY_SIZE)
            .map(DirEntry::decode)
            .collect()
    }

    /// Returns every occupied record of a directory region, with its slot index.
    pub fn list(&self, dir: Directory) -> FsResult<Vec<(usize, DirEntry)>> {
        Ok(self
            .entries(dir)?
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .collect())
    }

    /// Returns the index of the first empty slot of a directory region.
    pub fn first_empty_slot(&self, dir: Directory) -> FsResult<Option<usize>> {
        Ok(self.entries(dir)?.iter().position(DirEntry::is_empty))
    }

    /// Looks up a subdirectory by name.
    pub fn find_directory(
        &self,
        dir: Directory,
        name: &str,
        policy: NameMatch,
    ) -> FsResult<Option<Directory>> {
        Ok(self.entries(dir)?.iter().find_map(|entry| match entry {
            DirEntry::Directory(meta) if policy.matches(meta.name(), name) => {
                Some(Directory::from(meta))
            }
            _ => None,
        }))
    }

    pub(crate) fn write_entry(
        &mut self,
        dir: Directory,
        slot: usize,
        entry: &DirEntry,
    ) -> FsResult<()> {
        let region = self
            .store_mut()
            .blocks_mut(dir.start_block(), dir.block_count())?;
        let offset = slot.checked_mul(DIR_ENTRY_SIZE).ok_or(FsError::OutOfRange)?;
        let record = region
            .get_mut(offset..offset + DIR_ENTRY_SIZE)
            .ok_or(FsError::OutOfRange)?;
        record.copy_from_slice(&entry.encode());
        Ok(())
    }

    /// Creates a one-block subdirectory in the first empty slot of `parent`.
    ///
    /// The new directory gets the first free block of the allocation table,
    /// provided it lies within the volume.
    /// It can hold `block_size / 64` records.
    pub fn make_directory(
        &mut self,
        parent: Directory,
        name: &str,
        clock: &impl Clock,
    ) -> FsResult<Directory> {
        let name = EntryName::new(name)?;
        let slot = self
            .first_empty_slot(parent)?
            .ok_or(FsError::DirectoryFull)?;
        let block = self
            .free_space()?
            .first_free
            .filter(|&block| block < self.header().block_count())
            .ok_or(FsError::NoFreeBlocks)?;

        // A recycled block may still hold records of a previous life
        self.store_mut().block_mut(block)?.fill(0);

        let now = clock.now();
        let capacity = u32::from(self.header().block_size());
        let meta = EntryMeta::new(block, 1, capacity, now, now, name);
        self.write_entry(parent, slot, &DirEntry::Directory(meta))?;
        self.fat_mut()?.set(block, FatEntry::EndOfChain)?;

        debug!("Created directory {name} at block {block}");
        Ok(Directory::new(block, 1))
    }
}
