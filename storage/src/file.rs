//! Reading and writing file content along allocation chains.
use crate::{
    Clock, FsError, FsResult, Volume,
    dir::{
        Directory,
        dirent::{DirEntry, EntryMeta, EntryName, validate_file_name},
    },
    fat::{
        FatEntry,
        allocator::{Allocator, SequentialAllocator},
    },
};
use alloc::vec::Vec;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a written file ended up
pub struct WriteResult {
    /// Slot of the record in its directory
    pub slot: usize,
    pub start_block: u32,
    pub block_count: u32,
    /// Whether an existing file was overwritten
    pub replaced: bool,
}

impl Volume<'_> {
    /// Follows a chain from `start`, collecting at most `limit` bytes.
    ///
    /// Reading stops after `block_count` blocks or on a terminal entry.
    /// A chain that runs into a free or reserved entry is cut short there.
    pub fn read_chain(&self, start: u32, block_count: u32, limit: usize) -> FsResult<Vec<u8>> {
        let fat = self.fat()?;
        let mut content = Vec::new();
        let mut current = start;

        for visited in 1..=block_count {
            let remaining = limit - content.len();
            if remaining == 0 {
                break;
            }

            let block = self.store().block(current)?;
            content.extend_from_slice(&block[..block.len().min(remaining)]);

            if visited == block_count || content.len() == limit {
                break;
            }
            match fat.get(current)? {
                FatEntry::Next(next) => current = next,
                FatEntry::EndOfChain => break,
                entry @ (FatEntry::Free | FatEntry::Reserved) => {
                    warn!("Chain from block {start} broken at block {current} ({entry:?})");
                    break;
                }
            }
        }

        Ok(content)
    }

    /// Returns the content of a file.
    pub fn read_file(&self, meta: &EntryMeta) -> FsResult<Vec<u8>> {
        let limit = usize::try_from(meta.size()).map_err(|_| FsError::OutOfRange)?;
        self.read_chain(meta.start_block(), meta.block_count(), limit)
    }

    /// Writes `content` to the file `name` of `dir`, using sequential allocation.
    pub fn write_file(
        &mut self,
        dir: Directory,
        name: &str,
        content: &[u8],
        clock: &impl Clock,
    ) -> FsResult<WriteResult> {
        self.write_file_with(&SequentialAllocator, dir, name, content, clock)
    }

    /// Writes `content` to the file `name` of `dir`.
    ///
    /// An existing file whose name matches ignoring ASCII case is overwritten
    /// in place and keeps its creation time. Its old chain is freed before the
    /// new one is allocated, and is not restored if allocation fails.
    pub fn write_file_with<A: Allocator>(
        &mut self,
        allocator: &A,
        dir: Directory,
        name: &str,
        content: &[u8],
        clock: &impl Clock,
    ) -> FsResult<WriteResult> {
        validate_file_name(name)?;
        let entry_name = EntryName::new(name)?;
        let size = u32::try_from(content.len()).map_err(|_| FsError::OutOfRange)?;
        let block_size = u32::from(self.header().block_size());
        if block_size == 0 {
            return Err(FsError::OutOfRange);
        }

        let entries = self.entries(dir)?;
        let existing = entries.iter().enumerate().find_map(|(slot, entry)| match entry {
            DirEntry::File(meta) if meta.name().case_folded_match(name) => Some((slot, *meta)),
            _ => None,
        });
        let slot = match existing {
            Some((slot, _)) => slot,
            None => entries
                .iter()
                .position(DirEntry::is_empty)
                .ok_or(FsError::DirectoryFull)?,
        };

        let now = clock.now();
        let created = existing.map_or(now, |(_, meta)| meta.created());
        if let Some((_, old)) = existing {
            let freed = self.fat_mut()?.free_chain(old.start_block())?;
            debug!("Overwriting {name}: released {freed} blocks");
        }

        let required = size / block_size + 1;
        let blocks = allocator.allocate(&self.fat()?, required)?;
        // Table padding past the last block is free but unusable
        self.check_blocks(&blocks)?;
        let start_block = *blocks.first().ok_or(FsError::NoFreeBlocks)?;

        let meta = EntryMeta::new(start_block, required, size, created, now, entry_name);
        self.write_entry(dir, slot, &DirEntry::File(meta))?;

        let mut chunks = content.chunks(self.block_size());
        for (i, &block) in blocks.iter().enumerate() {
            let chunk = chunks.next().unwrap_or_default();
            let data = self.store_mut().block_mut(block)?;
            data[..chunk.len()].copy_from_slice(chunk);
            data[chunk.len()..].fill(0);

            let link = blocks.get(i + 1).map_or(FatEntry::EndOfChain, |&next| FatEntry::Next(next));
            self.fat_mut()?.set(block, link)?;
        }

        debug!("Wrote {size} bytes to {name} (blocks {start_block}..+{required})");
        Ok(WriteResult {
            slot,
            start_block,
            block_count: required,
            replaced: existing.is_some(),
        })
    }
}
