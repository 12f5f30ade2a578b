use crate::{
    FsError, FsResult,
    block::BlockStore,
    dir::Directory,
    fat::{AllocationTable, FreeSpace},
    header::VolumeHeader,
};
use log::warn;

/// A mounted volume: the decoded superblock and the blocks of the image.
///
/// The image is borrowed mutably for as long as the volume lives,
/// which makes the volume the one and only writer of the image.
pub struct Volume<'a> {
    header: VolumeHeader,
    store: BlockStore<'a>,
}

impl<'a> Volume<'a> {
    /// Decodes the superblock of `image` and checks its geometry.
    pub fn mount(image: &'a mut [u8]) -> FsResult<Self> {
        let header = VolumeHeader::decode(image)?;
        header.validate(image.len())?;
        Ok(Self::with_header(header, image))
    }

    /// Decodes the superblock of `image` without checking its geometry.
    ///
    /// Accesses outside of the image still fail with `FsError::OutOfRange`,
    /// but a nonsensical geometry yields nonsensical results.
    pub fn mount_unchecked(image: &'a mut [u8]) -> FsResult<Self> {
        let header = VolumeHeader::decode(image)?;
        Ok(Self::with_header(header, image))
    }

    fn with_header(header: VolumeHeader, image: &'a mut [u8]) -> Self {
        let store = BlockStore::new(image, header.block_size());
        Self { header, store }
    }

    #[must_use]
    #[inline]
    pub const fn header(&self) -> &VolumeHeader {
        &self.header
    }

    #[must_use]
    #[inline]
    pub const fn block_size(&self) -> usize {
        self.store.block_size()
    }

    #[must_use]
    #[inline]
    pub(crate) const fn store(&self) -> &BlockStore<'a> {
        &self.store
    }

    #[must_use]
    #[inline]
    pub(crate) const fn store_mut(&mut self) -> &mut BlockStore<'a> {
        &mut self.store
    }

    #[must_use]
    #[inline]
    /// Returns the root directory region.
    pub const fn root(&self) -> Directory {
        Directory::new(self.header.root_dir_start(), self.header.root_dir_blocks())
    }

    /// Returns a read-only view of the allocation table.
    ///
    /// The table spans its whole region: slots past `block_count` are
    /// reported like any other entry but never describe a usable block.
    pub fn fat(&self) -> FsResult<AllocationTable<&[u8]>> {
        self.store
            .blocks(self.header.fat_start(), self.header.fat_blocks())
            .map(AllocationTable::new)
    }

    /// Returns a mutable view of the allocation table.
    pub fn fat_mut(&mut self) -> FsResult<AllocationTable<&mut [u8]>> {
        self.store
            .blocks_mut(self.header.fat_start(), self.header.fat_blocks())
            .map(AllocationTable::new)
    }

    /// Checks that every block of `blocks` lies within the volume.
    pub(crate) fn check_blocks(&self, blocks: &[u32]) -> FsResult<()> {
        match blocks.iter().find(|&&block| block >= self.header.block_count()) {
            Some(block) => {
                warn!("Block {block} is past the end of the volume");
                Err(FsError::OutOfRange)
            }
            None => Ok(()),
        }
    }

    /// Scans the allocation table.
    pub fn free_space(&self) -> FsResult<FreeSpace> {
        self.fat()?.count_free()
    }

    /// Returns the superblock fields along with a census of the allocation table.
    pub fn info(&self) -> FsResult<(VolumeHeader, FreeSpace)> {
        Ok((self.header, self.free_space()?))
    }
}
