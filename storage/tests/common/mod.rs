//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use flatfs_storage::{FatEntry, Timestamp, Volume, VolumeHeader};

pub const CREATED: Timestamp = Timestamp::new(2024, 3, 9, 14, 5, 0);
pub const MODIFIED: Timestamp = Timestamp::new(2024, 3, 10, 7, 59, 30);

/// A mock disk image, formatted in memory
pub struct MockImage {
    data: Vec<u8>,
}

impl MockImage {
    /// 512-byte blocks, 100 blocks, the table in block 1, the root in block 2.
    pub fn standard() -> Self {
        Self::new(512, 100, 1, 1, 2, 1)
    }

    /// Formats an image with the given geometry.
    ///
    /// Every block before the first data block is marked reserved.
    pub fn new(
        block_size: u16,
        block_count: u32,
        fat_start: u32,
        fat_blocks: u32,
        root_start: u32,
        root_blocks: u32,
    ) -> Self {
        let len = usize::from(block_size) * block_count as usize;
        let mut data = vec![0; len];
        VolumeHeader::new(
            block_size,
            block_count,
            fat_start,
            fat_blocks,
            root_start,
            root_blocks,
        )
        .encode(&mut data)
        .unwrap();

        let first_data = (fat_start + fat_blocks).max(root_start + root_blocks);
        let mut volume = Volume::mount(&mut data).unwrap();
        let mut fat = volume.fat_mut().unwrap();
        for block in 0..first_data.min(fat.len()) {
            fat.set(block, FatEntry::Reserved).unwrap();
        }

        Self { data }
    }

    pub fn volume(&mut self) -> Volume<'_> {
        Volume::mount(&mut self.data).unwrap()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}
