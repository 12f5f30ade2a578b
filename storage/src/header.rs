//! Superblock decoding.
use crate::{FsError, FsResult, read_be_u32};

/// Volume geometry, as stored in the superblock.
///
/// Every multi-byte field is big-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeHeader {
    /// Informational identifier, never validated
    identifier: [u8; 8],
    /// Size of a block in bytes
    block_size: u16,
    /// Number of blocks in the volume
    block_count: u32,
    /// First block of the allocation table
    fat_start: u32,
    /// Number of blocks taken by the allocation table
    fat_blocks: u32,
    /// First block of the root directory
    root_dir_start: u32,
    /// Number of blocks taken by the root directory
    root_dir_blocks: u32,
}

impl VolumeHeader {
    /// Number of bytes of the superblock that hold the header
    pub const SIZE: usize = 30;
    /// Identifier written by `new`
    pub const DEFAULT_IDENTIFIER: [u8; 8] = *b"FLATFS\0\0";

    const BLOCK_SIZE_OFFSET: usize = 8;
    const BLOCK_COUNT_OFFSET: usize = 10;
    const FAT_START_OFFSET: usize = 14;
    const FAT_BLOCKS_OFFSET: usize = 18;
    const ROOT_DIR_START_OFFSET: usize = 22;
    const ROOT_DIR_BLOCKS_OFFSET: usize = 26;

    #[must_use]
    #[inline]
    pub const fn new(
        block_size: u16,
        block_count: u32,
        fat_start: u32,
        fat_blocks: u32,
        root_dir_start: u32,
        root_dir_blocks: u32,
    ) -> Self {
        Self {
            identifier: Self::DEFAULT_IDENTIFIER,
            block_size,
            block_count,
            fat_start,
            fat_blocks,
            root_dir_start,
            root_dir_blocks,
        }
    }

    #[must_use]
    #[inline]
    pub const fn with_identifier(mut self, identifier: [u8; 8]) -> Self {
        self.identifier = identifier;
        self
    }

    /// Extracts the header fields from the start of an image.
    ///
    /// No sanity check is performed on the decoded geometry,
    /// see `validate` for that.
    pub fn decode(image: &[u8]) -> FsResult<Self> {
        if image.len() < Self::SIZE {
            return Err(FsError::OutOfRange);
        }

        let mut identifier = [0; 8];
        identifier.copy_from_slice(&image[..8]);

        Ok(Self {
            identifier,
            block_size: u16::from_be_bytes([
                image[Self::BLOCK_SIZE_OFFSET],
                image[Self::BLOCK_SIZE_OFFSET + 1],
            ]),
            block_count: read_be_u32(image, Self::BLOCK_COUNT_OFFSET),
            fat_start: read_be_u32(image, Self::FAT_START_OFFSET),
            fat_blocks: read_be_u32(image, Self::FAT_BLOCKS_OFFSET),
            root_dir_start: read_be_u32(image, Self::ROOT_DIR_START_OFFSET),
            root_dir_blocks: read_be_u32(image, Self::ROOT_DIR_BLOCKS_OFFSET),
        })
    }

    /// Writes the header fields at the start of an image.
    pub fn encode(&self, image: &mut [u8]) -> FsResult<()> {
        if image.len() < Self::SIZE {
            return Err(FsError::OutOfRange);
        }

        image[..8].copy_from_slice(&self.identifier);
        image[Self::BLOCK_SIZE_OFFSET..Self::BLOCK_COUNT_OFFSET]
            .copy_from_slice(&self.block_size.to_be_bytes());
        write_be_u32(image, Self::BLOCK_COUNT_OFFSET, self.block_count);
        write_be_u32(image, Self::FAT_START_OFFSET, self.fat_start);
        write_be_u32(image, Self::FAT_BLOCKS_OFFSET, self.fat_blocks);
        write_be_u32(image, Self::ROOT_DIR_START_OFFSET, self.root_dir_start);
        write_be_u32(image, Self::ROOT_DIR_BLOCKS_OFFSET, self.root_dir_blocks);

        Ok(())
    }

    /// Checks that the geometry is coherent with itself and with an image of `image_len` bytes.
    ///
    /// Both the allocation table and the root directory must lie within `[0, block_count)`,
    /// and the image must hold `block_count` blocks.
    pub fn validate(&self, image_len: usize) -> FsResult<()> {
        if self.block_size == 0 {
            return Err(FsError::OutOfRange);
        }

        let within = |start: u32, count: u32| {
            start
                .checked_add(count)
                .is_some_and(|end| end <= self.block_count)
        };
        if !within(self.fat_start, self.fat_blocks)
            || !within(self.root_dir_start, self.root_dir_blocks)
        {
            return Err(FsError::OutOfRange);
        }

        let volume_len = u64::from(self.block_count) * u64::from(self.block_size);
        if volume_len > u64::try_from(image_len).unwrap_or(u64::MAX) {
            return Err(FsError::OutOfRange);
        }

        Ok(())
    }

    #[must_use]
    /// Returns the identifier, up to its first NUL byte.
    pub fn identifier(&self) -> &str {
        let len = self
            .identifier
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.identifier.len());
        core::str::from_utf8(&self.identifier[..len]).unwrap_or("")
    }

    #[must_use]
    #[inline]
    pub const fn block_size(&self) -> u16 {
        self.block_size
    }

    #[must_use]
    #[inline]
    pub const fn block_count(&self) -> u32 {
        self.block_count
    }

    #[must_use]
    #[inline]
    pub const fn fat_start(&self) -> u32 {
        self.fat_start
    }

    #[must_use]
    #[inline]
    pub const fn fat_blocks(&self) -> u32 {
        self.fat_blocks
    }

    #[must_use]
    #[inline]
    pub const fn root_dir_start(&self) -> u32 {
        self.root_dir_start
    }

    #[must_use]
    #[inline]
    pub const fn root_dir_blocks(&self) -> u32 {
        self.root_dir_blocks
    }
}

#[inline]
fn write_be_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let mut image = [0u8; 64];
        image[..8].copy_from_slice(b"CSC360FS");
        image[8..10].copy_from_slice(&[0x02, 0x00]);
        image[10..14].copy_from_slice(&[0x00, 0x00, 0x17, 0x8C]);
        image[14..18].copy_from_slice(&[0, 0, 0, 1]);
        image[18..22].copy_from_slice(&[0, 0, 0, 0x2F]);
        image[22..26].copy_from_slice(&[0, 0, 0, 0x30]);
        image[26..30].copy_from_slice(&[0, 0, 0, 8]);

        let header = VolumeHeader::decode(&image).unwrap();
        assert_eq!(header.identifier(), "CSC360FS");
        assert_eq!(header.block_size(), 512);
        assert_eq!(header.block_count(), 6028);
        assert_eq!(header.fat_start(), 1);
        assert_eq!(header.fat_blocks(), 47);
        assert_eq!(header.root_dir_start(), 48);
        assert_eq!(header.root_dir_blocks(), 8);
    }

    #[test]
    fn test_encode_decode() {
        let header = VolumeHeader::new(512, 100, 1, 1, 2, 1);
        let mut image = [0u8; 32];
        header.encode(&mut image).unwrap();

        assert_eq!(&image[8..10], &[0x02, 0x00]);
        assert_eq!(&image[10..14], &[0, 0, 0, 100]);
        assert_eq!(VolumeHeader::decode(&image).unwrap(), header);
        assert_eq!(header.identifier(), "FLATFS");
    }

    #[test]
    fn test_short_image() {
        assert_eq!(VolumeHeader::decode(&[0; 29]), Err(FsError::OutOfRange));
        let mut short = [0u8; 12];
        assert_eq!(
            VolumeHeader::new(512, 1, 0, 0, 0, 0).encode(&mut short),
            Err(FsError::OutOfRange)
        );
    }

    #[test]
    fn test_validate() {
        let header = VolumeHeader::new(512, 100, 1, 1, 2, 1);
        assert!(header.validate(512 * 100).is_ok());
        // Image shorter than the advertised geometry
        assert_eq!(header.validate(512 * 99), Err(FsError::OutOfRange));

        let fat_outside = VolumeHeader::new(512, 100, 99, 2, 2, 1);
        assert_eq!(fat_outside.validate(512 * 100), Err(FsError::OutOfRange));

        let root_overflow = VolumeHeader::new(512, 100, 1, 1, u32::MAX, 2);
        assert_eq!(root_overflow.validate(512 * 100), Err(FsError::OutOfRange));

        let no_block_size = VolumeHeader::new(0, 100, 1, 1, 2, 1);
        assert_eq!(no_block_size.validate(512 * 100), Err(FsError::OutOfRange));
    }
}
