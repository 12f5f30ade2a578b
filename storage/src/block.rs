//! Block-granular view of a volume image.
use crate::{FsError, FsResult};
use core::ops::Range;

/// The backing image, addressed as a sequence of fixed-size blocks.
///
/// All reads and writes of the engine go through this type,
/// scoped to a range of block indices.
pub struct BlockStore<'a> {
    data: &'a mut [u8],
    block_size: usize,
}

impl<'a> BlockStore<'a> {
    #[must_use]
    #[inline]
    pub fn new(data: &'a mut [u8], block_size: u16) -> Self {
        Self {
            data,
            block_size: usize::from(block_size),
        }
    }

    #[must_use]
    #[inline]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    #[inline]
    /// Returns the number of whole blocks held by the image.
    pub const fn len(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.data.len() / self.block_size
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn byte_range(&self, start: u32, count: u32) -> FsResult<Range<usize>> {
        let start = usize::try_from(start).map_err(|_| FsError::OutOfRange)?;
        let count = usize::try_from(count).map_err(|_| FsError::OutOfRange)?;
        let end = start.checked_add(count).ok_or(FsError::OutOfRange)?;
        if end > self.len() {
            return Err(FsError::OutOfRange);
        }
        Ok(start * self.block_size..end * self.block_size)
    }

    /// Returns `count` contiguous blocks starting at block `start`.
    pub fn blocks(&self, start: u32, count: u32) -> FsResult<&[u8]> {
        let range = self.byte_range(start, count)?;
        Ok(&self.data[range])
    }

    /// Returns `count` contiguous blocks starting at block `start`, mutably.
    pub fn blocks_mut(&mut self, start: u32, count: u32) -> FsResult<&mut [u8]> {
        let range = self.byte_range(start, count)?;
        Ok(&mut self.data[range])
    }

    #[inline]
    pub fn block(&self, index: u32) -> FsResult<&[u8]> {
        self.blocks(index, 1)
    }

    #[inline]
    pub fn block_mut(&mut self, index: u32) -> FsResult<&mut [u8]> {
        self.blocks_mut(index, 1)
    }
}
