//! Engine for flat FAT-style volumes.
//!
//! A volume is a raw byte image made of fixed-size blocks: a superblock, a
//! file allocation table (one big-endian `u32` per block), a root directory
//! region of 64-byte records, and data blocks linked into chains by the table.
#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

extern crate alloc;

use alloc::string::String;
use thiserror::Error;

pub mod block;
pub mod date;
pub mod dir;
pub mod fat;
pub mod file;
pub mod header;
pub mod path;
pub mod volume;

pub use date::Timestamp;
pub use dir::Directory;
pub use fat::{AllocationTable, FatEntry, FreeSpace};
pub use header::VolumeHeader;
pub use volume::Volume;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
/// Error type for volume operations
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),
    #[error("No empty entry left in the directory")]
    DirectoryFull,
    #[error("Not enough space on disk: {required} blocks required, {available} free")]
    InsufficientSpace { required: u32, available: u32 },
    #[error("No unused block left in the allocation table")]
    NoFreeBlocks,
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Out of range")]
    OutOfRange,
}

pub type FsResult<T> = Result<T, FsError>;

#[inline]
pub(crate) fn read_be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Source of wall-clock time for the timestamps stamped on written records.
pub trait Clock {
    #[must_use]
    fn now(&self) -> Timestamp;
}

/// A stopped clock, always returning the same instant.
impl Clock for Timestamp {
    #[inline]
    fn now(&self) -> Timestamp {
        *self
    }
}
