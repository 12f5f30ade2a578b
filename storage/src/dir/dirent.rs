use crate::{FsError, FsResult, Timestamp, read_be_u32};
use alloc::string::String;
use core::fmt::{self, Write};

/// Size of a directory record in bytes
pub const DIR_ENTRY_SIZE: usize = 64;
/// Size of the on-disk name field, NUL padding included
pub const NAME_FIELD_SIZE: usize = 31;
/// Longest name that can be written to a record
pub const MAX_NAME_LEN: usize = 30;

const STATUS_OFFSET: usize = 0;
const START_BLOCK_OFFSET: usize = 1;
const BLOCK_COUNT_OFFSET: usize = 5;
const SIZE_OFFSET: usize = 9;
const CREATE_TIME_OFFSET: usize = 13;
const MODIFY_TIME_OFFSET: usize = 20;
const NAME_OFFSET: usize = 27;

#[derive(Clone, Copy, PartialEq, Eq)]
/// Bounded, NUL-padded record name
pub struct EntryName([u8; NAME_FIELD_SIZE]);

impl EntryName {
    /// Creates a name fit to be written to a record.
    ///
    /// The name must be 1 to 30 bytes long and contain neither `/` nor NUL.
    pub fn new(name: &str) -> FsResult<Self> {
        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || name.bytes().any(|b| b == b'/' || b == 0)
        {
            return Err(FsError::InvalidName(String::from(name)));
        }

        let mut raw = [0; NAME_FIELD_SIZE];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(raw))
    }

    #[must_use]
    #[inline]
    pub const fn from_raw(raw: [u8; NAME_FIELD_SIZE]) -> Self {
        Self(raw)
    }

    #[must_use]
    #[inline]
    pub const fn raw(&self) -> &[u8; NAME_FIELD_SIZE] {
        &self.0
    }

    #[must_use]
    /// Returns the name bytes, up to the first NUL byte.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_SIZE);
        &self.0[..len]
    }

    #[must_use]
    #[inline]
    /// Byte-for-byte comparison.
    pub fn exact_match(&self, name: &str) -> bool {
        self.as_bytes() == name.as_bytes()
    }

    #[must_use]
    #[inline]
    /// Comparison ignoring ASCII case.
    pub fn case_folded_match(&self, name: &str) -> bool {
        self.as_bytes().eq_ignore_ascii_case(name.as_bytes())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.as_bytes().utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_char(char::REPLACEMENT_CHARACTER)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Checks a file name against the rules enforced when writing a file.
///
/// At most 30 bytes. The stem (everything before the last `.`) may only
/// contain ASCII letters, digits and `_`. The extension is not checked.
pub fn validate_file_name(name: &str) -> FsResult<()> {
    EntryName::new(name)?;

    let stem = name.rfind('.').map_or(name, |dot| &name[..dot]);
    if !stem.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(FsError::InvalidName(String::from(name)));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Metadata shared by file and directory records
pub struct EntryMeta {
    start_block: u32,
    block_count: u32,
    size: u32,
    created: Timestamp,
    modified: Timestamp,
    name: EntryName,
}

impl EntryMeta {
    #[must_use]
    #[inline]
    pub const fn new(
        start_block: u32,
        block_count: u32,
        size: u32,
        created: Timestamp,
        modified: Timestamp,
        name: EntryName,
    ) -> Self {
        Self {
            start_block,
            block_count,
            size,
            created,
            modified,
            name,
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

    #[must_use]
    #[inline]
    /// Content size in bytes.
    ///
    /// For directories, this is the byte capacity of their region.
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    #[inline]
    pub const fn created(&self) -> Timestamp {
        self.created
    }

    #[must_use]
    #[inline]
    pub const fn modified(&self) -> Timestamp {
        self.modified
    }

    #[must_use]
    #[inline]
    pub const fn name(&self) -> &EntryName {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Directory record
pub enum DirEntry {
    /// Unused slot
    Empty,
    File(EntryMeta),
    Directory(EntryMeta),
    /// Occupied slot with a status this engine does not know about.
    ///
    /// Never matched by name, never reused.
    Unrecognised { status: u8 },
}

impl DirEntry {
    pub const STATUS_EMPTY: u8 = 0x00;
    pub const STATUS_FILE: u8 = 0x03;
    pub const STATUS_DIRECTORY: u8 = 0x05;

    /// Decodes the record held in the first 64 bytes of `raw`.
    pub fn decode(raw: &[u8]) -> FsResult<Self> {
        if raw.len() < DIR_ENTRY_SIZE {
            return Err(FsError::OutOfRange);
        }

        let meta = || {
            let mut created = [0; Timestamp::ENCODED_SIZE];
            created.copy_from_slice(&raw[CREATE_TIME_OFFSET..MODIFY_TIME_OFFSET]);
            let mut modified = [0; Timestamp::ENCODED_SIZE];
            modified.copy_from_slice(&raw[MODIFY_TIME_OFFSET..NAME_OFFSET]);
            let mut name = [0; NAME_FIELD_SIZE];
            name.copy_from_slice(&raw[NAME_OFFSET..NAME_OFFSET + NAME_FIELD_SIZE]);

            EntryMeta {
                start_block: read_be_u32(raw, START_BLOCK_OFFSET),
                block_count: read_be_u32(raw, BLOCK_COUNT_OFFSET),
                size: read_be_u32(raw, SIZE_OFFSET),
                created: Timestamp::decode(created),
                modified: Timestamp::decode(modified),
                name: EntryName(name),
            }
        };

        Ok(match raw[STATUS_OFFSET] {
            Self::STATUS_EMPTY => Self::Empty,
            Self::STATUS_FILE => Self::File(meta()),
            Self::STATUS_DIRECTORY => Self::Directory(meta()),
            status => Self::Unrecognised { status },
        })
    }

    #[must_use]
    /// Encodes the record. The reserved trailing bytes are zeroed.
    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0; DIR_ENTRY_SIZE];
        raw[STATUS_OFFSET] = self.status();

        if let Some(meta) = self.meta() {
            raw[START_BLOCK_OFFSET..BLOCK_COUNT_OFFSET].copy_from_slice(&meta.start_block.to_be_bytes());
            raw[BLOCK_COUNT_OFFSET..SIZE_OFFSET].copy_from_slice(&meta.block_count.to_be_bytes());
            raw[SIZE_OFFSET..CREATE_TIME_OFFSET].copy_from_slice(&meta.size.to_be_bytes());
            raw[CREATE_TIME_OFFSET..MODIFY_TIME_OFFSET].copy_from_slice(&meta.created.encode());
            raw[MODIFY_TIME_OFFSET..NAME_OFFSET].copy_from_slice(&meta.modified.encode());
            raw[NAME_OFFSET..NAME_OFFSET + NAME_FIELD_SIZE].copy_from_slice(&meta.name.0);
        }

        raw
    }

    #[must_use]
    #[inline]
    pub const fn status(&self) -> u8 {
        match self {
            Self::Empty => Self::STATUS_EMPTY,
            Self::File(_) => Self::STATUS_FILE,
            Self::Directory(_) => Self::STATUS_DIRECTORY,
            Self::Unrecognised { status } => *status,
        }
    }

    #[must_use]
    #[inline]
    pub const fn meta(&self) -> Option<&EntryMeta> {
        match self {
            Self::File(meta) | Self::Directory(meta) => Some(meta),
            Self::Empty | Self::Unrecognised { .. } => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
