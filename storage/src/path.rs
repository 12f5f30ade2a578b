//! Slash-separated path resolution.
use crate::{
    Clock, FsError, FsResult, Volume,
    dir::{
        Directory, NameMatch,
        dirent::{DirEntry, EntryMeta, validate_file_name},
    },
};
use alloc::string::String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of a successful path lookup
pub enum Resolved {
    Root(Directory),
    File {
        parent: Directory,
        slot: usize,
        meta: EntryMeta,
    },
    Directory {
        parent: Directory,
        slot: usize,
        meta: EntryMeta,
    },
}

impl Resolved {
    /// Returns the directory region designated by the path, if any.
    #[must_use]
    pub fn as_directory(&self) -> Option<Directory> {
        match self {
            Self::Root(dir) => Some(*dir),
            Self::Directory { meta, .. } => Some(Directory::from(meta)),
            Self::File { .. } => None,
        }
    }
}

/// Splits a path on `/`, dropping empty components.
pub fn components(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

impl Volume<'_> {
    /// Looks up a path from the root directory, comparing names byte-for-byte.
    ///
    /// Every component but the last must name a directory. The last one may
    /// name a file or a directory. `""` and `"/"` resolve to the root.
    pub fn resolve(&self, path: &str) -> FsResult<Resolved> {
        let mut parts = components(path);
        let Some(last) = parts.next_back() else {
            return Ok(Resolved::Root(self.root()));
        };

        let mut parent = self.root();
        for part in parts {
            parent = self
                .find_directory(parent, part, NameMatch::Exact)?
                .ok_or_else(|| FsError::NotFound(String::from(part)))?;
        }

        self.entries(parent)?
            .into_iter()
            .enumerate()
            .find_map(|(slot, entry)| match entry {
                DirEntry::File(meta) if meta.name().exact_match(last) => {
                    Some(Resolved::File { parent, slot, meta })
                }
                DirEntry::Directory(meta) if meta.name().exact_match(last) => {
                    Some(Resolved::Directory { parent, slot, meta })
                }
                _ => None,
            })
            .ok_or_else(|| FsError::NotFound(String::from(last)))
    }

    /// Looks up a path that must designate a directory.
    pub fn resolve_directory(&self, path: &str) -> FsResult<Directory> {
        self.resolve(path)?
            .as_directory()
            .ok_or_else(|| FsError::NotFound(String::from(path)))
    }

    /// Finds the directory a file at `path` should be written to.
    ///
    /// Intermediate components are matched ignoring ASCII case, and created
    /// when missing. The final component is checked against the file name
    /// rules before anything is created, and returned alongside the parent.
    pub fn prepare_parent<'p>(
        &mut self,
        path: &'p str,
        clock: &impl Clock,
    ) -> FsResult<(Directory, &'p str)> {
        let mut parts = components(path);
        let name = parts
            .next_back()
            .ok_or_else(|| FsError::InvalidName(String::from(path)))?;
        validate_file_name(name)?;

        let mut parent = self.root();
        for part in parts {
            parent = match self.find_directory(parent, part, NameMatch::CaseFolded)? {
                Some(dir) => dir,
                None => self.make_directory(parent, part, clock)?,
            };
        }

        Ok((parent, name))
    }
}
