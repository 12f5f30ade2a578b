//! Subcommands and their argument parsing.
use crate::{
    clock::SystemClock,
    error::{ToolError, ToolResult},
};
use flatfs_storage::{
    FreeSpace, Volume, VolumeHeader,
    dir::dirent::{DirEntry, EntryMeta},
    path::Resolved,
};
use log::info;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

pub const USAGE: &str = "\
Usage:
    flatfs info <image>
    flatfs list <image> [directory]
    flatfs get  <image> <path> <output>
    flatfs put  <image> <source> <destination>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the superblock and a census of the allocation table
    Info { image: PathBuf },
    /// Print the records of a directory
    List { image: PathBuf, dir: String },
    /// Copy a file out of the image
    Get {
        image: PathBuf,
        path: String,
        output: PathBuf,
    },
    /// Copy a host file into the image
    Put {
        image: PathBuf,
        source: PathBuf,
        dest: String,
    },
}

impl Command {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> ToolResult<Self> {
        let args = args.into_iter().collect::<Vec<_>>();
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();

        let command = match args.as_slice() {
            ["info", image] => Self::Info {
                image: PathBuf::from(image),
            },
            ["list", image] => Self::List {
                image: PathBuf::from(image),
                dir: String::from("/"),
            },
            ["list", image, dir] => Self::List {
                image: PathBuf::from(image),
                dir: (*dir).to_string(),
            },
            ["get", image, path, output] => Self::Get {
                image: PathBuf::from(image),
                path: (*path).to_string(),
                output: PathBuf::from(output),
            },
            ["put", image, source, dest] => Self::Put {
                image: PathBuf::from(image),
                source: PathBuf::from(source),
                dest: (*dest).to_string(),
            },
            _ => return Err(ToolError::Usage(String::from(USAGE))),
        };

        Ok(command)
    }

    #[must_use]
    pub fn image(&self) -> &Path {
        match self {
            Self::Info { image }
            | Self::List { image, .. }
            | Self::Get { image, .. }
            | Self::Put { image, .. } => image,
        }
    }

    /// Runs the command, printing its report to `out`.
    ///
    /// The image is only written back by `put`, and only on success.
    pub fn run(&self, out: &mut impl Write) -> ToolResult<()> {
        let image_path = self.image();
        let mut image = fs::read(image_path).map_err(|source| ToolError::Image {
            path: image_path.to_path_buf(),
            source,
        })?;
        let mut volume = Volume::mount(&mut image)?;

        let report = match self {
            Self::Info { .. } => {
                let (header, space) = volume.info()?;
                render_info(&header, &space)
            }
            Self::List { dir, .. } => {
                let dir = volume.resolve_directory(dir)?;
                render_list(&volume.list(dir)?)
            }
            Self::Get { path, output, .. } => {
                let meta = match volume.resolve(path)? {
                    Resolved::File { meta, .. } => meta,
                    Resolved::Root(_) | Resolved::Directory { .. } => {
                        return Err(ToolError::NotAFile(path.clone()));
                    }
                };
                let content = volume.read_file(&meta)?;
                fs::write(output, &content).map_err(|source| ToolError::Output {
                    path: output.clone(),
                    source,
                })?;
                info!("Copied {} bytes from {path} to {}", content.len(), output.display());
                String::new()
            }
            Self::Put { source, dest, .. } => {
                let content = fs::read(source).map_err(|err| ToolError::SourceUnreadable {
                    path: source.clone(),
                    source: err,
                })?;
                let (parent, name) = volume.prepare_parent(dest, &SystemClock)?;
                let written = volume.write_file(parent, name, &content, &SystemClock)?;
                drop(volume);

                fs::write(image_path, &image).map_err(|source| ToolError::Image {
                    path: image_path.to_path_buf(),
                    source,
                })?;
                info!(
                    "Copied {} bytes to {dest} ({} blocks from block {})",
                    content.len(),
                    written.block_count,
                    written.start_block
                );
                String::new()
            }
        };

        out.write_all(report.as_bytes())
            .map_err(|source| ToolError::Output {
                path: PathBuf::from("<stdout>"),
                source,
            })
    }
}

fn render_info(header: &VolumeHeader, space: &FreeSpace) -> String {
    format!(
        "Super block information\n\
         Identifier: {}\n\
         Block size: {}\n\
         Block count: {}\n\
         FAT starts: {}\n\
         FAT blocks: {}\n\
         Root directory starts: {}\n\
         Root directory blocks: {}\n\
         \n\
         FAT information\n\
         Free blocks: {}\n\
         Reserved blocks: {}\n\
         Allocated blocks: {}\n",
        header.identifier(),
        header.block_size(),
        header.block_count(),
        header.fat_start(),
        header.fat_blocks(),
        header.root_dir_start(),
        header.root_dir_blocks(),
        space.free,
        space.reserved,
        space.allocated,
    )
}

fn render_entry(kind: char, meta: &EntryMeta) -> String {
    format!(
        "{kind} {:>10} {:>30} {}",
        meta.size(),
        meta.name().to_string(),
        meta.created()
    )
}

fn render_list(entries: &[(usize, DirEntry)]) -> String {
    entries
        .iter()
        .filter_map(|(slot, entry)| match entry {
            DirEntry::File(meta) => Some(render_entry('F', meta)),
            DirEntry::Directory(meta) => Some(render_entry('D', meta)),
            DirEntry::Unrecognised { status } => Some(format!("? slot {slot}: status {status:#04x}")),
            DirEntry::Empty => None,
        })
        .map(|line| line + "\n")
        .collect()
}
