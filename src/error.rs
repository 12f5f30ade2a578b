use flatfs_storage::FsError;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for the command-line tools
pub enum ToolError {
    #[error("{0}")]
    Usage(String),
    #[error("Cannot access image {}: {source}", path.display())]
    Image { path: PathBuf, source: io::Error },
    #[error("Cannot read source file {}: {source}", path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },
    #[error("Cannot write {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
    #[error("Not a file: {0}")]
    NotAFile(String),
    #[error(transparent)]
    Fs(#[from] FsError),
}

pub type ToolResult<T> = Result<T, ToolError>;
