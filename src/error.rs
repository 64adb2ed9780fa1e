//! Error types for every stage of a backup run.
//!
//! Each component reports its own enum so callers can tell a failed read
//! from a failed child process without parsing messages.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while moving bytes from one stream to another.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write: {0}")]
    Write(#[source] io::Error),
}

/// Failure while backing up a single regular file.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("failed to open source '{}': {source}", .path.display())]
    OpenSource { path: PathBuf, source: io::Error },
    #[error("failed to stat '{}': {source}", .path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("failed to open/create destination '{}': {source}", .path.display())]
    OpenDest { path: PathBuf, source: io::Error },
    #[error("failed to copy '{}': {source}", .path.display())]
    Data { path: PathBuf, source: DataError },
    #[error(transparent)]
    Compress(#[from] CompressError),
}

/// Failure while compressing a freshly written backup.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn { program: String, source: io::Error },
    #[error("error while zipping '{}', exit code: {}", .path.display(), display_code(.code))]
    ChildExit { path: PathBuf, code: Option<i32> },
    #[error("failed to compress '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "killed by signal".to_string(),
    }
}

/// Failure while creating a destination directory chain.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("cannot create '{}': no parent directory to create", .path.display())]
    NoParent { path: PathBuf },
    #[error("failed to create directory '{}': {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },
}

/// Failure that aborts one level of the tree synchronization.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to open directory '{}': {source}", .path.display())]
    OpenSourceDir { path: PathBuf, source: io::Error },
    #[error("failed to get stats of '{}': {source}", .path.display())]
    SourceStat { path: PathBuf, source: io::Error },
    #[error("failed to open destination directory '{}': {source}", .path.display())]
    DestDir { path: PathBuf, source: io::Error },
    #[error(transparent)]
    CreateDestDir(#[from] MaterializeError),
}

/// Failure confined to a single directory entry. Recorded in the report,
/// never propagated past the directory being processed.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("failed to list directory '{}': {source}", .path.display())]
    List { path: PathBuf, source: io::Error },
    #[error("failed to stat '{}': {source}", .path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("failed to remove stale backup '{}': {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
    #[error("failed to create directory '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("destination '{}' is a directory", .path.display())]
    DestIsDir { path: PathBuf },
    #[error(transparent)]
    Copy(#[from] CopyError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
