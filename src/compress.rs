//! Compression of freshly written backups.
//!
//! A [`Compressor`] replaces `path` with `path.gz` and returns the new path.
//! The default shells out to `gzip -f`, [`BuiltinGzip`] does the same work
//! in-process for hosts without a gzip binary.

use crate::error::CompressError;
use crate::path_util::compressed_path;
use filetime::FileTime;
use flate2::{Compression, write::GzEncoder};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Compresses a file in place, leaving only the `.gz` artifact behind.
pub trait Compressor {
    fn compress(&self, path: &Path) -> Result<PathBuf, CompressError>;
}

/// Runs an external gzip-compatible program and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ExternalCompressor {
    program: String,
    args: Vec<String>,
}

impl ExternalCompressor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for ExternalCompressor {
    fn default() -> Self {
        Self::new("gzip", vec!["-f".to_string()])
    }
}

impl Compressor for ExternalCompressor {
    fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
        tracing::info!("Zipping {}", path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|source| CompressError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(CompressError::ChildExit {
                path: path.to_path_buf(),
                code: status.code(),
            });
        }
        Ok(compressed_path(path))
    }
}

/// In-process gzip. Like `gzip`, the artifact keeps the original's
/// permission bits and timestamps.
#[derive(Debug, Clone)]
pub struct BuiltinGzip {
    level: Compression,
}

impl BuiltinGzip {
    /// `level` is clamped to the 0-9 range gzip accepts.
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for BuiltinGzip {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for BuiltinGzip {
    fn compress(&self, path: &Path) -> Result<PathBuf, CompressError> {
        tracing::info!("Zipping {}", path.display());
        let io_err = |source: io::Error| CompressError::Io {
            path: path.to_path_buf(),
            source,
        };
        let gz = compressed_path(path);

        let src = File::open(path).map_err(io_err)?;
        let meta = src.metadata().map_err(io_err)?;
        let mut reader = BufReader::new(src);
        let file = File::create(&gz).map_err(io_err)?;
        let mut encoder = GzEncoder::new(file, self.level);
        io::copy(&mut reader, &mut encoder).map_err(io_err)?;
        let file = encoder.finish().map_err(io_err)?;

        file.set_permissions(meta.permissions()).map_err(io_err)?;
        let atime = FileTime::from_last_access_time(&meta);
        let mtime = FileTime::from_last_modification_time(&meta);
        filetime::set_file_handle_times(&file, Some(atime), Some(mtime)).map_err(io_err)?;
        drop(file);
        drop(reader);

        fs::remove_file(path).map_err(io_err)?;
        Ok(gz)
    }
}
