use crate::compress::Compressor;
use crate::entry::permission_bits;
use crate::error::{CopyError, DataError};
use filetime::FileTime;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Result of backing up one regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// The file left on disk: the destination, or its `.gz` artifact.
    pub artifact: PathBuf,
    /// Number of bytes copied from the source.
    pub bytes: u64,
    /// Whether the source access/modification times were applied.
    pub times_preserved: bool,
}

/// Copies everything from `reader` into `writer`, `buf_size` bytes at a time.
///
/// Each chunk is written completely before the next read. Any failure aborts
/// the copy and leaves `writer` holding whatever was written so far.
///
/// # Errors
/// [`DataError::Read`] if reading fails, [`DataError::Write`] if writing
/// fails or the writer stops accepting bytes.
pub fn copy_data<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buf_size: usize,
) -> Result<u64, DataError> {
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut total = 0u64;
    loop {
        let count = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DataError::Read(e)),
        };
        writer.write_all(&buf[..count]).map_err(DataError::Write)?;
        total += count as u64;
    }
    Ok(total)
}

/// Backs up the regular file `source` to `dest`.
///
/// The destination is created or truncated with the source's permission
/// bits and receives its access and modification times. The parent of
/// `dest` must already exist. When a `compressor` is given the copy is
/// compressed afterwards and only the `.gz` artifact remains.
///
/// # Errors
/// Returns a [`CopyError`] naming the step that failed. A destination whose
/// data copy failed is left truncated and without the source timestamps.
pub fn backup_file(
    source: &Path,
    dest: &Path,
    buf_size: usize,
    compressor: Option<&dyn Compressor>,
) -> Result<CopyOutcome, CopyError> {
    tracing::info!("Copying {}", source.display());
    let (bytes, times_preserved) = copy_contents(source, dest, buf_size)?;

    let artifact = match compressor {
        Some(compressor) => compressor.compress(dest)?,
        None => dest.to_path_buf(),
    };
    Ok(CopyOutcome {
        artifact,
        bytes,
        times_preserved,
    })
}

/// Copies content, permissions and times. Both handles are closed on return.
fn copy_contents(source: &Path, dest: &Path, buf_size: usize) -> Result<(u64, bool), CopyError> {
    let mut input = File::open(source).map_err(|e| CopyError::OpenSource {
        path: source.to_path_buf(),
        source: e,
    })?;
    let meta = input.metadata().map_err(|e| CopyError::Stat {
        path: source.to_path_buf(),
        source: e,
    })?;
    let mode = permission_bits(&meta);

    let mut output = create_with_mode(dest, mode).map_err(|e| CopyError::OpenDest {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let bytes = copy_data(&mut input, &mut output, buf_size).map_err(|e| CopyError::Data {
        path: source.to_path_buf(),
        source: e,
    })?;

    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    let times_preserved = match filetime::set_file_handle_times(&output, Some(atime), Some(mtime))
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to set times of '{}': {e}", dest.display());
            false
        }
    };
    Ok((bytes, times_preserved))
}

/// Opens `path` for writing, truncating it, and forces its permission bits
/// to `mode` whatever the umask or the previous file's mode.
#[cfg(unix)]
fn create_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(mode))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    if mode & 0o222 == 0 {
        let mut perms = file.metadata()?.permissions();
        perms.set_readonly(true);
        file.set_permissions(perms)?;
    }
    Ok(file)
}
