use crate::constants::GZ_SUFFIX;
use crate::error::MaterializeError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns `path` with the compressed-artifact suffix appended to its last
/// component, e.g. `notes.txt` becomes `notes.txt.gz`.
pub fn compressed_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(GZ_SUFFIX);
    PathBuf::from(s)
}

/// Creates a single directory with exactly `mode` permission bits,
/// regardless of the process umask.
pub fn create_dir(path: &Path, mode: u32) -> io::Result<()> {
    fs::create_dir(path)?;
    set_mode(path, mode)
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Ensures `path` exists as a directory, creating missing ancestors first.
///
/// The missing ancestors are collected once, then created shallowest first,
/// each with `mode`. An `AlreadyExists` error on `path` itself is reported as
/// [`MaterializeError::Create`]; callers are expected to check first.
///
/// # Errors
/// * [`MaterializeError::NoParent`] when `path` has no parent to create.
/// * [`MaterializeError::Create`] for any other failure.
pub fn ensure_dir(path: &Path, mode: u32) -> Result<(), MaterializeError> {
    let create_err = |p: &Path, source: io::Error| MaterializeError::Create {
        path: p.to_path_buf(),
        source,
    };

    match create_dir(path, mode) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(create_err(path, e)),
    }

    let missing = missing_ancestors(path);
    if missing.is_empty() {
        return Err(MaterializeError::NoParent {
            path: path.to_path_buf(),
        });
    }
    for dir in missing.iter().rev() {
        tracing::debug!("Creating directory '{}'", dir.display());
        match create_dir(dir, mode) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound && dir.parent().is_none() => {
                return Err(MaterializeError::NoParent {
                    path: dir.to_path_buf(),
                });
            }
            Err(e) => return Err(create_err(dir, e)),
        }
    }
    create_dir(path, mode).map_err(|e| create_err(path, e))
}

/// Ancestors of `path` that do not exist yet, deepest first. The empty
/// relative root is never included.
fn missing_ancestors(path: &Path) -> Vec<&Path> {
    path.ancestors()
        .skip(1)
        .filter(|p| !p.as_os_str().is_empty())
        .take_while(|p| fs::symlink_metadata(p).is_err())
        .collect()
}
