//! Classification of directory entries and the per-entry backup decision.

use filetime::FileTime;
use std::ffi::OsString;
use std::fs::Metadata;

/// Kind of a filesystem object met during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, sockets, fifos, devices. Never backed up.
    Other,
}

impl EntryKind {
    /// Classifies without following symlinks when given `symlink_metadata`.
    pub fn of(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Other
        }
    }
}

/// One filesystem object discovered while walking a source directory.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: OsString,
    pub kind: EntryKind,
    pub modified: FileTime,
    pub accessed: FileTime,
    pub mode: u32,
    pub size: u64,
}

impl FileEntry {
    pub fn from_metadata(name: impl Into<OsString>, meta: &Metadata) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::of(meta),
            modified: FileTime::from_last_modification_time(meta),
            accessed: FileTime::from_last_access_time(meta),
            mode: permission_bits(meta),
            size: meta.len(),
        }
    }
}

/// What to do with a single source entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupDecision {
    /// Descend into a subdirectory, creating its counterpart first when
    /// `create` is set.
    Recurse { create: bool },
    SkipUpToDate,
    CopyNew,
    CopyModified,
    Unsupported,
}

/// Decides from the entry kind and the modification time of the comparison
/// destination, `None` when the destination does not exist.
///
/// A destination is up to date when its mtime is at least the source's.
/// Times are compared in whole seconds so backups on filesystems that drop
/// the sub-second part still count as current.
pub fn decide(
    kind: EntryKind,
    source_mtime: FileTime,
    dest_mtime: Option<FileTime>,
) -> BackupDecision {
    match kind {
        EntryKind::Dir => BackupDecision::Recurse {
            create: dest_mtime.is_none(),
        },
        EntryKind::File => match dest_mtime {
            None => BackupDecision::CopyNew,
            Some(dest) if dest.unix_seconds() >= source_mtime.unix_seconds() => {
                BackupDecision::SkipUpToDate
            }
            Some(_) => BackupDecision::CopyModified,
        },
        EntryKind::Other => BackupDecision::Unsupported,
    }
}

#[cfg(unix)]
pub(crate) fn permission_bits(meta: &Metadata) -> u32 {
    use crate::constants::MODE_MASK;
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & MODE_MASK
}

#[cfg(not(unix))]
pub(crate) fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}
