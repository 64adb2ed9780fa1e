//! Recursive mirroring of a source directory into a destination directory.
//!
//! Each level lists the source, compares every entry with its destination
//! counterpart and either recurses, skips, or copies. Only failures to open
//! or create the directories of a level abort that level; everything else is
//! recorded in the [`Report`] and the walk moves on to the next entry.

use crate::compress::Compressor;
use crate::constants::BUF_SIZE;
use crate::entry::{BackupDecision, EntryKind, FileEntry, decide, permission_bits};
use crate::error::{CopyError, EntryError, TreeError};
use crate::file_util::{self, CopyOutcome};
use crate::path_util::{self, compressed_path, ensure_dir};
use crate::report::{CopyReason, Event, Report};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Compress every copied file and look for `.gz` counterparts.
    pub compress: bool,
    /// Chunk size used when copying file contents.
    pub buffer_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            compress: false,
            buffer_size: BUF_SIZE,
        }
    }
}

/// Source and destination of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub source: PathBuf,
    /// Where the copy is written.
    pub dest: PathBuf,
    /// Where an existing backup is looked for. Differs from `dest` only
    /// for compressed files.
    pub compare: PathBuf,
}

impl PathPair {
    pub fn new(source_dir: &Path, dest_dir: &Path, entry: &FileEntry, compress: bool) -> Self {
        let dest = dest_dir.join(&entry.name);
        let compare = if compress && entry.kind != EntryKind::Dir {
            compressed_path(&dest)
        } else {
            dest.clone()
        };
        Self {
            source: source_dir.join(&entry.name),
            dest,
            compare,
        }
    }
}

/// A backup engine: run options plus the compressor used when they ask
/// for compression.
pub struct Backup {
    options: Options,
    compressor: Box<dyn Compressor>,
}

impl Backup {
    pub fn new(options: Options, compressor: Box<dyn Compressor>) -> Self {
        Self {
            options,
            compressor,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Backs up a single regular file, compressing it when enabled.
    pub fn backup_file(&self, source: &Path, dest: &Path) -> Result<CopyOutcome, CopyError> {
        let compressor = self.options.compress.then_some(&*self.compressor);
        file_util::backup_file(source, dest, self.options.buffer_size, compressor)
    }

    /// Mirrors `source_dir` into `dest_dir` and returns what happened.
    ///
    /// # Errors
    /// Only failures to open or create the top-level directories are
    /// returned; failures below are in the report.
    pub fn run(&self, source_dir: &Path, dest_dir: &Path) -> Result<Report, TreeError> {
        let mut report = Report::new();
        self.sync_tree(source_dir, dest_dir, &mut report)?;
        Ok(report)
    }

    /// Synchronizes one directory level and recurses into subdirectories.
    pub fn sync_tree(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        report: &mut Report,
    ) -> Result<(), TreeError> {
        let listing = fs::read_dir(source_dir).map_err(|source| TreeError::OpenSourceDir {
            path: source_dir.to_path_buf(),
            source,
        })?;
        let source_meta = fs::metadata(source_dir).map_err(|source| TreeError::SourceStat {
            path: source_dir.to_path_buf(),
            source,
        })?;
        self.open_dest_dir(dest_dir, permission_bits(&source_meta), report)?;

        let mut names = Vec::new();
        for item in listing {
            match item {
                Ok(item) => names.push(item.file_name()),
                Err(e) => report.record(Event::Failed {
                    source: source_dir.to_path_buf(),
                    error: EntryError::List {
                        path: source_dir.to_path_buf(),
                        source: e,
                    },
                }),
            }
        }
        names.sort();
        tracing::debug!(
            "Scanning '{}' ({} entries)",
            source_dir.display(),
            names.len()
        );

        for name in names {
            let source = source_dir.join(&name);
            let meta = match fs::symlink_metadata(&source) {
                Ok(meta) => meta,
                Err(e) => {
                    report.record(Event::Failed {
                        source: source.clone(),
                        error: EntryError::Stat { path: source, source: e },
                    });
                    continue;
                }
            };
            let entry = FileEntry::from_metadata(name, &meta);
            let pair = PathPair::new(source_dir, dest_dir, &entry, self.options.compress);
            self.sync_entry(&entry, &pair, report);
        }
        Ok(())
    }

    /// Checks that `dest_dir` is a usable directory, creating it with its
    /// ancestors when missing.
    fn open_dest_dir(
        &self,
        dest_dir: &Path,
        mode: u32,
        report: &mut Report,
    ) -> Result<(), TreeError> {
        match fs::metadata(dest_dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(TreeError::DestDir {
                path: dest_dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                ensure_dir(dest_dir, mode)?;
                report.record(Event::DirCreated {
                    path: dest_dir.to_path_buf(),
                });
                Ok(())
            }
            Err(source) => Err(TreeError::DestDir {
                path: dest_dir.to_path_buf(),
                source,
            }),
        }
    }

    fn sync_entry(&self, entry: &FileEntry, pair: &PathPair, report: &mut Report) {
        let counterpart = match fs::metadata(&pair.compare) {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                report.record(Event::Failed {
                    source: pair.source.clone(),
                    error: EntryError::Stat {
                        path: pair.compare.clone(),
                        source: e,
                    },
                });
                return;
            }
        };
        if entry.kind == EntryKind::File && counterpart.as_ref().is_some_and(|m| m.is_dir()) {
            report.record(Event::Failed {
                source: pair.source.clone(),
                error: EntryError::DestIsDir {
                    path: pair.compare.clone(),
                },
            });
            return;
        }

        let dest_mtime = counterpart
            .as_ref()
            .map(FileTime::from_last_modification_time);
        match decide(entry.kind, entry.modified, dest_mtime) {
            BackupDecision::Recurse { create } => self.sync_subdir(entry, pair, create, report),
            BackupDecision::SkipUpToDate => report.record(Event::UpToDate {
                source: pair.source.clone(),
            }),
            BackupDecision::CopyNew => self.copy_entry(pair, CopyReason::New, report),
            BackupDecision::CopyModified => {
                tracing::info!(
                    "File '{}' has been modified, making a new backup...",
                    pair.source.display()
                );
                if let Err(e) = fs::remove_file(&pair.compare) {
                    if e.kind() != io::ErrorKind::NotFound {
                        report.record(Event::Failed {
                            source: pair.source.clone(),
                            error: EntryError::Remove {
                                path: pair.compare.clone(),
                                source: e,
                            },
                        });
                        return;
                    }
                }
                self.copy_entry(pair, CopyReason::Modified, report);
            }
            BackupDecision::Unsupported => report.record(Event::Unsupported {
                source: pair.source.clone(),
            }),
        }
    }

    fn sync_subdir(&self, entry: &FileEntry, pair: &PathPair, create: bool, report: &mut Report) {
        if create {
            if let Err(e) = path_util::create_dir(&pair.dest, entry.mode) {
                report.record(Event::Failed {
                    source: pair.source.clone(),
                    error: EntryError::CreateDir {
                        path: pair.dest.clone(),
                        source: e,
                    },
                });
                return;
            }
            report.record(Event::DirCreated {
                path: pair.dest.clone(),
            });
        }
        if let Err(e) = self.sync_tree(&pair.source, &pair.dest, report) {
            report.record(Event::Failed {
                source: pair.source.clone(),
                error: e.into(),
            });
        }
    }

    fn copy_entry(&self, pair: &PathPair, reason: CopyReason, report: &mut Report) {
        let event = match self.backup_file(&pair.source, &pair.dest) {
            Ok(outcome) => Event::Copied {
                source: pair.source.clone(),
                artifact: outcome.artifact,
                reason,
                bytes: outcome.bytes,
            },
            Err(e) => Event::Failed {
                source: pair.source.clone(),
                error: e.into(),
            },
        };
        report.record(event);
    }
}
