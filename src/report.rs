//! Outcome of a tree synchronization, one event per decision taken.
//!
//! Every recorded event is also logged, so the report and the log output
//! never disagree. A run can return `Ok` while the report holds failures.

use crate::error::EntryError;
use std::fmt;
use std::path::PathBuf;

/// Why a file was copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyReason {
    New,
    Modified,
}

/// Something that happened to one source entry.
#[derive(Debug)]
pub enum Event {
    DirCreated {
        path: PathBuf,
    },
    Copied {
        source: PathBuf,
        artifact: PathBuf,
        reason: CopyReason,
        bytes: u64,
    },
    UpToDate {
        source: PathBuf,
    },
    Unsupported {
        source: PathBuf,
    },
    Failed {
        source: PathBuf,
        error: EntryError,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::DirCreated { path } => write!(f, "Creating directory '{}'", path.display()),
            Event::Copied {
                source,
                artifact,
                reason: CopyReason::New,
                ..
            } => write!(
                f,
                "File '{}' backed up to '{}'",
                source.display(),
                artifact.display()
            ),
            Event::Copied {
                source,
                artifact,
                reason: CopyReason::Modified,
                ..
            } => write!(
                f,
                "File '{}' has been modified, new backup made at '{}'",
                source.display(),
                artifact.display()
            ),
            Event::UpToDate { source } => {
                write!(f, "File '{}' is already backed up", source.display())
            }
            Event::Unsupported { source } => {
                write!(f, "Type of '{}' is unsupported: ignored", source.display())
            }
            Event::Failed { source, error } => {
                write!(f, "Error backing up '{}': {error}", source.display())
            }
        }
    }
}

/// Collected events of one run, in traversal order.
#[derive(Debug, Default)]
pub struct Report {
    events: Vec<Event>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `event` and keeps it.
    pub fn record(&mut self, event: Event) {
        match &event {
            Event::Failed { .. } => tracing::error!("{event}"),
            Event::Unsupported { .. } => tracing::warn!("{event}"),
            _ => tracing::info!("{event}"),
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Files copied, new or modified.
    pub fn copied(&self) -> usize {
        self.count(|e| matches!(e, Event::Copied { .. }))
    }

    pub fn copied_for(&self, reason: CopyReason) -> usize {
        self.count(|e| matches!(e, Event::Copied { reason: r, .. } if *r == reason))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|e| matches!(e, Event::UpToDate { .. }))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|e| matches!(e, Event::Unsupported { .. }))
    }

    pub fn dirs_created(&self) -> usize {
        self.count(|e| matches!(e, Event::DirCreated { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &EntryError)> {
        self.events.iter().filter_map(|e| match e {
            Event::Failed { source, error } => Some((source, error)),
            _ => None,
        })
    }

    pub fn bytes_copied(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match e {
                Event::Copied { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied ({} bytes), {} already backed up, {} unsupported, {} failed",
            self.copied(),
            self.bytes_copied(),
            self.up_to_date(),
            self.unsupported(),
            self.failures().count()
        )
    }
}
