//! Command-line interface definition for dirbackup.
//!
//! This module defines the CLI arguments and dispatches a backup to the file
//! or directory engine depending on what the source and destination are.

use crate::application::{self, Settings};
use crate::entry::EntryKind;
use crate::sync::{Backup, Options};
use crate::sysexits;
use anyhow::anyhow;
use clap::Parser;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Command-line interface definition for dirbackup.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Compress every copied file with gzip.
    #[arg(short = 'g', long = "gzip")]
    pub gzip: bool,
    /// Print traversal details.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Only print warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
    /// Use this configuration file instead of the default one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print the configuration file path and the effective settings.
    #[arg(long, conflicts_with_all = ["source", "destination", "gzip"])]
    pub show_config: bool,
    /// Source file or directory.
    #[arg(required_unless_present = "show_config", requires = "destination")]
    pub source: Option<PathBuf>,
    /// Destination file or directory.
    #[arg(required_unless_present = "show_config")]
    pub destination: Option<PathBuf>,
}

/// Runs the command described by `cli` and returns the process exit code.
///
/// # Errors
/// Returns an error if the settings cannot be loaded.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    let settings = Settings::load(cli.config.as_deref())?;
    if cli.show_config {
        show_config(cli.config.as_deref(), &settings)?;
        return Ok(sysexits::EX_OK);
    }
    let (Some(source), Some(destination)) = (cli.source, cli.destination) else {
        return Err(anyhow!("Both a source and a destination are required."));
    };

    let options = Options {
        compress: cli.gzip,
        buffer_size: settings.buffer_size,
    };
    let backup = Backup::new(options, settings.compressor());
    Ok(backup_paths(&backup, &source, &destination))
}

/// Backs up `source` to `destination` and returns the exit code.
///
/// A missing destination is assumed to be of the same kind as the source.
/// Only file-to-file and directory-to-directory backups are supported.
pub fn backup_paths(backup: &Backup, source: &Path, destination: &Path) -> i32 {
    let source_kind = match fs::metadata(source) {
        Ok(meta) => EntryKind::of(&meta),
        Err(e) => {
            eprintln!("Problem with source '{}': {e}", source.display());
            return sysexits::EX_NOINPUT;
        }
    };
    let dest_kind = match fs::metadata(destination) {
        Ok(meta) => EntryKind::of(&meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => source_kind,
        Err(e) => {
            eprintln!("Problem with destination '{}': {e}", destination.display());
            return sysexits::EX_IOERR;
        }
    };

    match (source_kind, dest_kind) {
        (EntryKind::File, EntryKind::File) => match backup.backup_file(source, destination) {
            Ok(outcome) => {
                tracing::info!(
                    "File '{}' backed up to '{}'",
                    source.display(),
                    outcome.artifact.display()
                );
                sysexits::EX_OK
            }
            Err(e) => {
                tracing::error!("{e}");
                sysexits::EX_COPY_FAILED
            }
        },
        (EntryKind::Dir, EntryKind::Dir) => match backup.run(source, destination) {
            Ok(report) => {
                tracing::info!("Done: {report}");
                sysexits::EX_OK
            }
            Err(e) => {
                tracing::error!("{e}");
                sysexits::EX_FAILURE
            }
        },
        (EntryKind::Dir, EntryKind::File) => {
            eprintln!(
                "Cannot back up directory '{}' into file '{}'",
                source.display(),
                destination.display()
            );
            sysexits::EX_FAILURE
        }
        _ => {
            eprintln!("These types of files are unsupported");
            sysexits::EX_FAILURE
        }
    }
}

fn show_config(path: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => application::config_file()?,
    };
    println!("config file: {}", path.display());
    print!("{}", settings.to_toml()?);
    Ok(())
}
