//! Persistent settings for this application.
//!
//! Settings live in a TOML file under the platform configuration directory.
//! A missing file means defaults; the file is never created implicitly.

use crate::compress::{BuiltinGzip, Compressor, ExternalCompressor};
use crate::constants::{BUF_SIZE, CONFIG_NAME, PKG_NAME};
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which [`Compressor`] implementation backs the `-g` flag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressorKind {
    /// Spawn `program` with `args` followed by the file path.
    #[default]
    External,
    /// Compress in-process with `level`.
    Builtin,
}

/// Application settings, as stored in `config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Chunk size used when copying file contents.
    pub buffer_size: usize,
    pub compressor: CompressorKind,
    /// External compression program.
    pub program: String,
    /// Arguments passed to `program` before the file path.
    pub args: Vec<String>,
    /// Gzip level for the builtin compressor, 0-9.
    pub level: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            buffer_size: BUF_SIZE,
            compressor: CompressorKind::External,
            program: "gzip".to_string(),
            args: vec!["-f".to_string()],
            level: 6,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from the default configuration file
    /// when `path` is `None`.
    ///
    /// # Errors
    /// Fails if an explicitly given file is missing, if the file cannot be
    /// read or parsed, or if it holds invalid values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let settings = match path {
            Some(path) => read_settings(path)?,
            None => {
                let path = config_file()?;
                if path.exists() {
                    read_settings(&path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.buffer_size == 0 {
            bail!("buffer_size must be greater than 0");
        }
        if self.level > 9 {
            bail!("level must be between 0 and 9, got {}", self.level);
        }
        if self.compressor == CompressorKind::External && self.program.trim().is_empty() {
            bail!("program must not be empty when the external compressor is used");
        }
        Ok(())
    }

    /// Builds the compressor these settings describe.
    pub fn compressor(&self) -> Box<dyn Compressor> {
        match self.compressor {
            CompressorKind::External => Box::new(ExternalCompressor::new(
                self.program.clone(),
                self.args.clone(),
            )),
            CompressorKind::Builtin => Box::new(BuiltinGzip::new(self.level)),
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Returns the absolute path to the configuration file.
pub fn config_file() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Couldn't get the configuration directory")?;
    Ok(config_dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> anyhow::Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Couldn't get the home directory")?;
    Ok(home_dir.join(".config").join(PKG_NAME))
}

fn read_settings(path: &Path) -> anyhow::Result<Settings> {
    let toml_str = fs::read_to_string(path)
        .with_context(|| format!("Error reading config file '{}'", path.display()))?;
    toml::from_str(&toml_str)
        .with_context(|| format!("Error parsing config file '{}'", path.display()))
}
