//! Session configuration.
//!
//! # Responsibility
//! - Carry the externally-decided settings a session needs at construction:
//!   database path, asset root, arch mode, background override, undo depth.
//! - Load them from a JSON file with sensible defaults.
//!
//! # Invariants
//! - Configuration is read once at session construction and never mutated
//!   behind a running session's back.

use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::model::element::Arch;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings required to open a design session for one arch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// SQLite layout database location.
    pub db_path: PathBuf,
    /// Root of the image asset tree (`dents/`, `selles/`, `fonds/`).
    pub asset_root: PathBuf,
    /// Which arch this session edits.
    pub arch: Arch,
    /// Explicit background file name; `None` uses the persisted choice or
    /// the catalog default for the arch.
    pub background: Option<String>,
    /// Maximum undo depth per category.
    pub history_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("elements_valides/dental_database.db"),
            asset_root: PathBuf::from("data/images"),
            arch: Arch::Lower,
            background: None,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults, so older config files
    /// keep working after new settings are added.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn for_arch(arch: Arch) -> Self {
        Self {
            arch,
            ..Self::default()
        }
    }
}
