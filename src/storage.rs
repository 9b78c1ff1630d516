//! Local persistence for the prefix cache and presets.
//!
//! Everything lives under a single root directory:
//!
//! ```text
//! <root>/
//!   prefix-cache.json        # { org user: { key prefix: type name } }
//!   presets/<type>.json      # { preset name: { fields, savedAt } }
//! ```
//!
//! Files are small JSON documents rewritten whole; a missing file is an
//! empty document.

mod prefix_cache;
mod presets;

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use presets::Preset;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid type name: {0:?}")]
    InvalidTypeName(String),

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.inspector/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".inspector"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Read a JSON document, or its default when the file doesn't exist.
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match fs::read_to_string(path) {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write a JSON document, creating parent directories as needed.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
