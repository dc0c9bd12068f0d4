//! Durable stores for user selections and the entity directory
//!
//! Both persist a single JSON document in the data directory and rewrite it
//! whole on every change. Memory-backed variants share the same traits.

pub mod directory;
pub mod selection;

pub use directory::{DirectoryStore, FileDirectoryStore, MemoryDirectoryStore};
pub use selection::{FileSelectionStore, MemorySelectionStore, SelectionStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when reading or writing a store file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Reads a JSON file, returning the default value when it does not exist yet
fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes a JSON file, creating its parent directory if needed
fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
