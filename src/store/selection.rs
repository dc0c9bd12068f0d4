//! Which group or teacher each user asked for

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{load_json, save_json, StoreError};

/// Persists the free-text selection of each identity
pub trait SelectionStore: Send + Sync {
    /// Inserts or replaces the selection of `identity`
    fn record(&self, identity: i64, selection: &str) -> Result<(), StoreError>;

    fn lookup(&self, identity: i64) -> Result<Option<String>, StoreError>;

    /// Every identity with a saved selection, ascending
    fn identities(&self) -> Result<Vec<i64>, StoreError>;
}

/// Selections kept in one JSON file (`selections.json`)
#[derive(Debug)]
pub struct FileSelectionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileSelectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<i64, String>, StoreError> {
        load_json(&self.path)
    }
}

impl SelectionStore for FileSelectionStore {
    fn record(&self, identity: i64, selection: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut selections = self.load()?;
        selections.insert(identity, selection.to_string());
        save_json(&self.path, &selections)
    }

    fn lookup(&self, identity: i64) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(&identity))
    }

    fn identities(&self) -> Result<Vec<i64>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.into_keys().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    selections: Mutex<BTreeMap<i64, String>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn record(&self, identity: i64, selection: &str) -> Result<(), StoreError> {
        self.selections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identity, selection.to_string());
        Ok(())
    }

    fn lookup(&self, identity: i64) -> Result<Option<String>, StoreError> {
        Ok(self
            .selections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&identity)
            .cloned())
    }

    fn identities(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .selections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect())
    }
}
