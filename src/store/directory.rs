//! Persisted directory of groups and teachers

use std::path::PathBuf;
use std::sync::Mutex;

use super::{load_json, save_json, StoreError};
use crate::data::Directory;

/// Holds the last directory fetched from the provider
pub trait DirectoryStore: Send + Sync {
    /// Replaces all stored groups and teachers
    fn replace(&self, directory: &Directory) -> Result<(), StoreError>;

    fn load(&self) -> Result<Directory, StoreError>;

    fn search_groups(&self, query: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.search_groups(query))
    }

    fn search_teachers(&self, query: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.search_teachers(query))
    }
}

/// Directory kept in one JSON file (`directory.json`)
#[derive(Debug)]
pub struct FileDirectoryStore {
    path: PathBuf,
}

impl FileDirectoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DirectoryStore for FileDirectoryStore {
    fn replace(&self, directory: &Directory) -> Result<(), StoreError> {
        save_json(&self.path, directory)
    }

    fn load(&self) -> Result<Directory, StoreError> {
        load_json(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectoryStore {
    directory: Mutex<Directory>,
}

impl DirectoryStore for MemoryDirectoryStore {
    fn replace(&self, directory: &Directory) -> Result<(), StoreError> {
        *self.directory.lock().unwrap_or_else(|e| e.into_inner()) = directory.clone();
        Ok(())
    }

    fn load(&self) -> Result<Directory, StoreError> {
        Ok(self.directory.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::directory::{EntityId, RawDirectoryEntry};
    use tempfile::TempDir;

    fn directory(names: &[&str]) -> Directory {
        Directory::from_raw(names.iter().enumerate().map(|(i, name)| RawDirectoryEntry {
            id: EntityId::Number(i as i64),
            name: Some(name.to_string()),
        }))
    }

    #[test]
    fn test_empty_store_searches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDirectoryStore::new(temp_dir.path().join("directory.json"));

        assert!(store.search_groups("M").unwrap().is_empty());
        assert_eq!(store.load().unwrap(), Directory::default());
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDirectoryStore::new(temp_dir.path().join("directory.json"));

        store.replace(&directory(&["M-101", "Иванов И.И."])).unwrap();
        store.replace(&directory(&["M-202"])).unwrap();

        assert_eq!(store.search_groups("M-").unwrap(), vec!["M-202"]);
        assert!(store.search_teachers("Иванов").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("directory.json");
        FileDirectoryStore::new(path.clone())
            .replace(&directory(&["M-101", "доц. Петров П.П."]))
            .unwrap();

        let reopened = FileDirectoryStore::new(path);

        assert_eq!(reopened.search_teachers("Петров").unwrap(), vec!["доц. Петров П.П."]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryDirectoryStore::default();

        store.replace(&directory(&["M-101", "ПИ-101"])).unwrap();

        assert_eq!(store.search_groups("101").unwrap(), vec!["M-101", "ПИ-101"]);
    }
}
