//! Cache manager for persisting schedule documents to disk
//!
//! Provides a `CacheManager` that stores one JSON file per entity name with
//! the Unix time of the fetch, so cached schedules survive a restart.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{is_expired, CacheError, CacheStore, CachedData, SCHEDULE_TTL_SECS};
use crate::clock::Clock;
use crate::data::ScheduleDocument;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Entity name the document belongs to
    name: String,
    /// The cached document
    data: T,
    /// Unix seconds when the document was fetched
    fetched_at: i64,
}

/// Manages reading and writing cached schedules to disk
///
/// Files live in the configured cache directory (`~/.cache/timetable/` on
/// Linux by default). Expired entries are still readable through [`CacheStore::read`]
/// with `is_expired = true`, but [`CacheStore::get`] reports them as a miss.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
}

impl CacheManager {
    /// Creates a new CacheManager with a custom cache directory and clock
    pub fn with_dir(cache_dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir,
            clock,
            ttl_secs: SCHEDULE_TTL_SECS,
        }
    }

    /// Returns the path to a cache file for the given entity name
    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(name)))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }
}

impl CacheStore for CacheManager {
    /// Reads a cache file
    ///
    /// Returns `None` if the file doesn't exist, cannot be parsed, or belongs
    /// to a different name.
    fn read(&self, name: &str) -> Option<CachedData> {
        let path = self.cache_path(name);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<ScheduleDocument> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable cache file treated as miss");
                return None;
            }
        };
        if entry.name != name {
            return None;
        }

        let now = self.clock.epoch_secs();
        Some(CachedData {
            is_expired: is_expired(entry.fetched_at, now, self.ttl_secs),
            data: entry.data,
            fetched_at: entry.fetched_at,
        })
    }

    /// Writes a document, replacing any previous entry for the name
    ///
    /// The entry is written to a temporary file in the cache directory and
    /// renamed over the old one, so readers never see a partial file.
    fn put(&self, name: &str, document: &ScheduleDocument) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            name: name.to_string(),
            data: document,
            fetched_at: self.clock.epoch_secs(),
        };
        let json = serde_json::to_string(&entry)?;

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.cache_path(name)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Maps an entity name to a file stem
///
/// Letters, digits, `-` and `_` are kept (including Cyrillic); every other
/// byte becomes `%XX`, so distinct names never share a file.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    stem
}
