//! Cache module for schedule documents
//!
//! Documents are cached per entity name with a fixed three-hour TTL. A stale
//! entry is never deleted; it reads as a miss and the next successful fetch
//! overwrites it. [`CacheManager`] persists entries to disk so they survive a
//! restart, [`MemoryCache`] keeps them in a map for tests and embedding.

mod manager;
mod memory;

pub use manager::CacheManager;
pub use memory::MemoryCache;

use thiserror::Error;

use crate::data::ScheduleDocument;

/// Seconds a cached schedule stays fresh (3 hours)
pub const SCHEDULE_TTL_SECS: i64 = 10_800;

/// Errors that can occur when writing a cache entry
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A cache entry as stored, regardless of freshness
#[derive(Debug, Clone)]
pub struct CachedData {
    /// The cached document
    pub data: ScheduleDocument,
    /// Unix seconds of the fetch that produced the document
    pub fetched_at: i64,
    /// Whether the entry is older than the TTL
    pub is_expired: bool,
}

/// Key-value store from entity name to schedule document
///
/// `put` is last-writer-wins; no version check is made.
pub trait CacheStore: Send + Sync {
    /// Reads the stored entry for `name`, fresh or not
    fn read(&self, name: &str) -> Option<CachedData>;

    /// Stores `document` for `name` stamped with the current time
    fn put(&self, name: &str, document: &ScheduleDocument) -> Result<(), CacheError>;

    /// Returns the document for `name` only while it is fresh
    fn get(&self, name: &str) -> Option<ScheduleDocument> {
        self.read(name)
            .filter(|cached| !cached.is_expired)
            .map(|cached| cached.data)
    }
}

/// Freshness rule shared by every store
pub(crate) fn is_expired(fetched_at: i64, now: i64, ttl_secs: i64) -> bool {
    now - fetched_at >= ttl_secs
}
