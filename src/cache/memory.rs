//! In-process cache backed by a map

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{is_expired, CacheError, CacheStore, CachedData, SCHEDULE_TTL_SECS};
use crate::clock::Clock;
use crate::data::ScheduleDocument;

/// Volatile cache; contents are lost when the process exits
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (ScheduleDocument, i64)>>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl_secs: SCHEDULE_TTL_SECS,
        }
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, name: &str) -> Option<CachedData> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (data, fetched_at) = entries.get(name)?;
        Some(CachedData {
            data: data.clone(),
            fetched_at: *fetched_at,
            is_expired: is_expired(*fetched_at, self.clock.epoch_secs(), self.ttl_secs),
        })
    }

    fn put(&self, name: &str, document: &ScheduleDocument) -> Result<(), CacheError> {
        let now = self.clock.epoch_secs();
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), (document.clone(), now));
        Ok(())
    }
}
