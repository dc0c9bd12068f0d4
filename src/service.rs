//! Cache-then-fetch lookup of schedule documents

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::data::{FetchError, ScheduleDocument, ScheduleSource};

/// Serves schedules from the cache and refills it from the provider on a miss
///
/// There is no in-flight de-duplication: concurrent misses for one name each
/// fetch, and the last write wins.
#[derive(Clone)]
pub struct ScheduleService {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn ScheduleSource>,
}

impl ScheduleService {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn ScheduleSource>) -> Self {
        Self { cache, source }
    }

    /// Returns the schedule for `name`
    ///
    /// # Behavior
    /// - A fresh cache entry is returned without a network call
    /// - Otherwise the provider is asked once; a success is written to the cache
    /// - A provider failure is returned as-is; the cache is left untouched and
    ///   a stale entry is never used as a fallback
    pub async fn get_schedule(&self, name: &str) -> Result<ScheduleDocument, FetchError> {
        if let Some(document) = self.cache.get(name) {
            debug!(%name, "schedule served from cache");
            return Ok(document);
        }

        debug!(%name, "cache miss");
        let document = match self.source.fetch(name).await {
            Ok(document) => document,
            Err(e) => {
                warn!(%name, error = %e, "schedule fetch failed");
                return Err(e);
            }
        };

        if let Err(e) = self.cache.put(name, &document) {
            warn!(%name, error = %e, "failed to write schedule cache");
        }
        Ok(document)
    }

    /// Loads several schedules concurrently, filling the cache
    ///
    /// Returns how many names were loaded successfully.
    pub async fn warm(&self, names: &[String]) -> usize {
        let results = join_all(names.iter().map(|name| self.get_schedule(name))).await;
        let loaded = results.iter().filter(|r| r.is_ok()).count();
        info!(requested = names.len(), loaded, "cache warm-up finished");
        loaded
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::{MemoryCache, SCHEDULE_TTL_SECS};
    use crate::clock::ManualClock;
    use crate::data::fixtures::{day, document, lesson, pair};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider double with per-name scripted answers and a call counter
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        documents: Mutex<HashMap<String, ScheduleDocument>>,
        failing: Mutex<HashMap<String, u16>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn serving(name: &str, document: ScheduleDocument) -> Self {
            let source = Self::default();
            source.serve(name, document);
            source
        }

        pub(crate) fn serve(&self, name: &str, document: ScheduleDocument) {
            self.failing.lock().unwrap().remove(name);
            self.documents.lock().unwrap().insert(name.to_string(), document);
        }

        pub(crate) fn fail(&self, name: &str, status: u16) {
            self.failing.lock().unwrap().insert(name.to_string(), status);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduleSource for ScriptedSource {
        async fn fetch(&self, name: &str) -> Result<ScheduleDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.failing.lock().unwrap().get(name) {
                return Err(FetchError::Status(*status));
            }
            self.documents
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or(FetchError::Status(404))
        }
    }

    pub(crate) fn sample(subject: &str) -> ScheduleDocument {
        document(vec![vec![day(
            "Sunday",
            "01.06.2025",
            vec![pair("09:00", "10:30", vec![lesson(subject, "301", "A. Ivanov")])],
        )]])
    }

    fn setup(source: ScriptedSource) -> (ScheduleService, Arc<MemoryCache>, Arc<ScriptedSource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        let source = Arc::new(source);
        let service = ScheduleService::new(cache.clone(), source.clone());
        (service, cache, source, clock)
    }

    #[tokio::test]
    async fn test_second_lookup_within_ttl_is_served_from_cache() {
        let (service, _cache, source, clock) = setup(ScriptedSource::serving("M-101", sample("Algorithms")));

        let first = service.get_schedule("M-101").await.unwrap();
        clock.advance(SCHEDULE_TTL_SECS - 1);
        let second = service.get_schedule("M-101").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_exactly_one_refetch() {
        let (service, cache, source, clock) = setup(ScriptedSource::serving("M-101", sample("Algorithms")));

        service.get_schedule("M-101").await.unwrap();
        let first_stamp = cache.read("M-101").unwrap().fetched_at;

        clock.advance(SCHEDULE_TTL_SECS);
        source.serve("M-101", sample("Databases"));
        let refreshed = service.get_schedule("M-101").await.unwrap();
        service.get_schedule("M-101").await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed, sample("Databases"));
        assert_eq!(cache.read("M-101").unwrap().fetched_at, first_stamp + SCHEDULE_TTL_SECS);
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_cache_unchanged() {
        let source = ScriptedSource::default();
        source.fail("M-101", 503);
        let (service, cache, _source, _clock) = setup(source);

        let result = service.get_schedule("M-101").await;

        assert!(matches!(result, Err(FetchError::Status(503))));
        assert!(cache.read("M-101").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refetch_does_not_fall_back_to_stale_entry() {
        let (service, cache, source, clock) = setup(ScriptedSource::serving("M-101", sample("Algorithms")));
        service.get_schedule("M-101").await.unwrap();
        let stamp = cache.read("M-101").unwrap().fetched_at;

        clock.advance(SCHEDULE_TTL_SECS + 60);
        source.fail("M-101", 500);
        let result = service.get_schedule("M-101").await;

        assert!(result.is_err(), "stale data must not be served");
        let stale = cache.read("M-101").expect("stale entry is kept");
        assert!(stale.is_expired);
        assert_eq!(stale.fetched_at, stamp);
        assert_eq!(stale.data, sample("Algorithms"));
    }

    #[tokio::test]
    async fn test_names_are_cached_independently() {
        let source = ScriptedSource::serving("M-101", sample("Algorithms"));
        source.serve("M-102", sample("Databases"));
        let (service, _cache, source, _clock) = setup(source);

        assert_eq!(service.get_schedule("M-101").await.unwrap(), sample("Algorithms"));
        assert_eq!(service.get_schedule("M-102").await.unwrap(), sample("Databases"));
        assert_eq!(service.get_schedule("M-101").await.unwrap(), sample("Algorithms"));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_warm_counts_successes() {
        let source = ScriptedSource::serving("M-101", sample("Algorithms"));
        source.fail("M-102", 502);
        let (service, cache, _source, _clock) = setup(source);

        let loaded = service
            .warm(&["M-101".to_string(), "M-102".to_string()])
            .await;

        assert_eq!(loaded, 1);
        assert!(cache.get("M-101").is_some());
        assert!(cache.get("M-102").is_none());
    }
}
