//! Request flow for the conversational front end
//!
//! A period request runs: period keyword -> rate limiter -> saved selection
//! -> cached or fetched schedule -> rendered text. Every failure maps to a
//! [`ScheduleError`] whose [`reply`](ScheduleError::reply) is the text shown
//! to the user.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::data::directory::is_valid_name;
use crate::data::FetchError;
use crate::limiter::RateLimiter;
use crate::query::{self, Period, QueryError};
use crate::service::ScheduleService;
use crate::store::{SelectionStore, StoreError};

/// Errors surfaced to the person asking for a schedule
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Unrecognized period: '{0}'")]
    UnrecognizedPeriod(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("No group or teacher selected")]
    NoSelection,

    #[error("Invalid group or teacher name: '{0}'")]
    InvalidSelection(String),

    #[error("Schedule provider unavailable: {0}")]
    Unavailable(#[from] FetchError),

    #[error("Malformed schedule document: {0}")]
    MalformedDocument(QueryError),

    #[error("Selection store failed: {0}")]
    Store(#[from] StoreError),
}

impl From<QueryError> for ScheduleError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::UnrecognizedPeriod(keyword) => ScheduleError::UnrecognizedPeriod(keyword),
            other => ScheduleError::MalformedDocument(other),
        }
    }
}

impl ScheduleError {
    /// Text to send back to the user
    pub fn reply(&self) -> String {
        match self {
            ScheduleError::UnrecognizedPeriod(_) => format!(
                "Unknown period. Choose one of: {}.",
                keyword_list()
            ),
            ScheduleError::RateLimited => "Please wait before the next request.".to_string(),
            ScheduleError::NoSelection => "Enter a group or teacher name first.".to_string(),
            ScheduleError::InvalidSelection(_) => {
                "That does not look like a group or teacher name.".to_string()
            }
            // a broken document is as useless to the user as a failed fetch
            ScheduleError::Unavailable(_) | ScheduleError::MalformedDocument(_) => {
                "Could not retrieve schedule data. Check the group or teacher name.".to_string()
            }
            ScheduleError::Store(_) => "Something went wrong, please try again later.".to_string(),
        }
    }
}

fn keyword_list() -> String {
    Period::ALL
        .iter()
        .map(|p| p.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trims and validates a free-text selection
pub fn normalize_selection(text: &str) -> Result<String, ScheduleError> {
    let selection = text.trim();
    if !is_valid_name(selection) {
        return Err(ScheduleError::InvalidSelection(selection.to_string()));
    }
    Ok(selection.to_string())
}

/// Period menu shown after a selection is saved or restored
pub fn period_menu() -> String {
    Period::ALL
        .iter()
        .map(|p| format!("  {:<9} {}", p.keyword(), p.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Confirmation sent after a selection is saved
pub fn selection_saved(selection: &str) -> String {
    format!(
        "Group/teacher saved: {}\nChoose a period:\n{}",
        selection,
        period_menu()
    )
}

/// Notice sent to a user after a restart
pub fn restart_notice(selection: &str) -> String {
    format!(
        "The bot was restarted. Your selection is kept: {}\nChoose a period:\n{}",
        selection,
        period_menu()
    )
}

/// Entry point for user requests
pub struct ScheduleBot {
    service: ScheduleService,
    selections: Arc<dyn SelectionStore>,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
}

impl ScheduleBot {
    pub fn new(
        service: ScheduleService,
        selections: Arc<dyn SelectionStore>,
        limiter: RateLimiter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service,
            selections,
            limiter,
            clock,
        }
    }

    /// Saves the group or teacher `identity` wants schedules for
    pub fn handle_selection(&self, identity: i64, text: &str) -> Result<String, ScheduleError> {
        let selection = normalize_selection(text)?;
        self.selections.record(identity, &selection)?;
        info!(identity, %selection, "selection saved");
        Ok(selection_saved(&selection))
    }

    /// Answers a period request
    ///
    /// The keyword is matched before the rate limiter, so a typo does not
    /// consume the user's request slot.
    pub async fn handle_period(&self, identity: i64, keyword: &str) -> Result<String, ScheduleError> {
        let period: Period = keyword.parse()?;

        if !self.limiter.allow(identity) {
            return Err(ScheduleError::RateLimited);
        }

        let selection = self
            .selections
            .lookup(identity)?
            .ok_or(ScheduleError::NoSelection)?;

        let document = self.service.get_schedule(&selection).await?;
        let text = query::render_period(&document, period, self.clock.today())?;

        info!(identity, %selection, %period, "schedule served");
        Ok(text)
    }

    /// Like [`handle_period`](Self::handle_period) but always yields text
    pub async fn respond(&self, identity: i64, keyword: &str) -> String {
        match self.handle_period(identity, keyword).await {
            Ok(text) => text,
            Err(e) => {
                warn!(identity, %keyword, error = %e, "request failed");
                e.reply()
            }
        }
    }

    /// Restart notices for every user with a saved selection
    pub fn restart_notices(&self) -> Result<Vec<(i64, String)>, ScheduleError> {
        let mut notices = Vec::new();
        for identity in self.selections.identities()? {
            if let Some(selection) = self.selections.lookup(identity)? {
                notices.push((identity, restart_notice(&selection)));
            }
        }
        Ok(notices)
    }

    /// Pre-loads the schedules of all saved selections
    pub async fn warm_selections(&self) -> Result<usize, ScheduleError> {
        let mut names = Vec::new();
        for identity in self.selections.identities()? {
            if let Some(selection) = self.selections.lookup(identity)? {
                if !names.contains(&selection) {
                    names.push(selection);
                }
            }
        }
        Ok(self.service.warm(&names).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::clock::ManualClock;
    use crate::data::fixtures::{day, document};
    use crate::service::tests::{sample, ScriptedSource};
    use crate::store::MemorySelectionStore;
    use chrono::NaiveDate;

    struct Harness {
        bot: ScheduleBot,
        clock: Arc<ManualClock>,
        cache: Arc<MemoryCache>,
        source: Arc<ScriptedSource>,
    }

    fn harness(source: ScriptedSource) -> Harness {
        let clock = Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        let source = Arc::new(source);
        let service = ScheduleService::new(cache.clone(), source.clone());
        let bot = ScheduleBot::new(
            service,
            Arc::new(MemorySelectionStore::new()),
            RateLimiter::new(clock.clone()),
            clock.clone(),
        );
        Harness {
            bot,
            clock,
            cache,
            source,
        }
    }

    #[tokio::test]
    async fn test_today_for_saved_selection() {
        let h = harness(ScriptedSource::serving("M-101", sample("Algorithms")));
        h.bot.handle_selection(1, "  M-101 ").unwrap();

        let text = h.bot.handle_period(1, "today").await.unwrap();

        assert!(text.contains("Algorithms"));
        assert!(text.contains("09:00 - 10:30"));
    }

    #[tokio::test]
    async fn test_tomorrow_without_lessons_is_not_an_error() {
        let h = harness(ScriptedSource::serving("M-101", sample("Algorithms")));
        h.bot.handle_selection(1, "M-101").unwrap();

        let text = h.bot.handle_period(1, "tomorrow").await.unwrap();

        assert_eq!(text, "No classes on 02.06.2025.");
    }

    #[tokio::test]
    async fn test_unrecognized_period() {
        let h = harness(ScriptedSource::serving("M-101", sample("Algorithms")));
        h.bot.handle_selection(1, "M-101").unwrap();

        let result = h.bot.handle_period(1, "yesterday").await;

        assert!(matches!(result, Err(ScheduleError::UnrecognizedPeriod(ref k)) if k == "yesterday"));
        // the typo did not use up the request slot
        assert!(h.bot.handle_period(1, "today").await.is_ok());
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_within_cooldown() {
        let h = harness(ScriptedSource::serving("M-101", sample("Algorithms")));
        h.bot.handle_selection(1, "M-101").unwrap();

        assert!(h.bot.handle_period(1, "today").await.is_ok());
        assert!(matches!(
            h.bot.handle_period(1, "week").await,
            Err(ScheduleError::RateLimited)
        ));

        h.clock.advance(5);
        assert!(h.bot.handle_period(1, "week").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_requests_from_one_user() {
        let h = harness(ScriptedSource::serving("M-101", sample("Algorithms")));
        h.bot.handle_selection(1, "M-101").unwrap();

        let (a, b) = tokio::join!(h.bot.handle_period(1, "today"), h.bot.handle_period(1, "today"));

        let limited = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(ScheduleError::RateLimited)))
            .count();
        assert_eq!(limited, 1);
    }

    #[tokio::test]
    async fn test_no_selection() {
        let h = harness(ScriptedSource::default());

        let result = h.bot.handle_period(1, "today").await;

        assert!(matches!(result, Err(ScheduleError::NoSelection)));
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_503_is_unavailable_and_not_cached() {
        let source = ScriptedSource::default();
        source.fail("M-101", 503);
        let h = harness(source);
        h.bot.handle_selection(1, "M-101").unwrap();

        let err = h.bot.handle_period(1, "today").await.unwrap_err();

        assert!(matches!(err, ScheduleError::Unavailable(FetchError::Status(503))));
        assert!(err.reply().contains("Could not retrieve"));
        assert!(h.cache.read("M-101").is_none());
    }

    #[tokio::test]
    async fn test_malformed_document_replies_like_unavailable() {
        let broken = document(vec![vec![day("Sunday", "June 1st", vec![])]]);
        let h = harness(ScriptedSource::serving("M-101", broken));
        h.bot.handle_selection(1, "M-101").unwrap();

        let err = h.bot.handle_period(1, "today").await.unwrap_err();

        assert!(matches!(err, ScheduleError::MalformedDocument(QueryError::MalformedDate(_))));
        assert_eq!(
            err.reply(),
            ScheduleError::Unavailable(FetchError::Status(503)).reply()
        );
    }

    #[tokio::test]
    async fn test_respond_always_returns_text() {
        let h = harness(ScriptedSource::default());

        let text = h.bot.respond(1, "today").await;

        assert_eq!(text, ScheduleError::NoSelection.reply());
    }

    #[test]
    fn test_invalid_selection_rejected() {
        let h = harness(ScriptedSource::default());

        let result = h.bot.handle_selection(1, "   ---  ");

        assert!(matches!(result, Err(ScheduleError::InvalidSelection(_))));
    }

    #[test]
    fn test_selection_reply_lists_periods() {
        let h = harness(ScriptedSource::default());

        let reply = h.bot.handle_selection(1, "M-101").unwrap();

        assert!(reply.contains("M-101"));
        for period in Period::ALL {
            assert!(reply.contains(period.keyword()));
        }
    }

    #[test]
    fn test_restart_notices() {
        let h = harness(ScriptedSource::default());
        h.bot.handle_selection(2, "M-102").unwrap();
        h.bot.handle_selection(1, "M-101").unwrap();

        let notices = h.bot.restart_notices().unwrap();

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].0, 1);
        assert!(notices[0].1.contains("M-101"));
        assert!(notices[1].1.contains("M-102"));
    }

    #[tokio::test]
    async fn test_warm_selections_fetches_each_name_once() {
        let source = ScriptedSource::serving("M-101", sample("Algorithms"));
        let h = harness(source);
        h.bot.handle_selection(1, "M-101").unwrap();
        h.bot.handle_selection(2, "M-101").unwrap();

        let loaded = h.bot.warm_selections().await.unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(h.source.calls(), 1);
        assert!(h.cache.get("M-101").is_some());
    }

    #[test]
    fn test_query_error_conversion() {
        let e: ScheduleError = QueryError::UnrecognizedPeriod("x".to_string()).into();
        assert!(matches!(e, ScheduleError::UnrecognizedPeriod(_)));

        let e: ScheduleError = QueryError::MalformedDate("x".to_string()).into();
        assert!(matches!(e, ScheduleError::MalformedDocument(_)));
    }
}
