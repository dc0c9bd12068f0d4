//! Temporal queries over a schedule document
//!
//! Every query works on calendar dates parsed from the day-level `date`
//! field. Days are visited in document order (week order, then day order) and
//! results are never re-sorted: the provider does not guarantee sorted dates,
//! and a date repeated in two weeks yields two independent days.

use chrono::{Days, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::data::{Day, ScheduleDocument};
use crate::render;

/// Format of `Day::date`
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Length of the week and nearest-activity windows
pub const WINDOW_DAYS: u64 = 7;

/// Errors produced while querying a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A day carries a date that is not `DD.MM.YYYY`; the whole document is unusable
    #[error("Malformed date '{0}' in schedule document")]
    MalformedDate(String),

    /// The requested period keyword is not one of the known four
    #[error("Unrecognized period: '{0}'. Valid periods: today, tomorrow, week, nearest")]
    UnrecognizedPeriod(String),
}

/// Time window a user can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Today,
    Tomorrow,
    Week,
    Nearest,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Today, Period::Tomorrow, Period::Week, Period::Nearest];

    /// The exact keyword that selects this period
    pub fn keyword(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Tomorrow => "tomorrow",
            Period::Week => "week",
            Period::Nearest => "nearest",
        }
    }

    /// Menu label shown next to the keyword
    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "Schedule for today",
            Period::Tomorrow => "Schedule for tomorrow",
            Period::Week => "Schedule for the week",
            Period::Nearest => "Nearest schedule",
        }
    }
}

impl FromStr for Period {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.keyword() == s)
            .ok_or_else(|| QueryError::UnrecognizedPeriod(s.to_string()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Days of a document falling in an inclusive date range
#[derive(Debug, Clone, PartialEq)]
pub struct Window<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<&'a Day>,
}

impl Window<'_> {
    /// Whether any day in the window has a lesson
    pub fn has_lessons(&self) -> bool {
        self.days.iter().any(|day| day.has_lessons())
    }

    /// Number of calendar days the window spans
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Result of a period query
#[derive(Debug, Clone, PartialEq)]
pub enum Slice<'a> {
    Window(Window<'a>),
    /// No day from today onward has a lesson
    NoUpcoming,
}

/// Parses a `DD.MM.YYYY` date
pub fn parse_date(s: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| QueryError::MalformedDate(s.to_string()))
}

/// Formats a date as `DD.MM.YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn add_days(date: NaiveDate, n: u64) -> NaiveDate {
    date.checked_add_days(Days::new(n)).unwrap_or(NaiveDate::MAX)
}

/// Every day of the document with its parsed date, in document order
///
/// Fails on the first malformed date so a bad document is rejected whole.
fn dated_days(doc: &ScheduleDocument) -> Result<Vec<(NaiveDate, &Day)>, QueryError> {
    doc.weeks
        .iter()
        .flat_map(|week| week.days.iter())
        .map(|day| parse_date(&day.date).map(|date| (date, day)))
        .collect()
}

/// First day across all weeks whose date equals `date`
pub fn day_of(doc: &ScheduleDocument, date: NaiveDate) -> Result<Option<&Day>, QueryError> {
    Ok(dated_days(doc)?
        .into_iter()
        .find(|(d, _)| *d == date)
        .map(|(_, day)| day))
}

/// All days whose date lies in `[start, end]`, in document order
pub fn range_of(
    doc: &ScheduleDocument,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<&Day>, QueryError> {
    Ok(dated_days(doc)?
        .into_iter()
        .filter(|(d, _)| (start..=end).contains(d))
        .map(|(_, day)| day)
        .collect())
}

/// [`range_of`] together with the bounds that were asked for
pub fn window(doc: &ScheduleDocument, start: NaiveDate, end: NaiveDate) -> Result<Window<'_>, QueryError> {
    Ok(Window {
        start,
        end,
        days: range_of(doc, start, end)?,
    })
}

/// Single-day window
pub fn on_date(doc: &ScheduleDocument, date: NaiveDate) -> Result<Window<'_>, QueryError> {
    window(doc, date, date)
}

pub fn today(doc: &ScheduleDocument, today: NaiveDate) -> Result<Window<'_>, QueryError> {
    on_date(doc, today)
}

pub fn tomorrow(doc: &ScheduleDocument, today: NaiveDate) -> Result<Window<'_>, QueryError> {
    on_date(doc, add_days(today, 1))
}

/// Seven-day window `[anchor, anchor + 6]`
pub fn week(doc: &ScheduleDocument, anchor: NaiveDate) -> Result<Window<'_>, QueryError> {
    window(doc, anchor, add_days(anchor, WINDOW_DAYS - 1))
}

/// Week window anchored at the first day on or after `today` that has lessons
///
/// "First" means first in document order, which is not necessarily the
/// earliest date when the document is unsorted.
pub fn nearest_active(doc: &ScheduleDocument, today: NaiveDate) -> Result<Slice<'_>, QueryError> {
    let anchor = dated_days(doc)?
        .into_iter()
        .find(|(date, day)| *date >= today && day.has_lessons())
        .map(|(date, _)| date);

    match anchor {
        Some(anchor) => Ok(Slice::Window(week(doc, anchor)?)),
        None => Ok(Slice::NoUpcoming),
    }
}

/// Resolves a period relative to `today`
pub fn slice(doc: &ScheduleDocument, period: Period, today: NaiveDate) -> Result<Slice<'_>, QueryError> {
    let window = match period {
        Period::Today => self::today(doc, today)?,
        Period::Tomorrow => tomorrow(doc, today)?,
        Period::Week => week(doc, today)?,
        Period::Nearest => return nearest_active(doc, today),
    };
    Ok(Slice::Window(window))
}

/// Renders the schedule for a period as text
pub fn render_period(doc: &ScheduleDocument, period: Period, today: NaiveDate) -> Result<String, QueryError> {
    Ok(render::render_slice(&slice(doc, period, today)?))
}

/// Parses `keyword` and renders that period
pub fn render_keyword(doc: &ScheduleDocument, keyword: &str, today: NaiveDate) -> Result<String, QueryError> {
    render_period(doc, keyword.parse()?, today)
}
