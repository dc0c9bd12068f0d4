//! Plain-text rendering of query results

use crate::data::{Day, Lesson, Pair};
use crate::query::{format_date, Slice, Window};

/// Message when nothing is scheduled from today onward
pub const NO_UPCOMING: &str = "No upcoming classes.";

/// Renders one lesson as a single line
///
/// `09:00 - 10:30 | Algorithms (Lec) | room 301 | A. Ivanov`; empty fields
/// are left out.
pub fn render_lesson(pair: &Pair, lesson: &Lesson) -> String {
    let mut parts = vec![format!("{} - {}", pair.start_time, pair.end_time)];

    let kind = lesson.kind.label();
    if kind.is_empty() {
        parts.push(lesson.subject.clone());
    } else {
        parts.push(format!("{} ({})", lesson.subject, kind));
    }
    if !lesson.audience.is_empty() {
        parts.push(format!("room {}", lesson.audience));
    }
    if !lesson.teacher.name.is_empty() {
        parts.push(lesson.teacher.name.clone());
    }

    parts.join(" | ")
}

/// Renders a day as a header plus one line per lesson
///
/// Returns `None` for a day without lessons.
pub fn render_day(day: &Day) -> Option<String> {
    if !day.has_lessons() {
        return None;
    }

    let mut lines = vec![format!("{} ({})", day.name.to_uppercase(), day.date)];
    lines.extend(day.lessons().map(|(pair, lesson)| render_lesson(pair, lesson)));
    Some(lines.join("\n"))
}

/// Message for a window in which nothing is scheduled
pub fn no_classes(window: &Window<'_>) -> String {
    if window.start == window.end {
        format!("No classes on {}.", format_date(window.start))
    } else {
        format!(
            "No classes from {} to {}.",
            format_date(window.start),
            format_date(window.end)
        )
    }
}

/// Renders every day of a window that has lessons, separated by blank lines
pub fn render_window(window: &Window<'_>) -> String {
    let blocks: Vec<String> = window.days.iter().filter_map(|day| render_day(day)).collect();

    if blocks.is_empty() {
        no_classes(window)
    } else {
        blocks.join("\n\n")
    }
}

pub fn render_slice(slice: &Slice<'_>) -> String {
    match slice {
        Slice::Window(window) => render_window(window),
        Slice::NoUpcoming => NO_UPCOMING.to_string(),
    }
}
