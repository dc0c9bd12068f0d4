//! Core data models for the timetable
//!
//! The schedule provider returns a week-major tree: weeks hold days, days hold
//! pairs (time slots) and each pair holds the lessons taught in that slot.
//! Submodules contain the HTTP client for the provider and the entity
//! directory of groups and teachers.

pub mod directory;
pub mod upstream;

pub use directory::{Directory, DirectoryEntry, EntityKind};
pub use upstream::{FetchError, ScheduleClient, ScheduleSource};

use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A full schedule for one group or teacher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub weeks: Vec<Week>,
}

/// One week of the schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Week {
    #[serde(default, deserialize_with = "null_as_default")]
    pub days: Vec<Day>,
}

/// A calendar day and its time slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// Display name, e.g. "Monday"
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Calendar date as `DD.MM.YYYY`
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pairs: Vec<Pair>,
}

impl Day {
    /// Whether any time slot of this day has at least one lesson
    pub fn has_lessons(&self) -> bool {
        self.pairs.iter().any(|pair| !pair.lessons.is_empty())
    }

    /// Iterates lessons together with the slot they belong to
    pub fn lessons(&self) -> impl Iterator<Item = (&Pair, &Lesson)> {
        self.pairs
            .iter()
            .flat_map(|pair| pair.lessons.iter().map(move |lesson| (pair, lesson)))
    }
}

/// A time slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lessons: Vec<Lesson>,
}

/// A single lesson within a time slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: LessonKind,
    /// Room identifier
    #[serde(default, deserialize_with = "null_as_default")]
    pub audience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teacher: Teacher,
}

/// Lesson type such as lecture or lab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonKind {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_name: String,
}

impl LessonKind {
    /// The abbreviation, or the full name when the provider sent none
    pub fn label(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}
