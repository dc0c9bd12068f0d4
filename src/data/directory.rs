//! Directory of known groups and teachers
//!
//! The provider publishes one flat list of names. Names are classified as a
//! student group ("ПИ-101") or a teacher ("доц. Иванов И.И.") by pattern,
//! anything else is dropped, and each class is de-duplicated by id.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Group: upper-case letters or digits, a hyphen, then digits
static GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-ZА-ЯЁ0-9]+-\d+$").expect("group pattern is valid"));

/// Teacher: optional title, capitalised surname, two initials
static TEACHER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(доц\.|проф\.|ст\.преп\.|асс\.|дек\.)?\s?[А-ЯЁ][а-яё]+ [А-ЯЁ]\.[А-ЯЁ]\.$")
        .expect("teacher pattern is valid")
});

/// Provider ids arrive as either strings or numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

/// One element of the provider's name list, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawDirectoryEntry {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A validated group or teacher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
}

/// What a directory name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Group,
    Teacher,
}

/// Classifies a name, returning `None` for names that are neither
pub fn classify(name: &str) -> Option<EntityKind> {
    if GROUP_NAME.is_match(name) {
        Some(EntityKind::Group)
    } else if TEACHER_NAME.is_match(name) {
        Some(EntityKind::Teacher)
    } else {
        None
    }
}

/// Whether a free-text selection contains at least one letter or digit
pub fn is_valid_name(name: &str) -> bool {
    name.chars().any(char::is_alphanumeric)
}

/// Groups and teachers known to the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub groups: Vec<DirectoryEntry>,
    pub teachers: Vec<DirectoryEntry>,
}

impl Directory {
    /// Splits a raw provider list into groups and teachers
    ///
    /// Within each class a repeated id keeps its first position but takes the
    /// name of its last occurrence.
    pub fn from_raw(entries: impl IntoIterator<Item = RawDirectoryEntry>) -> Self {
        let mut groups: IndexMap<String, String> = IndexMap::new();
        let mut teachers: IndexMap<String, String> = IndexMap::new();

        for entry in entries {
            let Some(name) = entry.name.filter(|n| !n.is_empty()) else {
                continue;
            };
            match classify(&name) {
                Some(EntityKind::Group) => {
                    groups.insert(entry.id.to_string(), name);
                }
                Some(EntityKind::Teacher) => {
                    teachers.insert(entry.id.to_string(), name);
                }
                None => {}
            }
        }

        Self {
            groups: into_entries(groups),
            teachers: into_entries(teachers),
        }
    }

    /// Group names containing `query`
    pub fn search_groups(&self, query: &str) -> Vec<String> {
        search(&self.groups, query)
    }

    /// Teacher names containing `query`
    pub fn search_teachers(&self, query: &str) -> Vec<String> {
        search(&self.teachers, query)
    }
}

fn into_entries(map: IndexMap<String, String>) -> Vec<DirectoryEntry> {
    map.into_iter()
        .map(|(id, name)| DirectoryEntry { id, name })
        .collect()
}

/// Substring match that folds ASCII case only; Cyrillic must match exactly
fn search(entries: &[DirectoryEntry], query: &str) -> Vec<String> {
    let query = query.to_ascii_lowercase();
    entries
        .iter()
        .filter(|e| e.name.to_ascii_lowercase().contains(&query))
        .map(|e| e.name.clone())
        .collect()
}
