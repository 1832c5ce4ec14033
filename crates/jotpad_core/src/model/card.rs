//! List-view projection of a note.

use crate::model::note::{Note, NoteId};
use once_cell::sync::Lazy;
use regex::Regex;

const UNTITLED_HEADING: &str = "Untitled";
const EMPTY_EXCERPT: &str = "No content";
const EXCERPT_MAX_CHARS: usize = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Display-ready summary of one note for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCard {
    pub id: NoteId,
    /// Title, or `Untitled` when empty.
    pub heading: String,
    /// Whitespace-collapsed content, or `No content` when empty.
    pub excerpt: String,
    /// Short date of the last update, e.g. `May 1, 2024`.
    pub updated_label: String,
}

impl From<&Note> for NoteCard {
    fn from(note: &Note) -> Self {
        // Only an empty field falls back; whitespace is shown as typed.
        Self {
            id: note.id,
            heading: if note.title.is_empty() {
                UNTITLED_HEADING.to_string()
            } else {
                note.title.clone()
            },
            excerpt: if note.content.is_empty() {
                EMPTY_EXCERPT.to_string()
            } else {
                derive_excerpt(&note.content).unwrap_or_default()
            },
            updated_label: note.updated.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Collapses whitespace runs and keeps the first 100 chars.
pub fn derive_excerpt(content: &str) -> Option<String> {
    let normalized = WHITESPACE_RE.replace_all(content, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(EXCERPT_MAX_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_excerpt, NoteCard};
    use crate::model::note::Note;
    use chrono::{TimeZone, Utc};

    #[test]
    fn card_falls_back_for_blank_fields() {
        let note = Note::new(1, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        let card = NoteCard::from(&note);
        assert_eq!(card.heading, "Untitled");
        assert_eq!(card.excerpt, "No content");
        assert_eq!(card.updated_label, "May 1, 2024");
    }

    #[test]
    fn whitespace_only_fields_do_not_fall_back() {
        let mut note = Note::new(2, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        note.title = "  ".to_string();
        note.content = "\n\t".to_string();

        let card = NoteCard::from(&note);
        assert_eq!(card.heading, "  ");
        assert_eq!(card.excerpt, "");
    }

    #[test]
    fn excerpt_collapses_whitespace_and_truncates() {
        assert_eq!(
            derive_excerpt("milk,\n\n  eggs\tbread").as_deref(),
            Some("milk, eggs bread")
        );
        let long = "x".repeat(250);
        assert_eq!(derive_excerpt(&long).map(|text| text.len()), Some(100));
        assert_eq!(derive_excerpt(" \n "), None);
    }
}
