//! Note record and editor value types.
//!
//! # Responsibility
//! - Own the persisted note shape (`id`, `title`, `content`, `created`,
//!   `updated`) and its serde mapping.
//! - Provide the snapshot type used as the undo/redo unit.
//!
//! # Invariants
//! - Timestamps serialize as ISO-8601 UTC with millisecond precision.
//! - `touch` never moves `updated` before `created`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric note identifier, serialized as a JSON number.
pub type NoteId = i64;

/// One persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(with = "iso_timestamp")]
    pub created: DateTime<Utc>,
    #[serde(with = "iso_timestamp")]
    pub updated: DateTime<Utc>,
}

impl Note {
    /// Creates an empty note stamped with `now` for both timestamps.
    pub fn new(id: NoteId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            created: now,
            updated: now,
        }
    }

    /// Sets `updated` to `now`, clamped so it never precedes `created`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = now.max(self.created);
    }

    /// Copies the editable fields out as an undo/redo unit.
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }

    /// Overwrites the editable fields from `snapshot`.
    pub fn apply(&mut self, snapshot: &EditorSnapshot) {
        self.title.clone_from(&snapshot.title);
        self.content.clone_from(&snapshot.content);
    }
}

/// Editable fields captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EditorSnapshot {
    pub title: String,
    pub content: String,
}

impl EditorSnapshot {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Replaces one field, leaving the other untouched.
    pub fn set(&mut self, field: EditorField, value: String) {
        match field {
            EditorField::Title => self.title = value,
            EditorField::Content => self.content = value,
        }
    }
}

/// Editor input that can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorField {
    Title,
    Content,
}

/// Serde adapter for `2024-05-01T12:00:00.000Z` timestamps.
///
/// Reads accept any RFC 3339 offset and normalize to UTC.
pub mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| D::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
    }

    /// Formats `value` the way it is written to storage.
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorField, EditorSnapshot, Note};
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn touch_never_moves_updated_before_created() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut note = Note::new(7, created);

        note.touch(created - TimeDelta::seconds(30));
        assert_eq!(note.updated, created);

        note.touch(created + TimeDelta::seconds(30));
        assert_eq!(note.updated, created + TimeDelta::seconds(30));
    }

    #[test]
    fn snapshot_set_changes_one_field() {
        let mut snapshot = EditorSnapshot::new("Groceries", "");
        snapshot.set(EditorField::Content, "milk".to_string());
        assert_eq!(snapshot, EditorSnapshot::new("Groceries", "milk"));
    }
}
