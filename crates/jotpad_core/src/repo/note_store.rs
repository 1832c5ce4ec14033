//! Note collection persisted under one key of a key-value store.
//!
//! # Responsibility
//! - Provide list/get/add/update/delete/search over the note collection.
//! - Serialize the full collection to JSON on every mutation.
//! - Degrade to an empty collection when stored data is missing or corrupt.
//!
//! # Invariants
//! - Ordering is most-recently-created first; `add` inserts at the front.
//! - `created` is immutable once stored; `updated >= created` always.
//! - Ids handed out by `allocate_id` are never reused by this store.

use crate::kv::{KeyValueStore, KvError};
use crate::model::card::NoteCard;
use crate::model::note::{Note, NoteId};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Note store failure.
#[derive(Debug)]
pub enum StoreError {
    /// The key-value backend rejected a write; memory still holds the change.
    StorageUnavailable(KvError),
    /// No note with this id.
    NotFound(NoteId),
    /// A note with this id already exists.
    DuplicateId(NoteId),
    /// Collection could not be encoded.
    Serialize(String),
    /// A stored id already sits at the top of the id range.
    IdSpaceExhausted,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "note storage unavailable: {err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateId(id) => write!(f, "note id already exists: {id}"),
            Self::Serialize(message) => write!(f, "failed to encode notes: {message}"),
            Self::IdSpaceExhausted => write!(f, "no note id left above {}", NoteId::MAX),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KvError> for StoreError {
    fn from(value: KvError) -> Self {
        Self::StorageUnavailable(value)
    }
}

/// Owner of the durable note collection.
pub struct NoteStore<K: KeyValueStore> {
    kv: K,
    key: String,
    notes: Vec<Note>,
    dirty: bool,
    last_issued_id: Option<NoteId>,
}

impl<K: KeyValueStore> NoteStore<K> {
    /// Loads the collection stored under `key`.
    ///
    /// A missing value, unreadable backend or malformed JSON yields an empty
    /// collection; the problem is logged and never returned.
    pub fn load(kv: K, key: impl Into<String>) -> Self {
        let key = key.into();
        let notes = match kv.get(&key) {
            Ok(Some(raw)) => decode_notes(&raw),
            Ok(None) => {
                info!("event=store_load module=store status=empty reason=absent");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=store_load module=store status=degraded reason=read_failed error={}",
                    err
                );
                Vec::new()
            }
        };
        info!(
            "event=store_load module=store status=ok note_count={}",
            notes.len()
        );

        let last_issued_id = notes.iter().map(|note| note.id).max();
        Self {
            kv,
            key,
            notes,
            dirty: false,
            last_issued_id,
        }
    }

    /// Copy of every note in store order.
    pub fn list(&self) -> Vec<Note> {
        self.notes.clone()
    }

    pub fn get(&self, id: NoteId) -> Option<Note> {
        self.find(id).cloned()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.find(id).is_some()
    }

    /// Inserts `note` at the front and persists.
    ///
    /// # Errors
    /// - `DuplicateId` when the id is taken; nothing changes.
    /// - `StorageUnavailable` when the write fails; the note stays in memory.
    pub fn add(&mut self, mut note: Note) -> StoreResult<()> {
        if self.contains(note.id) {
            return Err(StoreError::DuplicateId(note.id));
        }
        note.touch(note.updated);
        self.last_issued_id = self.last_issued_id.max(Some(note.id));
        let id = note.id;
        self.notes.insert(0, note);
        self.persist("note_add", Some(id))
    }

    /// Replaces the note with the same id and persists.
    ///
    /// The stored `created` is kept; `updated` is clamped to it.
    ///
    /// # Errors
    /// - `NotFound` when no note has this id; nothing is written.
    /// - `StorageUnavailable` when the write fails; memory holds the update.
    pub fn update(&mut self, mut note: Note) -> StoreResult<()> {
        let Some(slot) = self.notes.iter_mut().find(|current| current.id == note.id) else {
            warn!(
                "event=note_update module=store status=skipped reason=not_found note_id={}",
                note.id
            );
            return Err(StoreError::NotFound(note.id));
        };
        note.created = slot.created;
        note.touch(note.updated);
        let id = note.id;
        *slot = note;
        self.persist("note_update", Some(id))
    }

    /// Removes the note with `id` and persists; absent ids are a no-op.
    pub fn delete(&mut self, id: NoteId) -> StoreResult<()> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            info!("event=note_delete module=store status=noop note_id={id}");
            return Ok(());
        }
        self.persist("note_delete", Some(id))
    }

    /// Notes whose title or content contains `term`, case-insensitively.
    ///
    /// An empty term matches everything; store order is preserved.
    pub fn search(&self, term: &str) -> Vec<Note> {
        let needle = term.to_lowercase();
        self.notes
            .iter()
            .filter(|note| note_matches(note, &needle))
            .cloned()
            .collect()
    }

    /// List cards for the notes matching `term`.
    pub fn cards(&self, term: &str) -> Vec<NoteCard> {
        let needle = term.to_lowercase();
        self.notes
            .iter()
            .filter(|note| note_matches(note, &needle))
            .map(NoteCard::from)
            .collect()
    }

    /// Returns an id no note in this store has used.
    ///
    /// Starts from `now` in epoch milliseconds and steps past the highest id
    /// issued or loaded so far.
    ///
    /// # Errors
    /// - `IdSpaceExhausted` when that highest id is `NoteId::MAX`.
    pub fn allocate_id(&mut self, now: DateTime<Utc>) -> StoreResult<NoteId> {
        let candidate = now.timestamp_millis();
        let id = match self.last_issued_id {
            Some(last) if last >= candidate => last.checked_add(1).ok_or_else(|| {
                error!(
                    "event=id_allocate module=store status=error error_code=id_space_exhausted last_id={}",
                    last
                );
                StoreError::IdSpaceExhausted
            })?,
            _ => candidate,
        };
        self.last_issued_id = Some(id);
        Ok(id)
    }

    /// Writes the in-memory collection; used to retry after a failure.
    pub fn save(&mut self) -> StoreResult<()> {
        self.persist("store_save", None)
    }

    /// Whether memory holds changes the backend has not accepted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &K {
        &self.kv
    }

    pub fn backend_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    fn find(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    fn persist(&mut self, event: &'static str, note_id: Option<NoteId>) -> StoreResult<()> {
        let note_id = note_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let encoded = match serde_json::to_string(&self.notes) {
            Ok(encoded) => encoded,
            Err(err) => {
                self.dirty = true;
                return Err(StoreError::Serialize(err.to_string()));
            }
        };

        match self.kv.set(&self.key, &encoded) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event={} module=store status=ok note_id={} note_count={} bytes={}",
                    event,
                    note_id,
                    self.notes.len(),
                    encoded.len()
                );
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                error!(
                    "event={} module=store status=error error_code=write_failed note_id={} error={}",
                    event, note_id, err
                );
                Err(err.into())
            }
        }
    }
}

fn note_matches(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
}

/// Parses the stored JSON array, repairing what can be repaired.
fn decode_notes(raw: &str) -> Vec<Note> {
    let decoded: Vec<Note> = match serde_json::from_str(raw) {
        Ok(notes) => notes,
        Err(err) => {
            warn!(
                "event=store_load module=store status=degraded reason=corrupt line={} column={}",
                err.line(),
                err.column()
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::with_capacity(decoded.len());
    let mut notes = Vec::with_capacity(decoded.len());
    for mut note in decoded {
        if !seen.insert(note.id) {
            warn!(
                "event=store_load module=store status=repaired reason=duplicate_id note_id={}",
                note.id
            );
            continue;
        }
        if note.updated < note.created {
            warn!(
                "event=store_load module=store status=repaired reason=updated_before_created note_id={}",
                note.id
            );
            note.updated = note.created;
        }
        notes.push(note);
    }
    notes
}
