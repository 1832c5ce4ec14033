//! Editing session controller.
//!
//! # Responsibility
//! - Translate UI calls (create/open/close, field edits, undo/redo, delete,
//!   search) into Note Store and History Manager operations.
//! - Own both debounce timers: autosave into the store and snapshotting into
//!   history.
//!
//! # Invariants
//! - At most one session is open; it is identified by a fresh `SessionId`.
//! - A debounced task only applies while its session is still the open one.
//! - Ending a session flushes the pending autosave and drops the pending
//!   snapshot, so no timer outlives its session.
//! - Undo/redo results are written to the store immediately.
//! - State changes are applied before a storage error is returned; the
//!   caller can re-read `editor_state()` and retry with `retry_persist()`.

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, CoreConfig};
use crate::history::HistoryManager;
use crate::kv::KeyValueStore;
use crate::model::card::NoteCard;
use crate::model::note::{EditorField, EditorSnapshot, Note, NoteId};
use crate::repo::note_store::{NoteStore, StoreError, StoreResult};
use crate::service::debounce::Debouncer;
use crate::service::shortcut::EditorCommand;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identity of one open-to-close editing session.
pub type SessionId = Uuid;

pub type SessionResult<T> = Result<T, SessionError>;

/// Controller-level failure.
#[derive(Debug)]
pub enum SessionError {
    /// The call needs an open note and none is open.
    NoActiveSession,
    /// The requested note does not exist.
    NoteNotFound(NoteId),
    /// Note store failure (storage write, duplicate id, encoding).
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveSession => write!(f, "no note is open for editing"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl SessionError {
    /// Whether the failure was a rejected storage write.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::Store(StoreError::StorageUnavailable(_)))
    }
}

/// Visible editor fields plus history availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub note_id: NoteId,
    pub title: String,
    pub content: String,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Everything the UI needs to re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Last term passed to `search`; empty lists everything.
    pub search_term: String,
    /// Cards for the notes matching `search_term`.
    pub cards: Vec<NoteCard>,
    /// `None` while the list view is showing.
    pub editor: Option<EditorState>,
}

/// Which debounced effects ran during `run_due`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerReport {
    pub autosaved: bool,
    pub snapshotted: bool,
}

/// Result of `delete_current_note`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NoSession,
    Declined,
    Deleted(NoteId),
}

/// Yes/no decision supplied by the UI before a note is deleted.
pub trait ConfirmDelete {
    fn confirm_delete(&mut self, note: &Note) -> bool;
}

impl<F> ConfirmDelete for F
where
    F: FnMut(&Note) -> bool,
{
    fn confirm_delete(&mut self, note: &Note) -> bool {
        self(note)
    }
}

#[derive(Debug, Clone)]
struct OpenSession {
    id: SessionId,
    note_id: NoteId,
    buffer: EditorSnapshot,
}

#[derive(Debug, Clone)]
struct AutosaveTask {
    session_id: SessionId,
    note_id: NoteId,
    snapshot: EditorSnapshot,
}

#[derive(Debug, Clone)]
struct SnapshotTask {
    session_id: SessionId,
    snapshot: EditorSnapshot,
}

/// Orchestrates one editing session over an injected store and history.
pub struct SessionController<K: KeyValueStore, C: Clock = SystemClock> {
    store: NoteStore<K>,
    history: HistoryManager<EditorSnapshot>,
    clock: C,
    session: Option<OpenSession>,
    autosave: Debouncer<AutosaveTask>,
    snapshot: Debouncer<SnapshotTask>,
    search_term: String,
}

impl<K: KeyValueStore, C: Clock> SessionController<K, C> {
    /// Wires a controller from already-built collaborators.
    pub fn new(
        store: NoteStore<K>,
        history: HistoryManager<EditorSnapshot>,
        clock: C,
        config: &CoreConfig,
    ) -> Self {
        Self {
            store,
            history,
            clock,
            session: None,
            autosave: Debouncer::new(config.autosave_delay),
            snapshot: Debouncer::new(config.snapshot_delay),
            search_term: String::new(),
        }
    }

    /// Validates `config`, loads the store from `kv` and builds a controller.
    pub fn from_config(kv: K, clock: C, config: &CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = NoteStore::load(kv, config.storage_key.clone());
        let history = HistoryManager::with_depth(config.history_depth);
        Ok(Self::new(store, history, clock, config))
    }

    /// Creates an empty note at the top of the list and opens it.
    ///
    /// When the write fails the note still exists in memory and is open.
    pub fn create_note(&mut self) -> SessionResult<EditorState> {
        let flushed = self.end_session();
        let now = self.clock.now();
        let note_id = match self.store.allocate_id(now) {
            Ok(note_id) => note_id,
            Err(err) => {
                flushed?;
                return Err(err.into());
            }
        };
        let added = self.store.add(Note::new(note_id, now));
        if let Err(err @ StoreError::DuplicateId(_)) = added {
            flushed?;
            return Err(err.into());
        }

        let state = self.begin_session(note_id)?;
        flushed?;
        added?;
        Ok(state)
    }

    /// Opens `note_id` for editing, ending any current session first.
    ///
    /// An unknown id leaves the current session untouched.
    pub fn open_session(&mut self, note_id: NoteId) -> SessionResult<EditorState> {
        if !self.store.contains(note_id) {
            return Err(SessionError::NoteNotFound(note_id));
        }
        let flushed = self.end_session();
        let state = self.begin_session(note_id)?;
        flushed?;
        Ok(state)
    }

    /// Returns to the list view; a pending autosave is written first.
    pub fn close_session(&mut self) -> SessionResult<()> {
        self.end_session().map_err(Into::into)
    }

    /// Records a keystroke-level change and restarts both debounce windows.
    pub fn on_field_change(
        &mut self,
        field: EditorField,
        value: impl Into<String>,
    ) -> SessionResult<EditorState> {
        let now = self.clock.now();
        let session = self
            .session
            .as_mut()
            .ok_or(SessionError::NoActiveSession)?;
        session.buffer.set(field, value.into());

        let session_id = session.id;
        let note_id = session.note_id;
        let snapshot = session.buffer.clone();
        self.autosave.schedule(
            now,
            AutosaveTask {
                session_id,
                note_id,
                snapshot: snapshot.clone(),
            },
        );
        self.snapshot.schedule(
            now,
            SnapshotTask {
                session_id,
                snapshot,
            },
        );
        debug!(
            "event=field_change module=session status=scheduled note_id={} field={:?}",
            note_id, field
        );

        self.current_state()
    }

    /// Fires every debounced effect whose window has elapsed.
    pub fn run_due(&mut self) -> SessionResult<TimerReport> {
        let now = self.clock.now();
        let mut report = TimerReport::default();
        let mut written = Ok(());

        if let Some(task) = self.autosave.take_due(now) {
            if self.is_current(task.session_id) {
                written = self.write_snapshot(task.note_id, &task.snapshot);
                report.autosaved = written.is_ok();
            } else {
                debug!(
                    "event=autosave module=session status=dropped reason=stale_session note_id={}",
                    task.note_id
                );
            }
        }

        if let Some(task) = self.snapshot.take_due(now) {
            if self.is_current(task.session_id) {
                self.history.save_state(task.snapshot);
                report.snapshotted = true;
                debug!(
                    "event=history_snapshot module=session status=ok undo_depth={}",
                    self.history.undo_depth()
                );
            } else {
                debug!("event=history_snapshot module=session status=dropped reason=stale_session");
            }
        }

        written?;
        Ok(report)
    }

    /// Earliest instant at which `run_due` has work to do.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        [self.autosave.due_at(), self.snapshot.due_at()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Steps back one snapshot and persists the result immediately.
    ///
    /// Typed-but-unsnapshotted text is pushed into history first, so it is
    /// the step being undone. Without an earlier state nothing changes.
    pub fn undo(&mut self) -> SessionResult<EditorState> {
        self.require_session()?;
        self.flush_pending_snapshot();
        match self.history.undo() {
            Some(snapshot) => self.apply_history_step(snapshot, "undo"),
            None => self.current_state(),
        }
    }

    /// Re-applies the most recently undone snapshot and persists it.
    pub fn redo(&mut self) -> SessionResult<EditorState> {
        self.require_session()?;
        self.flush_pending_snapshot();
        match self.history.redo() {
            Some(snapshot) => self.apply_history_step(snapshot, "redo"),
            None => self.current_state(),
        }
    }

    /// Dispatches a resolved keyboard command.
    pub fn execute(&mut self, command: EditorCommand) -> SessionResult<EditorState> {
        match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        }
    }

    /// Deletes the open note once `confirm` agrees, then closes the session.
    ///
    /// Declining leaves store, session and timers untouched.
    pub fn delete_current_note(
        &mut self,
        confirm: &mut impl ConfirmDelete,
    ) -> SessionResult<DeleteOutcome> {
        let Some(session) = self.session.as_ref() else {
            return Ok(DeleteOutcome::NoSession);
        };
        let note_id = session.note_id;
        let mut note = self
            .store
            .get(note_id)
            .ok_or(SessionError::NoteNotFound(note_id))?;
        note.apply(&session.buffer);

        if !confirm.confirm_delete(&note) {
            info!("event=note_delete module=session status=declined note_id={note_id}");
            return Ok(DeleteOutcome::Declined);
        }

        self.autosave.cancel();
        self.snapshot.cancel();
        self.history.clear();
        self.session = None;
        self.store.delete(note_id)?;
        info!("event=note_delete module=session status=ok note_id={note_id}");
        Ok(DeleteOutcome::Deleted(note_id))
    }

    /// Notes matching `term`; the term also filters `cards` and `view`.
    pub fn search(&mut self, term: &str) -> Vec<Note> {
        self.search_term = term.to_string();
        self.store.search(term)
    }

    /// Every note, most recently created first.
    pub fn list(&self) -> Vec<Note> {
        self.store.list()
    }

    /// Cards for the notes matching the current search term.
    pub fn cards(&self) -> Vec<NoteCard> {
        self.store.cards(&self.search_term)
    }

    /// Open note's fields with the availability `undo`/`redo` will act on.
    ///
    /// A pending snapshot counts as an undo step and voids the redo stack,
    /// since both commands push it into history first.
    pub fn editor_state(&self) -> Option<EditorState> {
        self.session.as_ref().map(|session| {
            let snapshot_pending = self
                .snapshot
                .pending()
                .is_some_and(|task| task.session_id == session.id);
            EditorState {
                note_id: session.note_id,
                title: session.buffer.title.clone(),
                content: session.buffer.content.clone(),
                can_undo: snapshot_pending || self.history.can_undo(),
                can_redo: !snapshot_pending && self.history.can_redo(),
            }
        })
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            search_term: self.search_term.clone(),
            cards: self.cards(),
            editor: self.editor_state(),
        }
    }

    /// Writes the in-memory collection again after a storage failure.
    pub fn retry_persist(&mut self) -> SessionResult<()> {
        self.store.save()?;
        Ok(())
    }

    pub fn current_note_id(&self) -> Option<NoteId> {
        self.session.as_ref().map(|session| session.note_id)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn store(&self) -> &NoteStore<K> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore<K> {
        &mut self.store
    }

    pub fn history(&self) -> &HistoryManager<EditorSnapshot> {
        &self.history
    }

    fn begin_session(&mut self, note_id: NoteId) -> SessionResult<EditorState> {
        let note = self
            .store
            .get(note_id)
            .ok_or(SessionError::NoteNotFound(note_id))?;
        let buffer = note.snapshot();
        self.autosave.cancel();
        self.snapshot.cancel();
        self.history.reset(buffer.clone());

        let id = Uuid::new_v4();
        info!("event=session_open module=session status=ok session_id={id} note_id={note_id}");
        self.session = Some(OpenSession {
            id,
            note_id,
            buffer,
        });
        self.current_state()
    }

    fn end_session(&mut self) -> StoreResult<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.snapshot.cancel();
        self.history.clear();
        let flushed = match self.autosave.flush() {
            Some(task) => self.write_snapshot(task.note_id, &task.snapshot),
            None => Ok(()),
        };
        info!(
            "event=session_close module=session status={} session_id={} note_id={}",
            if flushed.is_ok() { "ok" } else { "error" },
            session.id,
            session.note_id
        );
        flushed
    }

    fn flush_pending_snapshot(&mut self) {
        if let Some(task) = self.snapshot.flush() {
            if self.is_current(task.session_id) {
                self.history.save_state(task.snapshot);
            }
        }
    }

    fn apply_history_step(
        &mut self,
        snapshot: EditorSnapshot,
        event: &'static str,
    ) -> SessionResult<EditorState> {
        let session = self
            .session
            .as_mut()
            .ok_or(SessionError::NoActiveSession)?;
        session.buffer = snapshot.clone();
        let note_id = session.note_id;

        // The immediate write below supersedes any typed-text autosave.
        self.autosave.cancel();
        let written = self.write_snapshot(note_id, &snapshot);
        if let Err(err) = &written {
            warn!(
                "event={} module=session status=error note_id={} error={}",
                event, note_id, err
            );
        } else {
            info!(
                "event={} module=session status=ok note_id={} can_undo={} can_redo={}",
                event,
                note_id,
                self.history.can_undo(),
                self.history.can_redo()
            );
        }
        written?;
        self.current_state()
    }

    fn write_snapshot(&mut self, note_id: NoteId, snapshot: &EditorSnapshot) -> StoreResult<()> {
        let mut note = self.store.get(note_id).ok_or(StoreError::NotFound(note_id))?;
        note.apply(snapshot);
        note.touch(self.clock.now());
        self.store.update(note)
    }

    fn is_current(&self, session_id: SessionId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.id == session_id)
    }

    fn require_session(&self) -> SessionResult<()> {
        if self.session.is_some() {
            Ok(())
        } else {
            Err(SessionError::NoActiveSession)
        }
    }

    fn current_state(&self) -> SessionResult<EditorState> {
        self.editor_state().ok_or(SessionError::NoActiveSession)
    }
}
