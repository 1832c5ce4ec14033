//! Core state management for the Jotpad note-taking app.
//!
//! The UI layer drives a [`SessionController`], which owns a [`NoteStore`]
//! (durable notes in a local key-value store) and a [`HistoryManager`]
//! (undo/redo for the open note).

pub mod clock;
pub mod config;
pub mod db;
pub mod history;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use history::HistoryManager;
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::NoteCard;
pub use model::note::{EditorField, EditorSnapshot, Note, NoteId};
pub use repo::note_store::{NoteStore, StoreError, StoreResult};
pub use service::debounce::Debouncer;
pub use service::session_controller::{
    ConfirmDelete, DeleteOutcome, EditorState, SessionController, SessionError, SessionId,
    SessionResult, TimerReport, ViewState,
};
pub use service::shortcut::{parse_chord, resolve_shortcut, EditorCommand};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
