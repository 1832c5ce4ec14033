//! Editing use-cases layered over the note store and history.
//!
//! # Responsibility
//! - Keep UI callers decoupled from storage and timer details.
//! - Own debounce policy for autosave and undo snapshots.

pub mod debounce;
pub mod session_controller;
pub mod shortcut;
