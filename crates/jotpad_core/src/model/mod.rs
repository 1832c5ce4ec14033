//! Domain model for notes and editor snapshots.
//!
//! # Responsibility
//! - Define the persisted `Note` record and its exact JSON wire shape.
//! - Define the value types moved between store, history and editor.
//!
//! # Invariants
//! - A note's `id` and `created` never change after creation.
//! - `updated >= created` for every note handed out by the store.

pub mod card;
pub mod note;
