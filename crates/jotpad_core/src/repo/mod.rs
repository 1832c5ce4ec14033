//! Durable note collection.
//!
//! # Responsibility
//! - Own every read and write of the note collection.
//! - Persist the whole collection as one JSON value per mutation.
//!
//! # Invariants
//! - Exactly one note per id.
//! - Failed writes keep the in-memory change and report `StorageUnavailable`.

pub mod note_store;
