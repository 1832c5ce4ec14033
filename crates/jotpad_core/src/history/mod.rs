//! Bounded linear undo/redo history.
//!
//! # Responsibility
//! - Keep the snapshots of one editing session without interpreting them.
//!
//! # Invariants
//! - The top of the undo stack is the current state; once reset, the undo
//!   stack never drops below one entry.
//! - Every `save_state` clears the redo stack (no branching timelines).
//! - The undo stack never exceeds the configured depth; the oldest entry is
//!   evicted first.

use crate::config::{DEFAULT_HISTORY_DEPTH, MIN_HISTORY_DEPTH};

/// Undo/redo stacks over snapshot values of type `T`.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    max_depth: usize,
}

impl<T: Clone> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> HistoryManager<T> {
    /// Creates an inactive history with the default depth.
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Creates an inactive history keeping at most `max_depth` undo entries.
    ///
    /// Depths below 2 are raised to 2 so one undo step is always possible.
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(MIN_HISTORY_DEPTH),
        }
    }

    /// Starts a session whose only state is `initial`.
    pub fn reset(&mut self, initial: T) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(initial);
    }

    /// Pushes `snapshot` as the new current state and discards redo entries.
    pub fn save_state(&mut self, snapshot: T) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            let overflow = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..overflow);
        }
    }

    /// Moves the current state to the redo stack and returns the one beneath.
    ///
    /// Returns `None`, changing nothing, when only the initial state is left.
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last().cloned()
    }

    /// Moves the most recently undone state back and returns it.
    pub fn redo(&mut self) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The state currently on top of the undo stack.
    pub fn current(&self) -> Option<&T> {
        self.undo_stack.last()
    }

    /// Drops all history; the manager is inactive until the next `reset`.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
