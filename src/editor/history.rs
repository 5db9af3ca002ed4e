//! Bounded undo/redo over full-state snapshots.
//!
//! The undo stack always has the *current* state on top, so undo is only
//! possible while it holds at least two entries. Pushing a new state
//! discards the redo stack; exceeding the limit drops the oldest entry.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    limit: usize,
}

impl<T: Clone> History<T> {
    /// `limit` counts the current state; a limit of 0 is treated as 1.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, state: T) {
        self.undo.push_back(state);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Step back. Returns the state to restore.
    pub fn undo(&mut self) -> Option<T> {
        if self.undo.len() < 2 {
            return None;
        }
        let current = self.undo.pop_back()?;
        self.redo.push(current);
        self.undo.back().cloned()
    }

    /// Step forward. Returns the state to restore.
    pub fn redo(&mut self) -> Option<T> {
        let state = self.redo.pop()?;
        self.undo.push_back(state.clone());
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Entries on the undo stack, current state included.
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
