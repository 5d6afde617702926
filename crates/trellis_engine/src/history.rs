// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of model snapshots.
//!
//! Every recorded commit stores the complete state before and after it.
//! Snapshots are shared `Arc`s, so an entry costs two pointer copies rather
//! than a deep clone. Consecutive entries produced by one gesture merge into
//! a single entry so the whole interaction undoes in one step.

use crate::error::HistoryError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use trellis_graph::ModelState;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

static NEXT_GESTURE: AtomicU64 = AtomicU64::new(1);

/// Identifies the commands emitted by one user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GestureId(u64);

impl GestureId {
    /// Allocate a fresh gesture id
    pub fn next() -> Self {
        Self(NEXT_GESTURE.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gesture#{}", self.0)
    }
}

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Name of the command (or the first command of the gesture)
    pub description: String,
    /// State before the step
    pub before: Arc<ModelState>,
    /// State after the step
    pub after: Arc<ModelState>,
    /// Gesture that produced the step, if any
    pub gesture: Option<GestureId>,
}

impl HistoryEntry {
    /// Create a new entry
    pub fn new(description: impl Into<String>, before: Arc<ModelState>, after: Arc<ModelState>) -> Self {
        Self {
            description: description.into(),
            before,
            after,
            gesture: None,
        }
    }

    /// Tag the entry with the gesture that produced it
    pub fn with_gesture(mut self, gesture: Option<GestureId>) -> Self {
        self.gesture = gesture;
        self
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the undo stack
    pub undo_count: usize,
    /// Entries in the redo stack
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Undo stack
    undo_stack: VecDeque<HistoryEntry>,
    /// Redo stack
    redo_stack: VecDeque<HistoryEntry>,
    /// Maximum history depth
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record a committed step, merging it into the previous entry when both
    /// belong to the same gesture
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo_stack.clear();

        if let Some(last) = self.undo_stack.back_mut() {
            if entry.gesture.is_some() && last.gesture == entry.gesture {
                last.after = entry.after;
                return;
            }
        }

        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Pop the last entry for undo; it moves to the redo stack
    pub fn undo(&mut self) -> Result<HistoryEntry> {
        let entry = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push_back(entry.clone());
        Ok(entry)
    }

    /// Pop the last undone entry for redo; it moves back to the undo stack
    pub fn redo(&mut self) -> Result<HistoryEntry> {
        let entry = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        self.undo_stack.push_back(entry.clone());
        Ok(entry)
    }

    /// Drop the top entry if `gesture` produced it, without making it redoable
    pub fn revert_gesture(&mut self, gesture: GestureId) -> Option<HistoryEntry> {
        if self.undo_stack.back()?.gesture == Some(gesture) {
            self.undo_stack.pop_back()
        } else {
            None
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}
