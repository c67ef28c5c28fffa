//! Snapshot-based undo/redo history.
//!
//! Each entry holds the full annotation collection as it was immediately
//! before a labeled edit. Annotations are shared through `Arc`, so an entry
//! costs one pointer per annotation and only edited annotations are cloned
//! (see `AnnotationDocument::get_mut`).
//!
//! Gestures stage only a label at pointer-down. The pre-image is captured
//! by [`History::commit_staged`] right before the gesture's first real
//! mutation, so commands run mid-gesture keep their own entries.

use crate::annotation::Annotation;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default maximum number of undo entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Annotation collection in z-order, as stored by history.
pub type Snapshot = Vec<Arc<Annotation>>;

/// One undoable step.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Annotation collection before the edit.
    pub annotations: Snapshot,
    /// Human readable action name ("move", "create polygon", ...).
    pub label: String,
}

impl HistoryEntry {
    pub fn new(label: impl Into<String>, annotations: Snapshot) -> Self {
        Self {
            annotations,
            label: label.into(),
        }
    }
}

/// Undo/redo stacks with a bounded depth.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    /// Label of the gesture in progress, pushed on its first real mutation.
    staged: Option<String>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create a history keeping at most `limit` undo entries (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            staged: None,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the depth bound, dropping the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Record the pre-edit state. Call strictly before mutating.
    pub fn snapshot(&mut self, label: impl Into<String>, current: &[Arc<Annotation>]) {
        self.push(HistoryEntry::new(label, current.to_vec()));
    }

    /// Open a gesture entry; nothing is recorded until
    /// [`commit_staged`](Self::commit_staged).
    pub fn stage(&mut self, label: impl Into<String>) {
        self.staged = Some(label.into());
    }

    /// Record the staged gesture with `before`, the collection as it was
    /// just ahead of the gesture's first mutation. Calling it again is a no-op.
    pub fn commit_staged(&mut self, before: Snapshot) -> bool {
        match self.staged.take() {
            Some(label) => {
                self.push(HistoryEntry::new(label, before));
                true
            }
            None => false,
        }
    }

    /// Forget the staged snapshot (the gesture changed nothing).
    pub fn drop_staged(&mut self) {
        self.staged = None;
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    fn push(&mut self, entry: HistoryEntry) {
        log::debug!("History snapshot: {}", entry.label);
        self.past.push_back(entry);
        self.future.clear();
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Pop the most recent entry. `current` is saved for redo under the
    /// popped entry's label. Returns the entry to restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        self.staged = None;
        let entry = self.past.pop_back()?;
        log::debug!("Undo: {}", entry.label);
        self.future.push(HistoryEntry::new(entry.label.clone(), current));
        Some(entry)
    }

    /// Re-apply the most recently undone entry.
    pub fn redo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        self.staged = None;
        let entry = self.future.pop()?;
        log::debug!("Redo: {}", entry.label);
        self.past.push_back(HistoryEntry::new(entry.label.clone(), current));
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Label of the action `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|e| e.label.as_str())
    }

    /// Label of the action `redo` would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.staged = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationId, SerializableColor};
    use kurbo::Point;

    fn rect(id: u64, x: f64) -> Arc<Annotation> {
        Arc::new(Annotation::rectangle(
            AnnotationId(id),
            "scratch",
            Point::new(x, 0.0),
            Point::new(x + 10.0, 10.0),
            SerializableColor::black(),
        ))
    }

    #[test]
    fn test_undo_redo_restores_states() {
        let mut history = History::default();
        let before = vec![rect(1, 0.0)];
        let after = vec![rect(1, 5.0)];

        history.snapshot("move", &before);
        let undone = history.undo(after.clone()).unwrap();
        assert_eq!(undone.annotations, before);
        assert_eq!(undone.label, "move");
        assert_eq!(history.redo_label(), Some("move"));

        let redone = history.redo(undone.annotations).unwrap();
        assert_eq!(redone.annotations, after);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = History::default();
        assert!(history.undo(Vec::new()).is_none());
        assert!(history.redo(Vec::new()).is_none());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_new_snapshot_clears_future() {
        let mut history = History::default();
        history.snapshot("a", &[]);
        history.undo(Vec::new());
        assert!(history.can_redo());
        history.snapshot("b", &[]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.snapshot(format!("edit {i}"), &[]);
        }
        assert_eq!(history.undo_len(), 3);
        assert_eq!(history.undo_label(), Some("edit 4"));

        history.set_limit(1);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_staged_snapshot_commits_once() {
        let mut history = History::default();
        history.stage("move");
        assert!(!history.can_undo());
        assert!(history.commit_staged(vec![rect(1, 0.0)]));
        assert!(!history.commit_staged(vec![rect(1, 5.0)]));
        assert_eq!(history.undo_len(), 1);

        history.stage("move");
        history.drop_staged();
        assert!(!history.commit_staged(Vec::new()));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_snapshot_keeps_staged_gesture() {
        let mut history = History::default();
        history.stage("move");
        history.snapshot("bring to front", &[rect(1, 0.0), rect(2, 20.0)]);
        assert!(history.has_staged());

        let after_reorder = vec![rect(2, 20.0), rect(1, 0.0)];
        assert!(history.commit_staged(after_reorder.clone()));
        assert_eq!(history.undo_len(), 2);

        let undone = history.undo(Vec::new()).unwrap();
        assert_eq!(undone.label, "move");
        assert_eq!(undone.annotations, after_reorder);
        assert_eq!(history.undo_label(), Some("bring to front"));
    }
}
