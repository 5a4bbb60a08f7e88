use std::collections::VecDeque;

use gridedit_core::config::DEFAULT_HISTORY_LIMIT;
use gridedit_core::{GridResult, GridStore};

use crate::command::HistoryEntry;

/// Manages undo/redo history for grid edits
pub struct HistoryManager {
    /// Entries that can be undone, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Entries that can be redone
    redo_stack: Vec<HistoryEntry>,
    /// Maximum number of undo levels
    max_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    /// Create a new history manager with the specified max undo levels
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Apply an entry to `store` and record it
    pub fn execute(&mut self, entry: HistoryEntry, store: &GridStore) -> GridResult<GridStore> {
        let next = entry.apply(store)?;
        self.push(entry);
        Ok(next)
    }

    /// Record an entry that has already been applied
    pub fn push(&mut self, entry: HistoryEntry) {
        // Clear redo stack on new action
        self.redo_stack.clear();

        self.undo_stack.push_back(entry);

        while self.undo_stack.len() > self.max_size {
            if let Some(evicted) = self.undo_stack.pop_front() {
                tracing::debug!(cells = evicted.len(), "evicted oldest undo entry");
            }
        }
    }

    /// Undo the last entry against `store`.
    ///
    /// Returns the reverted store and the entry that was undone. If the
    /// entry no longer fits the store, the stacks are left untouched.
    pub fn undo(&mut self, store: &GridStore) -> GridResult<Option<(GridStore, HistoryEntry)>> {
        let Some(entry) = self.undo_stack.back() else {
            return Ok(None);
        };
        let reverted = entry.revert(store)?;

        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(None);
        };
        self.redo_stack.push(entry.clone());
        Ok(Some((reverted, entry)))
    }

    /// Redo the last undone entry against `store`
    pub fn redo(&mut self, store: &GridStore) -> GridResult<Option<(GridStore, HistoryEntry)>> {
        let Some(entry) = self.redo_stack.last() else {
            return Ok(None);
        };
        let applied = entry.apply(store)?;

        let Some(entry) = self.redo_stack.pop() else {
            return Ok(None);
        };
        self.undo_stack.push_back(entry.clone());
        Ok(Some((applied, entry)))
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the description of the entry that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(HistoryEntry::description)
    }

    /// Get the description of the entry that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(HistoryEntry::description)
    }

    /// Get the number of entries in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of entries in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridedit_core::{CellChange, CellEdit};

    fn edit(store: &GridStore, row: usize, col: usize, value: &str) -> HistoryEntry {
        HistoryEntry::Edit(CellChange::new(row, col, store.value_at(row, col), value))
    }

    #[test]
    fn test_undo_redo() {
        let store = GridStore::from_values(vec![vec!["a"]]);
        let mut history = HistoryManager::default();

        let store = history.execute(edit(&store, 0, 0, "b"), &store).unwrap();
        assert_eq!(store.value_at(0, 0), "b");
        assert!(history.can_undo());
        assert!(!history.can_redo());

        // Undo
        let (store, entry) = history.undo(&store).unwrap().unwrap();
        assert_eq!(store.value_at(0, 0), "a");
        assert_eq!(entry, HistoryEntry::Edit(CellChange::new(0, 0, "a", "b")));
        assert!(!history.can_undo());
        assert!(history.can_redo());

        // Redo
        let (store, _) = history.redo(&store).unwrap().unwrap();
        assert_eq!(store.value_at(0, 0), "b");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let store = GridStore::from_values(vec![vec!["a"]]);
        let mut history = HistoryManager::default();
        assert!(history.undo(&store).unwrap().is_none());
        assert!(history.redo(&store).unwrap().is_none());
    }

    #[test]
    fn test_redo_cleared_on_new_entry() {
        let store = GridStore::from_values(vec![vec!["a"]]);
        let mut history = HistoryManager::default();

        let store = history.execute(edit(&store, 0, 0, "b"), &store).unwrap();
        let (store, _) = history.undo(&store).unwrap().unwrap();
        assert!(history.can_redo());

        history.execute(edit(&store, 0, 0, "c"), &store).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_size_evicts_oldest() {
        let mut store = GridStore::from_values(vec![vec![""; 60]]);
        let mut history = HistoryManager::default();

        for i in 0..60 {
            store = history.execute(edit(&store, 0, i, "x"), &store).unwrap();
        }
        assert_eq!(history.undo_count(), DEFAULT_HISTORY_LIMIT);

        while history.can_undo() {
            store = history.undo(&store).unwrap().unwrap().0;
        }
        // The ten oldest edits can no longer be undone
        assert_eq!(store.value_at(0, 9), "x");
        assert_eq!(store.value_at(0, 10), "");
    }

    #[test]
    fn test_bulk_entry_undoes_as_unit() {
        let store = GridStore::from_values(vec![vec!["a", "b"], vec!["c", "d"]]);
        let mut history = HistoryManager::new(5);

        let edits = vec![CellEdit::new(0, 0, "1"), CellEdit::new(1, 1, "2")];
        let entry = HistoryEntry::bulk(store.diff(&edits));
        let applied = history.execute(entry, &store).unwrap();
        assert_eq!(history.undo_description().as_deref(), Some("Edit 2 cells"));

        let (reverted, _) = history.undo(&applied).unwrap().unwrap();
        assert_eq!(reverted.to_rows(), store.to_rows());
        assert_eq!(history.redo_description().as_deref(), Some("Edit 2 cells"));
    }

    #[test]
    fn test_failed_undo_keeps_entry() {
        let store = GridStore::from_values(vec![vec!["a"], vec!["b"]]);
        let mut history = HistoryManager::default();
        history.execute(edit(&store, 1, 0, "x"), &store).unwrap();

        let shorter = GridStore::from_values(vec![vec!["a"]]);
        assert!(history.undo(&shorter).is_err());
        assert_eq!(history.undo_count(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_clear() {
        let store = GridStore::from_values(vec![vec!["a"]]);
        let mut history = HistoryManager::new(3);
        let store = history.execute(edit(&store, 0, 0, "b"), &store).unwrap();
        history.undo(&store).unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(
            format!("{:?}", history),
            "HistoryManager { undo_count: 0, redo_count: 0, max_size: 3 }"
        );
    }
}
