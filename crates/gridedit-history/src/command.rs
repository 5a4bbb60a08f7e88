use gridedit_core::{CellChange, CellEdit, GridResult, GridStore};
use serde::{Deserialize, Serialize};

/// One undoable step.
///
/// A bulk entry covers everything one user action changed (a paste, a
/// replace-all, a cut) so it undoes as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "changes", rename_all = "snake_case")]
pub enum HistoryEntry {
    Edit(CellChange),
    BulkEdit(Vec<CellChange>),
}

impl HistoryEntry {
    /// Entry for a batch of changes; a batch of one is still a bulk entry
    pub fn bulk(changes: Vec<CellChange>) -> Self {
        HistoryEntry::BulkEdit(changes)
    }

    pub fn changes(&self) -> &[CellChange] {
        match self {
            HistoryEntry::Edit(change) => std::slice::from_ref(change),
            HistoryEntry::BulkEdit(changes) => changes,
        }
    }

    pub fn len(&self) -> usize {
        self.changes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, HistoryEntry::BulkEdit(_))
    }

    /// Writes that redo the entry, in recorded order
    pub fn forward_edits(&self) -> Vec<CellEdit> {
        self.changes().iter().map(CellChange::forward).collect()
    }

    /// Writes that undo the entry. Reverse order, so a cell touched twice
    /// ends at its first old value.
    pub fn inverse_edits(&self) -> Vec<CellEdit> {
        self.changes().iter().rev().map(CellChange::inverse).collect()
    }

    /// Apply the entry to `store`
    pub fn apply(&self, store: &GridStore) -> GridResult<GridStore> {
        store.set_cells(&self.forward_edits())
    }

    /// Revert the entry on `store`
    pub fn revert(&self, store: &GridStore) -> GridResult<GridStore> {
        store.set_cells(&self.inverse_edits())
    }

    /// Get a description of this entry (for UI display)
    pub fn description(&self) -> String {
        match self {
            HistoryEntry::Edit(_) => "Edit cell".to_string(),
            HistoryEntry::BulkEdit(changes) if changes.len() == 1 => "Edit 1 cell".to_string(),
            HistoryEntry::BulkEdit(changes) => format!("Edit {} cells", changes.len()),
        }
    }
}
