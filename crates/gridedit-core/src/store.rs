use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GridError, GridResult};

/// One row of raw values as parsed from the source file.
///
/// Values are sparse by column ordinal: anything past the end of `values`
/// reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<String>,
}

impl DataRow {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn get(&self, col: usize) -> &str {
        self.values.get(col).map(String::as_str).unwrap_or("")
    }

    fn set(&mut self, col: usize, value: String) {
        if col >= self.values.len() {
            if value.is_empty() {
                return;
            }
            self.values.resize(col + 1, String::new());
        }
        self.values[col] = value;
    }
}

/// Output of the file-parsing collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSheet {
    pub header_row: DataRow,
    pub data_rows: Vec<DataRow>,
    pub header_row_index: usize,
}

/// A single addressed write, in data-row coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellEdit {
    #[serde(rename = "dataRow")]
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl CellEdit {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// One cell's before/after values, the unit of undo data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub old_value: String,
    pub new_value: String,
}

impl CellChange {
    pub fn new(
        row: usize,
        col: usize,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            row,
            col,
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// Write that applies the change
    pub fn forward(&self) -> CellEdit {
        CellEdit::new(self.row, self.col, self.new_value.clone())
    }

    /// Write that reverts the change
    pub fn inverse(&self) -> CellEdit {
        CellEdit::new(self.row, self.col, self.old_value.clone())
    }

    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

/// Canonical table of editable values.
///
/// The store is persistent: every mutation returns a new store that shares
/// all untouched rows with its predecessor. Two stores are the same snapshot
/// iff [`GridStore::ptr_eq`] holds, which is how hosts detect changes.
#[derive(Debug, Clone, Default)]
pub struct GridStore {
    rows: Arc<Vec<Arc<DataRow>>>,
}

impl GridStore {
    pub fn new(rows: Vec<DataRow>) -> Self {
        Self {
            rows: Arc::new(rows.into_iter().map(Arc::new).collect()),
        }
    }

    pub fn from_values<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|r| DataRow::new(r.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw value at `(row, col)`; `""` for absent rows or columns
    pub fn value_at(&self, row: usize, col: usize) -> &str {
        self.rows.get(row).map(|r| r.get(col)).unwrap_or("")
    }

    pub fn row(&self, row: usize) -> Option<&Arc<DataRow>> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[Arc<DataRow>] {
        &self.rows
    }

    fn check_row(&self, row: usize) -> GridResult<()> {
        if row >= self.rows.len() {
            return Err(GridError::RowOutOfBounds {
                row,
                row_count: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Write one value. Only the addressed row is replaced in the result.
    pub fn set_cell(&self, row: usize, col: usize, value: impl Into<String>) -> GridResult<Self> {
        self.check_row(row)?;

        let mut rows: Vec<Arc<DataRow>> = self.rows.as_ref().clone();
        Arc::make_mut(&mut rows[row]).set(col, value.into());

        Ok(Self {
            rows: Arc::new(rows),
        })
    }

    /// Apply a batch of writes against one derived snapshot.
    ///
    /// Later edits to the same cell win. The whole batch is rejected if any
    /// edit addresses a row outside the store.
    pub fn set_cells(&self, edits: &[CellEdit]) -> GridResult<Self> {
        for edit in edits {
            self.check_row(edit.row)?;
        }

        let mut rows: Vec<Arc<DataRow>> = self.rows.as_ref().clone();
        for edit in edits {
            // The first write to a row clones it; later writes reuse the clone.
            Arc::make_mut(&mut rows[edit.row]).set(edit.col, edit.value.clone());
        }

        Ok(Self {
            rows: Arc::new(rows),
        })
    }

    /// Whether both stores are the same snapshot
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// Whether `row` is shared between both snapshots
    pub fn shares_row(&self, other: &Self, row: usize) -> bool {
        match (self.rows.get(row), other.rows.get(row)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Pair each edit with the value it replaces.
    ///
    /// Old values are read as of the batch's position, so a cell written
    /// twice records the first write's value as the second's old value;
    /// reverting the changes in reverse order restores the original.
    pub fn diff(&self, edits: &[CellEdit]) -> Vec<CellChange> {
        let mut pending: HashMap<(usize, usize), &str> = HashMap::new();
        edits
            .iter()
            .map(|edit| {
                let key = (edit.row, edit.col);
                let old = pending
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| self.value_at(edit.row, edit.col));
                pending.insert(key, &edit.value);
                CellChange::new(edit.row, edit.col, old, edit.value.clone())
            })
            .collect()
    }

    /// Current values, for submission by the host
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|r| r.values.clone()).collect()
    }
}

impl From<ParsedSheet> for GridStore {
    fn from(sheet: ParsedSheet) -> Self {
        Self::new(sheet.data_rows)
    }
}
