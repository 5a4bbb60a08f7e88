//! Projection of externally computed validation errors onto the grid.
//!
//! The validator reports rows in display coordinates, which count the
//! header row and are 1-based: data row `r` is display row
//! `r + header_row_index + 2`. Lookups here take data rows.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One error reported by the external validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Display row (see module docs)
    pub row_index: usize,
    pub column_index: usize,
    pub message: String,
}

impl ValidationError {
    pub fn new(row_index: usize, column_index: usize, message: impl Into<String>) -> Self {
        Self {
            row_index,
            column_index,
            message: message.into(),
        }
    }
}

/// Display row for a data row
pub fn display_row(data_row: usize, header_row_index: usize) -> usize {
    data_row + header_row_index + 2
}

/// Data row for a display row; `None` for the header and rows above it
pub fn data_row(display_row: usize, header_row_index: usize) -> Option<usize> {
    display_row.checked_sub(header_row_index + 2)
}

/// Indexed view of the current error list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOverlay {
    header_row_index: usize,
    /// Keyed by (display row, column)
    by_cell: HashMap<(usize, usize), String>,
    rows: BTreeSet<usize>,
    per_column: BTreeMap<usize, usize>,
    error_count: usize,
}

impl ValidationOverlay {
    pub fn new(header_row_index: usize) -> Self {
        Self {
            header_row_index,
            ..Self::default()
        }
    }

    /// Index `errors` against a grid of `row_count` data rows.
    ///
    /// Errors that map outside `[0, row_count)` are left over from a previous
    /// dataset and are dropped. When several errors hit the same cell the
    /// last one is shown.
    pub fn build(errors: &[ValidationError], header_row_index: usize, row_count: usize) -> Self {
        let mut overlay = Self::new(header_row_index);
        let mut dropped = 0usize;

        for error in errors {
            let row = match data_row(error.row_index, header_row_index) {
                Some(row) if row < row_count => row,
                _ => {
                    dropped += 1;
                    continue;
                }
            };

            overlay
                .by_cell
                .insert((error.row_index, error.column_index), error.message.clone());
            overlay.rows.insert(row);
            *overlay.per_column.entry(error.column_index).or_default() += 1;
            overlay.error_count += 1;
        }

        if dropped > 0 {
            tracing::warn!(dropped, "ignoring validation errors outside the current grid");
        }
        tracing::debug!(
            kept = overlay.error_count,
            rows = overlay.rows.len(),
            "validation overlay rebuilt"
        );

        overlay
    }

    pub fn header_row_index(&self) -> usize {
        self.header_row_index
    }

    /// Message for the cell at data row `row`, column `col`
    pub fn error_at(&self, row: usize, col: usize) -> Option<&str> {
        self.by_cell
            .get(&(display_row(row, self.header_row_index), col))
            .map(String::as_str)
    }

    /// Data rows that carry at least one error
    pub fn rows_with_errors(&self) -> &BTreeSet<usize> {
        &self.rows
    }

    pub fn row_has_error(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    /// Number of errors kept after dropping stale ones
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn errors_in_column(&self, col: usize) -> usize {
        self.per_column.get(&col).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.error_count == 0
    }

    /// First erroring row after `after` (or from the top), wrapping around
    pub fn next_error_row(&self, after: Option<usize>) -> Option<usize> {
        match after {
            Some(row) => self
                .rows
                .range(row + 1..)
                .next()
                .or_else(|| self.rows.iter().next())
                .copied(),
            None => self.rows.iter().next().copied(),
        }
    }

    /// Data row indices to render, in order
    pub fn visible_row_indices(&self, row_count: usize, show_only_errors: bool) -> Vec<usize> {
        if show_only_errors {
            self.rows.range(..row_count).copied().collect()
        } else {
            (0..row_count).collect()
        }
    }

    /// Rows to render, each paired with its original data-row index.
    ///
    /// The rows themselves are borrowed, never copied or renumbered.
    pub fn visible_rows<'a, T>(&self, rows: &'a [T], show_only_errors: bool) -> Vec<(usize, &'a T)> {
        rows.iter()
            .enumerate()
            .filter(|(idx, _)| !show_only_errors || self.rows.contains(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        assert_eq!(display_row(0, 0), 2);
        assert_eq!(display_row(3, 4), 9);
        assert_eq!(data_row(9, 4), Some(3));
        assert_eq!(data_row(1, 0), None);
    }

    #[test]
    fn test_error_at() {
        let errors = vec![
            ValidationError::new(3, 1, "invalid email"),
            ValidationError::new(2, 0, "required"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 2);

        assert_eq!(overlay.error_at(1, 1), Some("invalid email"));
        assert_eq!(overlay.error_at(0, 0), Some("required"));
        assert_eq!(overlay.error_at(0, 1), None);
        assert_eq!(overlay.error_count(), 2);
    }

    #[test]
    fn test_header_offset() {
        let errors = vec![ValidationError::new(5, 0, "bad")];
        let overlay = ValidationOverlay::build(&errors, 3, 10);
        assert_eq!(overlay.error_at(0, 0), Some("bad"));
        assert!(overlay.row_has_error(0));
    }

    #[test]
    fn test_rows_with_errors_counts_distinct_rows() {
        let errors = vec![
            ValidationError::new(2, 0, "a"),
            ValidationError::new(2, 1, "b"),
            ValidationError::new(4, 0, "c"),
            ValidationError::new(4, 2, "d"),
            ValidationError::new(5, 0, "e"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 10);

        let rows: Vec<usize> = overlay.rows_with_errors().iter().copied().collect();
        assert_eq!(rows, vec![0, 2, 3]);
        assert_eq!(overlay.error_count(), 5);
    }

    #[test]
    fn test_stale_errors_dropped() {
        let errors = vec![
            ValidationError::new(1, 0, "header row"),
            ValidationError::new(2, 0, "kept"),
            ValidationError::new(50, 0, "from a larger file"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 3);

        assert_eq!(overlay.error_count(), 1);
        assert_eq!(overlay.rows_with_errors().len(), 1);
        assert!(overlay.rows_with_errors().iter().all(|&r| r < 3));
        assert_eq!(overlay.error_at(48, 0), None);
    }

    #[test]
    fn test_duplicate_cell_keeps_last_message() {
        let errors = vec![
            ValidationError::new(2, 0, "first"),
            ValidationError::new(2, 0, "second"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 1);
        assert_eq!(overlay.error_at(0, 0), Some("second"));
        assert_eq!(overlay.rows_with_errors().len(), 1);
    }

    #[test]
    fn test_errors_in_column() {
        let errors = vec![
            ValidationError::new(2, 1, "a"),
            ValidationError::new(3, 1, "b"),
            ValidationError::new(3, 0, "c"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 5);
        assert_eq!(overlay.errors_in_column(1), 2);
        assert_eq!(overlay.errors_in_column(0), 1);
        assert_eq!(overlay.errors_in_column(7), 0);
    }

    #[test]
    fn test_next_error_row_wraps() {
        let errors = vec![
            ValidationError::new(3, 0, "a"),
            ValidationError::new(6, 0, "b"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, 10);

        assert_eq!(overlay.next_error_row(None), Some(1));
        assert_eq!(overlay.next_error_row(Some(1)), Some(4));
        assert_eq!(overlay.next_error_row(Some(4)), Some(1));
        assert_eq!(ValidationOverlay::default().next_error_row(None), None);
    }

    #[test]
    fn test_visible_rows_preserves_identity() {
        let rows = vec!["r0", "r1", "r2", "r3"];
        let errors = vec![
            ValidationError::new(5, 0, "a"),
            ValidationError::new(3, 0, "b"),
        ];
        let overlay = ValidationOverlay::build(&errors, 0, rows.len());

        let filtered = overlay.visible_rows(&rows, true);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].0, 1);
        assert_eq!(filtered[1].0, 3);
        assert!(std::ptr::eq(filtered[1].1, &rows[3]));

        let all = overlay.visible_rows(&rows, false);
        assert_eq!(all.len(), 4);
        assert_eq!(overlay.visible_row_indices(4, true), vec![1, 3]);
        assert_eq!(overlay.visible_row_indices(3, false), vec![0, 1, 2]);
    }

    #[test]
    fn test_validation_error_serialization() {
        let error: ValidationError =
            serde_json::from_str(r#"{"rowIndex":4,"columnIndex":2,"message":"bad"}"#).unwrap();
        assert_eq!(error, ValidationError::new(4, 2, "bad"));
    }
}
