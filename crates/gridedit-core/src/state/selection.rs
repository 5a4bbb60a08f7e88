use serde::{Deserialize, Serialize};

use crate::columns::IncludedColumns;

/// Represents a single cell position in the grid.
///
/// `row` is a data-row index (header excluded) and `col` is the source
/// column ordinal, not the position among visible columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn origin() -> Self {
        Self { row: 0, col: 0 }
    }
}

/// Direction of a single keyboard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Represents a rectangular range of cells.
///
/// `start` is the anchor and `end` follows the focus; the pair is never
/// stored normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: CellPosition,
    pub end: CellPosition,
}

impl SelectionRange {
    pub fn new(start: CellPosition, end: CellPosition) -> Self {
        Self { start, end }
    }

    pub fn single_cell(pos: CellPosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns the normalized range (top-left to bottom-right)
    pub fn normalize(&self) -> Self {
        let min_row = self.start.row.min(self.end.row);
        let max_row = self.start.row.max(self.end.row);
        let min_col = self.start.col.min(self.end.col);
        let max_col = self.start.col.max(self.end.col);

        Self {
            start: CellPosition::new(min_row, min_col),
            end: CellPosition::new(max_row, max_col),
        }
    }

    /// Check if a position is within this range
    pub fn contains(&self, pos: CellPosition) -> bool {
        let normalized = self.normalize();
        pos.row >= normalized.start.row
            && pos.row <= normalized.end.row
            && pos.col >= normalized.start.col
            && pos.col <= normalized.end.col
    }

    pub fn top_left(&self) -> CellPosition {
        self.normalize().start
    }

    pub fn bottom_right(&self) -> CellPosition {
        self.normalize().end
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn row_count(&self) -> usize {
        let normalized = self.normalize();
        normalized.end.row - normalized.start.row + 1
    }

    /// Number of included columns spanned by the range
    pub fn col_count(&self, included: &IncludedColumns) -> usize {
        let normalized = self.normalize();
        included
            .in_range(normalized.start.col, normalized.end.col)
            .len()
    }

    /// Cells of the normalized rectangle whose column is included,
    /// row-major ascending.
    pub fn cells(&self, included: &IncludedColumns) -> Vec<CellPosition> {
        let normalized = self.normalize();
        let cols = included.in_range(normalized.start.col, normalized.end.col);
        (normalized.start.row..=normalized.end.row)
            .flat_map(|row| cols.iter().map(move |&col| CellPosition::new(row, col)))
            .collect()
    }
}

/// Step `pos` one cell in `direction`, clamped to the data bounds.
///
/// Horizontal steps walk the included columns in order. A position whose
/// column is no longer included snaps to the nearest included column first.
fn step(
    pos: CellPosition,
    direction: Direction,
    included: &IncludedColumns,
    row_count: usize,
) -> Option<CellPosition> {
    if row_count == 0 {
        return None;
    }
    let col = included.nearest(pos.col)?;
    let row = pos.row.min(row_count - 1);

    let next = match direction {
        Direction::Up => CellPosition::new(row.saturating_sub(1), col),
        Direction::Down => CellPosition::new((row + 1).min(row_count - 1), col),
        Direction::Left if col == pos.col => {
            CellPosition::new(row, included.prev_before(col).unwrap_or(col))
        }
        Direction::Right if col == pos.col => {
            CellPosition::new(row, included.next_after(col).unwrap_or(col))
        }
        // Snapping back onto the mapping already counts as the step.
        Direction::Left | Direction::Right => CellPosition::new(row, col),
    };
    Some(next)
}

/// The active selection of the grid, or nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    range: Option<SelectionRange>,
}

impl Selection {
    pub fn new() -> Self {
        Self { range: None }
    }

    /// Anchor a new single-cell selection at `pos`
    pub fn start_selection(&mut self, pos: CellPosition) {
        self.range = Some(SelectionRange::single_cell(pos));
    }

    /// Move the focus to `pos`, keeping the anchor.
    /// Starts a new selection when there is none.
    pub fn extend_selection(&mut self, pos: CellPosition) {
        match &mut self.range {
            Some(range) => range.end = pos,
            None => self.start_selection(pos),
        }
    }

    /// Move a single-cell selection one step. With no selection, the first
    /// included cell of the first row is selected.
    pub fn move_focus(&mut self, direction: Direction, included: &IncludedColumns, row_count: usize) {
        let Some(range) = self.range else {
            if let (Some(col), true) = (included.first(), row_count > 0) {
                self.start_selection(CellPosition::new(0, col));
            }
            return;
        };

        if let Some(next) = step(range.end, direction, included, row_count) {
            self.start_selection(next);
        }
    }

    /// Shift+arrow: move only the focus one step
    pub fn extend_focus(&mut self, direction: Direction, included: &IncludedColumns, row_count: usize) {
        let Some(range) = self.range else {
            self.move_focus(direction, included, row_count);
            return;
        };

        if let Some(next) = step(range.end, direction, included, row_count) {
            self.extend_selection(next);
        }
    }

    /// Select every included cell of the grid
    pub fn select_all(&mut self, included: &IncludedColumns, row_count: usize) {
        if let (Some(first), Some(last), true) = (included.first(), included.last(), row_count > 0) {
            self.range = Some(SelectionRange::new(
                CellPosition::new(0, first),
                CellPosition::new(row_count - 1, last),
            ));
        }
    }

    /// Set the range directly, e.g. when restoring state
    pub fn set_range(&mut self, range: Option<SelectionRange>) {
        self.range = range;
    }

    /// Pull both corners back inside the grid and onto included columns.
    /// Clears the selection when no cell is left to select.
    pub fn clamp_to(&mut self, included: &IncludedColumns, row_count: usize) {
        let Some(range) = self.range else {
            return;
        };
        if row_count == 0 || included.is_empty() {
            self.range = None;
            return;
        }

        let clamp = |pos: CellPosition| -> Option<CellPosition> {
            Some(CellPosition::new(
                pos.row.min(row_count - 1),
                included.nearest(pos.col)?,
            ))
        };

        self.range = match (clamp(range.start), clamp(range.end)) {
            (Some(start), Some(end)) => Some(SelectionRange::new(start, end)),
            _ => None,
        };
    }

    pub fn clear(&mut self) {
        self.range = None;
    }

    pub fn range(&self) -> Option<SelectionRange> {
        self.range
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// The anchor cell
    pub fn active_cell(&self) -> Option<CellPosition> {
        self.range.map(|r| r.start)
    }

    /// The focus cell
    pub fn focus(&self) -> Option<CellPosition> {
        self.range.map(|r| r.end)
    }

    /// Whether `pos` is the anchor cell
    pub fn is_selected(&self, pos: CellPosition) -> bool {
        self.active_cell() == Some(pos)
    }

    /// Whether `pos` lies inside the selected rectangle
    pub fn contains(&self, pos: CellPosition) -> bool {
        self.range.is_some_and(|r| r.contains(pos))
    }

    /// Selected cells clipped to the included columns, row-major
    pub fn cells_in_selection(&self, included: &IncludedColumns) -> Vec<CellPosition> {
        self.range
            .map(|r| r.cells(included))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(c: &[usize]) -> IncludedColumns {
        IncludedColumns::new(c.iter().copied())
    }

    #[test]
    fn test_cell_position_ordering() {
        assert!(CellPosition::new(0, 5) < CellPosition::new(1, 0));
        assert!(CellPosition::new(1, 0) < CellPosition::new(1, 1));
    }

    #[test]
    fn test_selection_range_normalize() {
        let range = SelectionRange::new(CellPosition::new(5, 10), CellPosition::new(2, 3));
        let normalized = range.normalize();
        assert_eq!(normalized.start, CellPosition::new(2, 3));
        assert_eq!(normalized.end, CellPosition::new(5, 10));
    }

    #[test]
    fn test_selection_range_contains_reversed() {
        let range = SelectionRange::new(CellPosition::new(5, 7), CellPosition::new(2, 3));
        assert!(range.contains(CellPosition::new(3, 5)));
        assert!(range.contains(CellPosition::new(2, 3)));
        assert!(range.contains(CellPosition::new(5, 7)));
        assert!(!range.contains(CellPosition::new(1, 5)));
        assert!(!range.contains(CellPosition::new(3, 8)));
    }

    #[test]
    fn test_selection_range_counts() {
        let range = SelectionRange::new(CellPosition::new(2, 0), CellPosition::new(5, 4));
        assert_eq!(range.row_count(), 4);
        assert_eq!(range.col_count(&cols(&[0, 1, 2, 3, 4])), 5);
        assert_eq!(range.col_count(&cols(&[1, 3, 9])), 2);
    }

    #[test]
    fn test_start_and_extend() {
        let mut selection = Selection::new();
        assert!(selection.is_empty());

        selection.start_selection(CellPosition::new(2, 3));
        assert_eq!(selection.active_cell(), Some(CellPosition::new(2, 3)));
        assert!(selection.range().unwrap().is_single_cell());

        selection.extend_selection(CellPosition::new(0, 1));
        assert_eq!(selection.active_cell(), Some(CellPosition::new(2, 3)));
        assert_eq!(selection.focus(), Some(CellPosition::new(0, 1)));
        assert!(selection.contains(CellPosition::new(1, 2)));
        assert!(selection.is_selected(CellPosition::new(2, 3)));
        assert!(!selection.is_selected(CellPosition::new(1, 2)));
    }

    #[test]
    fn test_extend_without_selection_starts_one() {
        let mut selection = Selection::new();
        selection.extend_selection(CellPosition::new(1, 1));
        assert_eq!(
            selection.range(),
            Some(SelectionRange::single_cell(CellPosition::new(1, 1)))
        );
    }

    #[test]
    fn test_cells_in_selection_skips_excluded_columns() {
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(1, 3));
        selection.extend_selection(CellPosition::new(0, 0));

        let cells = selection.cells_in_selection(&cols(&[0, 2, 3, 7]));
        assert_eq!(
            cells,
            vec![
                CellPosition::new(0, 0),
                CellPosition::new(0, 2),
                CellPosition::new(0, 3),
                CellPosition::new(1, 0),
                CellPosition::new(1, 2),
                CellPosition::new(1, 3),
            ]
        );
    }

    #[test]
    fn test_cells_in_selection_never_leaves_included() {
        let included = cols(&[1, 4]);
        let mut selection = Selection::new();
        // Programmatic corners on excluded columns
        selection.start_selection(CellPosition::new(0, 0));
        selection.extend_selection(CellPosition::new(2, 6));

        let cells = selection.cells_in_selection(&included);
        assert_eq!(cells.len(), 6);
        assert!(cells.iter().all(|p| included.contains(p.col)));
    }

    #[test]
    fn test_move_focus_steps_over_excluded_columns() {
        let included = cols(&[0, 2, 5]);
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(0, 0));

        selection.move_focus(Direction::Right, &included, 3);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 2)));
        selection.move_focus(Direction::Right, &included, 3);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 5)));
        // Clamped, no wraparound
        selection.move_focus(Direction::Right, &included, 3);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 5)));

        selection.move_focus(Direction::Left, &included, 3);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 2)));
    }

    #[test]
    fn test_move_focus_clamps_rows() {
        let included = cols(&[0]);
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(0, 0));

        selection.move_focus(Direction::Up, &included, 2);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 0)));
        selection.move_focus(Direction::Down, &included, 2);
        selection.move_focus(Direction::Down, &included, 2);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(1, 0)));
    }

    #[test]
    fn test_move_focus_collapses_range_from_focus() {
        let included = cols(&[0, 1, 2]);
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(0, 0));
        selection.extend_selection(CellPosition::new(2, 1));

        selection.move_focus(Direction::Right, &included, 5);
        assert_eq!(
            selection.range(),
            Some(SelectionRange::single_cell(CellPosition::new(2, 2)))
        );
    }

    #[test]
    fn test_move_focus_without_included_columns_is_noop() {
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(1, 1));
        selection.move_focus(Direction::Down, &IncludedColumns::default(), 5);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(1, 1)));

        let mut empty = Selection::new();
        empty.move_focus(Direction::Down, &IncludedColumns::default(), 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_move_focus_from_nothing_selects_first_cell() {
        let mut selection = Selection::new();
        selection.move_focus(Direction::Down, &cols(&[3, 4]), 5);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 3)));
    }

    #[test]
    fn test_move_focus_snaps_off_unmapped_column() {
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(0, 1));
        // Column 1 was unmapped after the selection was made
        selection.move_focus(Direction::Right, &cols(&[0, 2]), 3);
        assert_eq!(selection.active_cell(), Some(CellPosition::new(0, 0)));
    }

    #[test]
    fn test_extend_focus_keeps_anchor() {
        let included = cols(&[0, 1, 2]);
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(1, 1));
        selection.extend_focus(Direction::Down, &included, 5);
        selection.extend_focus(Direction::Right, &included, 5);

        assert_eq!(
            selection.range(),
            Some(SelectionRange::new(
                CellPosition::new(1, 1),
                CellPosition::new(2, 2)
            ))
        );
    }

    #[test]
    fn test_select_all() {
        let mut selection = Selection::new();
        selection.select_all(&cols(&[1, 3]), 4);
        assert_eq!(
            selection.range(),
            Some(SelectionRange::new(
                CellPosition::new(0, 1),
                CellPosition::new(3, 3)
            ))
        );

        let mut none = Selection::new();
        none.select_all(&cols(&[1]), 0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_clamp_to() {
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(9, 0));
        selection.extend_selection(CellPosition::new(12, 8));
        selection.clamp_to(&cols(&[1, 4]), 5);

        assert_eq!(
            selection.range(),
            Some(SelectionRange::new(
                CellPosition::new(4, 1),
                CellPosition::new(4, 4)
            ))
        );

        selection.clamp_to(&cols(&[1]), 0);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_serialization() {
        let mut selection = Selection::new();
        selection.start_selection(CellPosition::new(5, 10));

        let serialized = serde_json::to_string(&selection).unwrap();
        let deserialized: Selection = serde_json::from_str(&serialized).unwrap();

        assert_eq!(selection, deserialized);
    }
}
