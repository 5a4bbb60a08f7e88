use serde::{Deserialize, Serialize};

use super::selection::{CellPosition, SelectionRange};
use crate::columns::IncludedColumns;

/// Screen rectangle of a rendered cell, in host units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CellRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &CellRect) -> CellRect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        CellRect {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

/// Supplies the on-screen rectangle of a cell.
///
/// Returns `None` for cells the host has not laid out (scrolled away,
/// filtered out).
pub trait CellGeometry {
    fn rect_for(&self, pos: CellPosition) -> Option<CellRect>;
}

/// Uniform grid layout, useful for hosts with fixed cell sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedGeometry {
    pub row_height: f64,
    pub col_width: f64,
    /// Included columns in display order; a column's slot is its position here
    pub columns: IncludedColumns,
}

impl CellGeometry for FixedGeometry {
    fn rect_for(&self, pos: CellPosition) -> Option<CellRect> {
        let slot = self.columns.position_of(pos.col)?;
        Some(CellRect::new(
            slot as f64 * self.col_width,
            pos.row as f64 * self.row_height,
            self.col_width,
            self.row_height,
        ))
    }
}

/// Overlay rectangle for a selection: the union of the rects of its first
/// and last included cells.
pub fn selection_rect(
    range: &SelectionRange,
    geometry: &dyn CellGeometry,
    included: &IncludedColumns,
) -> Option<CellRect> {
    let normalized = range.normalize();
    let cols = included.in_range(normalized.start.col, normalized.end.col);
    let (&first, &last) = (cols.first()?, cols.last()?);

    let top_left = geometry.rect_for(CellPosition::new(normalized.start.row, first))?;
    let bottom_right = geometry.rect_for(CellPosition::new(normalized.end.row, last))?;
    Some(top_left.union(&bottom_right))
}
