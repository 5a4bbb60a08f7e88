//! Plain-text clipboard interchange with spreadsheet applications.
//!
//! The wire format is UTF-8 with `\t` between cells and `\n` between rows.
//! Nothing is escaped, so a value containing a tab or newline does not
//! survive a round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::selection::{CellPosition, SelectionRange};
use crate::columns::IncludedColumns;
use crate::store::CellEdit;

pub const CELL_SEPARATOR: char = '\t';
pub const ROW_SEPARATOR: char = '\n';

/// Errors reading or writing the system clipboard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard is empty")]
    Empty,
}

impl ClipboardError {
    pub fn code(&self) -> &'static str {
        match self {
            ClipboardError::Unavailable(_) => "CLIPBOARD_UNAVAILABLE",
            ClipboardError::Empty => "CLIPBOARD_EMPTY",
        }
    }
}

/// Trait for system clipboard access
pub trait ClipboardProvider {
    fn get_text(&mut self) -> Result<String, ClipboardError>;

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard implementation using arboard.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl ClipboardProvider for SystemClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        let mut cb =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        cb.get_text()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut cb =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        cb.set_text(text.to_owned())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Provider for hosts without clipboard access; every read fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl ClipboardProvider for NoClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable("no system clipboard".to_string()))
    }

    fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable("no system clipboard".to_string()))
    }
}

/// Dimensions of a copied block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockShape {
    pub rows: usize,
    pub cols: usize,
}

impl BlockShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Shape of `range` once clipped to the included columns
    pub fn of(range: &SelectionRange, included: &IncludedColumns) -> Self {
        Self {
            rows: range.row_count(),
            cols: range.col_count(included),
        }
    }
}

/// Lay out `values` row-major into `shape` as clipboard text
pub fn serialize<S: AsRef<str>>(values: &[S], shape: BlockShape) -> String {
    if shape.cols == 0 || shape.rows == 0 {
        return String::new();
    }

    let mut out = String::new();
    for (i, row) in values.chunks(shape.cols).take(shape.rows).enumerate() {
        if i > 0 {
            out.push(ROW_SEPARATOR);
        }
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                out.push(CELL_SEPARATOR);
            }
            out.push_str(value.as_ref());
        }
    }
    out
}

/// Split clipboard text into rows of cells
pub fn deserialize(text: &str) -> Vec<Vec<String>> {
    text.split(ROW_SEPARATOR)
        .map(|line| line.split(CELL_SEPARATOR).map(str::to_owned).collect())
        .collect()
}

/// Like [`deserialize`], for text coming from another application:
/// CRLF line ends are accepted and one trailing line terminator is ignored.
pub fn deserialize_pasted(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n");
    let trimmed = normalized
        .strip_suffix(ROW_SEPARATOR)
        .unwrap_or(&normalized);
    deserialize(trimmed)
}

/// Map a pasted block onto the grid starting at `anchor`.
///
/// A source cell at offset `(dr, dc)` lands on `(anchor.row + dr,
/// anchor.col + dc)` and is kept only if that row exists and that column is
/// included; everything else is dropped.
pub fn paste_edits(
    block: &[Vec<String>],
    anchor: CellPosition,
    row_count: usize,
    included: &IncludedColumns,
) -> Vec<CellEdit> {
    let mut edits = Vec::new();
    for (dr, cells) in block.iter().enumerate() {
        let row = anchor.row + dr;
        if row >= row_count {
            break;
        }
        for (dc, value) in cells.iter().enumerate() {
            let col = anchor.col + dc;
            if included.contains(col) {
                edits.push(CellEdit::new(row, col, value.clone()));
            }
        }
    }
    edits
}

/// Internal copy buffer, used when the system clipboard can't be read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardState {
    text: Option<String>,
    range: Option<SelectionRange>,
}

impl ClipboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the text of an explicit copy
    pub fn copy(&mut self, text: String, range: SelectionRange) {
        self.text = Some(text);
        self.range = Some(range);
    }

    pub fn last_copied(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The range the buffer was copied from
    pub fn range(&self) -> Option<SelectionRange> {
        self.range
    }

    pub fn has_content(&self) -> bool {
        self.text.is_some()
    }

    pub fn clear(&mut self) {
        self.text = None;
        self.range = None;
    }

    /// Pick the text to paste: the system read if it produced anything,
    /// else the last copied buffer, else nothing.
    pub fn resolve_paste(&self, read: Result<String, ClipboardError>) -> Option<String> {
        match read {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => self.text.clone(),
            Err(e) => {
                tracing::warn!("system clipboard read failed, using internal buffer: {}", e);
                self.text.clone()
            }
        }
    }
}
