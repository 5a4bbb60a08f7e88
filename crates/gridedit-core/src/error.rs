use thiserror::Error;

/// Errors raised by grid mutations.
///
/// These are contract violations by the caller (stale coordinates after a
/// reload, an edit aimed at an unmapped column); the store is never touched
/// when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("row {row} is out of bounds (row count {row_count})")]
    RowOutOfBounds { row: usize, row_count: usize },

    #[error("column {col} is not part of the active mapping")]
    ColumnNotIncluded { col: usize },
}

impl GridError {
    /// Stable error code for hosts
    pub fn code(&self) -> &'static str {
        match self {
            GridError::RowOutOfBounds { .. } => "ROW_OUT_OF_BOUNDS",
            GridError::ColumnNotIncluded { .. } => "COLUMN_NOT_INCLUDED",
        }
    }
}

pub type GridResult<T> = Result<T, GridError>;
