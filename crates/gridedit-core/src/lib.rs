pub mod columns;
pub mod config;
pub mod error;
pub mod search;
pub mod state;
pub mod store;
pub mod validation;

pub use columns::{ColumnMapping, IncludedColumns};
pub use config::{ConfigError, EditorConfig};
pub use error::{GridError, GridResult};
pub use search::{
    ColumnScope, ReplaceOptions, SearchEngine, SearchError, SearchOptions, SearchStatus,
};
pub use state::{
    BlockShape, CellGeometry, CellPosition, CellRect, ClipboardError, ClipboardProvider,
    ClipboardState, CommittedEdit, Direction, EditMode, EditState, InputAction, Key, Modifiers,
    NoClipboard, Selection, SelectionRange,
};
pub use store::{CellChange, CellEdit, DataRow, GridStore, ParsedSheet};
pub use validation::{ValidationError, ValidationOverlay};
