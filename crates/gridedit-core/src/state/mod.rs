pub mod clipboard;
pub mod edit;
pub mod geometry;
pub mod input;
pub mod selection;

pub use clipboard::{
    deserialize, deserialize_pasted, paste_edits, serialize, BlockShape, ClipboardError,
    ClipboardProvider, ClipboardState, NoClipboard,
};
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use edit::{CommittedEdit, EditMode, EditState};
pub use geometry::{selection_rect, CellGeometry, CellRect, FixedGeometry};
pub use input::{key_to_action, InputAction, Key, Modifiers};
pub use selection::{CellPosition, Direction, Selection, SelectionRange};
