use serde::{Deserialize, Serialize};

use super::selection::CellPosition;

/// Edit mode determines whether a cell editor is open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    /// Not editing, just reviewing the grid
    #[default]
    Viewing,
    /// Editing a cell directly in the grid
    CellEditing {
        position: CellPosition,
        content: String,
    },
}

impl EditMode {
    pub fn is_viewing(&self) -> bool {
        matches!(self, EditMode::Viewing)
    }

    pub fn is_editing(&self) -> bool {
        !self.is_viewing()
    }

    pub fn get_content(&self) -> Option<&str> {
        match self {
            EditMode::Viewing => None,
            EditMode::CellEditing { content, .. } => Some(content),
        }
    }

    pub fn get_position(&self) -> Option<CellPosition> {
        match self {
            EditMode::Viewing => None,
            EditMode::CellEditing { position, .. } => Some(*position),
        }
    }
}

/// A committed cell edit, ready for the mutation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEdit {
    pub position: CellPosition,
    pub original: String,
    pub content: String,
}

impl CommittedEdit {
    /// Whether committing changes the stored value
    pub fn is_change(&self) -> bool {
        self.original != self.content
    }
}

/// Manages the in-grid cell editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditState {
    mode: EditMode,
    /// Original content before editing (for cancel operation)
    original_content: Option<String>,
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the editor on `position` with the current cell value
    pub fn start_cell_edit(&mut self, position: CellPosition, initial_content: String) {
        self.original_content = Some(initial_content.clone());
        self.mode = EditMode::CellEditing {
            position,
            content: initial_content,
        };
    }

    /// Open the editor by typing over the cell: the buffer starts with `typed`
    pub fn start_typing(&mut self, position: CellPosition, original: String, typed: &str) {
        self.original_content = Some(original);
        self.mode = EditMode::CellEditing {
            position,
            content: typed.to_string(),
        };
    }

    /// Replace the editor buffer. Ignored while viewing.
    pub fn update_value(&mut self, new_content: String) -> bool {
        match &mut self.mode {
            EditMode::Viewing => false,
            EditMode::CellEditing { content, .. } => {
                *content = new_content;
                true
            }
        }
    }

    /// Append typed text to the editor buffer
    pub fn insert_text(&mut self, text: &str) -> bool {
        match &mut self.mode {
            EditMode::Viewing => false,
            EditMode::CellEditing { content, .. } => {
                content.push_str(text);
                true
            }
        }
    }

    /// Remove the last character of the editor buffer
    pub fn backspace(&mut self) -> bool {
        match &mut self.mode {
            EditMode::Viewing => false,
            EditMode::CellEditing { content, .. } => {
                content.pop();
                true
            }
        }
    }

    /// Close the editor and hand back what was typed
    pub fn commit(&mut self) -> Option<CommittedEdit> {
        let mode = std::mem::take(&mut self.mode);
        let original = self.original_content.take().unwrap_or_default();
        match mode {
            EditMode::Viewing => None,
            EditMode::CellEditing { position, content } => Some(CommittedEdit {
                position,
                original,
                content,
            }),
        }
    }

    /// Cancel the current edit and return the original content
    pub fn cancel(&mut self) -> Option<String> {
        if self.mode.is_editing() {
            self.mode = EditMode::Viewing;
            self.original_content.take()
        } else {
            None
        }
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn current_content(&self) -> Option<&str> {
        self.mode.get_content()
    }

    pub fn editing_position(&self) -> Option<CellPosition> {
        self.mode.get_position()
    }

    pub fn original_content(&self) -> Option<&str> {
        self.original_content.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_mode_default() {
        assert_eq!(EditMode::default(), EditMode::Viewing);
        assert!(EditMode::Viewing.is_viewing());
        assert_eq!(EditMode::Viewing.get_content(), None);
    }

    #[test]
    fn test_start_and_commit() {
        let mut state = EditState::new();
        let pos = CellPosition::new(1, 1);
        state.start_cell_edit(pos, "bad".to_string());

        assert!(state.is_editing());
        assert_eq!(state.editing_position(), Some(pos));
        assert_eq!(state.original_content(), Some("bad"));

        assert!(state.update_value("b@y.com".to_string()));
        let committed = state.commit().unwrap();
        assert_eq!(committed.position, pos);
        assert_eq!(committed.original, "bad");
        assert_eq!(committed.content, "b@y.com");
        assert!(committed.is_change());

        assert!(!state.is_editing());
        assert_eq!(state.original_content(), None);
    }

    #[test]
    fn test_commit_while_viewing() {
        let mut state = EditState::new();
        assert_eq!(state.commit(), None);
    }

    #[test]
    fn test_unchanged_commit() {
        let mut state = EditState::new();
        state.start_cell_edit(CellPosition::origin(), "same".to_string());
        assert!(!state.commit().unwrap().is_change());
    }

    #[test]
    fn test_start_typing_replaces_content() {
        let mut state = EditState::new();
        state.start_typing(CellPosition::origin(), "old".to_string(), "n");
        assert!(state.insert_text("ew"));
        assert!(state.backspace());
        assert_eq!(state.current_content(), Some("ne"));
        assert_eq!(state.original_content(), Some("old"));
    }

    #[test]
    fn test_cancel() {
        let mut state = EditState::new();
        state.start_cell_edit(CellPosition::origin(), "orig".to_string());
        state.update_value("changed".to_string());

        assert_eq!(state.cancel(), Some("orig".to_string()));
        assert!(!state.is_editing());
        assert_eq!(state.cancel(), None);
    }

    #[test]
    fn test_update_while_viewing() {
        let mut state = EditState::new();
        assert!(!state.update_value("x".to_string()));
        assert!(!state.insert_text("x"));
        assert!(!state.backspace());
    }

    #[test]
    fn test_serialization() {
        let mut state = EditState::new();
        state.start_cell_edit(CellPosition::new(2, 3), "v".to_string());

        let serialized = serde_json::to_string(&state).unwrap();
        let deserialized: EditState = serde_json::from_str(&serialized).unwrap();

        assert_eq!(state, deserialized);
    }
}
