use serde::{Deserialize, Serialize};

use super::selection::Direction;

/// Represents all user input actions the grid understands
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,

    // Selection
    ExtendUp,
    ExtendDown,
    ExtendLeft,
    ExtendRight,
    SelectAll,

    // Editing
    StartEdit,
    ConfirmEdit,
    CancelEdit,
    Delete,
    Backspace,

    // Clipboard
    Copy,
    Cut,
    Paste,

    // Other
    Undo,
    Redo,
    Find,
    NextError,

    // Character input
    InsertChar(char),

    // Unknown/unmapped
    None,
}

impl InputAction {
    /// Direction for move and extend actions
    pub fn direction(&self) -> Option<Direction> {
        match self {
            InputAction::MoveUp | InputAction::ExtendUp => Some(Direction::Up),
            InputAction::MoveDown | InputAction::ExtendDown => Some(Direction::Down),
            InputAction::MoveLeft | InputAction::ExtendLeft => Some(Direction::Left),
            InputAction::MoveRight | InputAction::ExtendRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Key codes for the keys the grid reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    F2,

    Char(char),

    Unknown,
}

/// Modifier keys state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_meta(mut self, meta: bool) -> Self {
        self.meta = meta;
        self
    }

    pub fn none_pressed(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    pub fn only_shift(&self) -> bool {
        self.shift && !self.ctrl && !self.alt && !self.meta
    }

    pub fn ctrl_or_meta(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Maps a key and modifiers to an InputAction
pub fn key_to_action(key: Key, modifiers: Modifiers) -> InputAction {
    match key {
        Key::ArrowUp if modifiers.none_pressed() => InputAction::MoveUp,
        Key::ArrowDown if modifiers.none_pressed() => InputAction::MoveDown,
        Key::ArrowLeft if modifiers.none_pressed() => InputAction::MoveLeft,
        Key::ArrowRight if modifiers.none_pressed() => InputAction::MoveRight,

        Key::ArrowUp if modifiers.only_shift() => InputAction::ExtendUp,
        Key::ArrowDown if modifiers.only_shift() => InputAction::ExtendDown,
        Key::ArrowLeft if modifiers.only_shift() => InputAction::ExtendLeft,
        Key::ArrowRight if modifiers.only_shift() => InputAction::ExtendRight,

        Key::Enter if modifiers.none_pressed() => InputAction::ConfirmEdit,
        Key::F2 => InputAction::StartEdit,
        Key::Escape => InputAction::CancelEdit,

        Key::Tab if modifiers.none_pressed() => InputAction::MoveRight,
        Key::Tab if modifiers.only_shift() => InputAction::MoveLeft,

        Key::Delete => InputAction::Delete,
        Key::Backspace => InputAction::Backspace,

        // Ctrl/Meta shortcuts
        Key::Char('a') if modifiers.ctrl_or_meta() => InputAction::SelectAll,
        Key::Char('c') if modifiers.ctrl_or_meta() => InputAction::Copy,
        Key::Char('x') if modifiers.ctrl_or_meta() => InputAction::Cut,
        Key::Char('v') if modifiers.ctrl_or_meta() => InputAction::Paste,
        Key::Char('z') | Key::Char('Z') if modifiers.ctrl_or_meta() && !modifiers.shift => {
            InputAction::Undo
        }
        Key::Char('z') | Key::Char('Z') if modifiers.ctrl_or_meta() && modifiers.shift => {
            InputAction::Redo
        }
        Key::Char('y') if modifiers.ctrl_or_meta() => InputAction::Redo,
        Key::Char('f') if modifiers.ctrl_or_meta() => InputAction::Find,
        Key::Char('e') if modifiers.ctrl_or_meta() => InputAction::NextError,

        Key::Char(c) if modifiers.none_pressed() || modifiers.only_shift() => {
            InputAction::InsertChar(c)
        }

        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        let mods = Modifiers::new();
        assert!(mods.none_pressed());
        assert!(Modifiers::new().with_shift(true).only_shift());
        assert!(Modifiers::new().with_meta(true).ctrl_or_meta());
        assert!(!Modifiers::new().with_ctrl(true).with_shift(true).only_shift());
    }

    #[test]
    fn test_arrow_keys() {
        let none = Modifiers::new();
        assert_eq!(key_to_action(Key::ArrowUp, none), InputAction::MoveUp);
        assert_eq!(key_to_action(Key::ArrowRight, none), InputAction::MoveRight);

        let shift = Modifiers::new().with_shift(true);
        assert_eq!(key_to_action(Key::ArrowDown, shift), InputAction::ExtendDown);
        assert_eq!(key_to_action(Key::ArrowLeft, shift), InputAction::ExtendLeft);
    }

    #[test]
    fn test_tab_moves_horizontally() {
        assert_eq!(key_to_action(Key::Tab, Modifiers::new()), InputAction::MoveRight);
        assert_eq!(
            key_to_action(Key::Tab, Modifiers::new().with_shift(true)),
            InputAction::MoveLeft
        );
    }

    #[test]
    fn test_editing_keys() {
        let none = Modifiers::new();
        assert_eq!(key_to_action(Key::Enter, none), InputAction::ConfirmEdit);
        assert_eq!(key_to_action(Key::F2, none), InputAction::StartEdit);
        assert_eq!(key_to_action(Key::Escape, none), InputAction::CancelEdit);
        assert_eq!(key_to_action(Key::Delete, none), InputAction::Delete);
        assert_eq!(key_to_action(Key::Char('q'), none), InputAction::InsertChar('q'));
        assert_eq!(
            key_to_action(Key::Char('Q'), Modifiers::new().with_shift(true)),
            InputAction::InsertChar('Q')
        );
    }

    #[test]
    fn test_shortcuts() {
        let ctrl = Modifiers::new().with_ctrl(true);
        let meta = Modifiers::new().with_meta(true);
        assert_eq!(key_to_action(Key::Char('c'), ctrl), InputAction::Copy);
        assert_eq!(key_to_action(Key::Char('v'), meta), InputAction::Paste);
        assert_eq!(key_to_action(Key::Char('x'), ctrl), InputAction::Cut);
        assert_eq!(key_to_action(Key::Char('a'), ctrl), InputAction::SelectAll);
        assert_eq!(key_to_action(Key::Char('z'), ctrl), InputAction::Undo);
        assert_eq!(
            key_to_action(Key::Char('z'), ctrl.with_shift(true)),
            InputAction::Redo
        );
        assert_eq!(key_to_action(Key::Char('y'), meta), InputAction::Redo);
        assert_eq!(key_to_action(Key::Char('e'), ctrl), InputAction::NextError);
    }

    #[test]
    fn test_unmapped() {
        assert_eq!(key_to_action(Key::Unknown, Modifiers::new()), InputAction::None);
        assert_eq!(
            key_to_action(Key::Char('k'), Modifiers::new().with_ctrl(true)),
            InputAction::None
        );
    }

    #[test]
    fn test_action_direction() {
        assert_eq!(InputAction::ExtendUp.direction(), Some(Direction::Up));
        assert_eq!(InputAction::Copy.direction(), None);
    }
}
