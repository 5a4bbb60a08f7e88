//! Composition root of one editing session.
//!
//! Every write to the grid goes through `commit_change` or `commit_changes`,
//! so the undo log and the host callbacks see the same edits in the same
//! order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use gridedit_core::state::{
    deserialize_pasted, paste_edits, selection_rect, serialize, CellGeometry, CellRect,
};
use gridedit_core::{
    BlockShape, CellChange, CellEdit, CellPosition, ClipboardError, ClipboardProvider,
    ClipboardState, ColumnMapping, ConfigError, DataRow, EditState, EditorConfig, GridError,
    GridResult, GridStore, IncludedColumns, InputAction, ParsedSheet, ReplaceOptions,
    SearchEngine, SearchError, SearchOptions, SearchStatus, Selection, SelectionRange,
    ValidationError, ValidationOverlay,
};
use gridedit_history::{HistoryEntry, HistoryManager};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by controller operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EditorError {
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::Grid(e) => e.code(),
            EditorError::Search(e) => e.code(),
            EditorError::Config(e) => e.code(),
        }
    }
}

/// Host callbacks fired after a mutation commits
pub trait GridListener {
    /// One committed single-cell edit
    fn on_cell_edit(&mut self, _row: usize, _col: usize, _value: &str) {}

    /// One committed batch (paste, replace-all, cut, clear, bulk apply)
    fn on_bulk_edit(&mut self, _edits: &[CellEdit]) {}
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl GridListener for NoopListener {}

/// A paste waiting on a clipboard read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRequest {
    pub generation: u64,
    pub anchor: CellPosition,
}

/// Result of completing a paste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "cells", rename_all = "snake_case")]
pub enum PasteOutcome {
    /// Batch committed with this many changed cells
    Applied(usize),
    /// Nothing to paste, or nothing changed
    Empty,
    /// The grid was reloaded or the anchor left the grid while reading
    Stale,
}

/// Drives one grid editing session
pub struct GridController {
    store: GridStore,
    header_row: DataRow,
    header_row_index: usize,
    included: IncludedColumns,
    selection: Selection,
    history: HistoryManager,
    clipboard: ClipboardState,
    overlay: ValidationOverlay,
    show_only_errors: bool,
    edit: EditState,
    /// Bumped on reload; pending pastes from an older generation are dropped
    generation: u64,
    find_results: Vec<CellPosition>,
    find_cursor: Option<usize>,
    dragging: bool,
    listener: Box<dyn GridListener>,
}

impl GridController {
    pub fn new(
        sheet: ParsedSheet,
        included: IncludedColumns,
        config: &EditorConfig,
        listener: Box<dyn GridListener>,
    ) -> Self {
        Self::with_managers(
            sheet,
            included,
            config,
            HistoryManager::new(config.history_limit),
            ClipboardState::new(),
            listener,
        )
    }

    /// Build a controller around session-owned history and clipboard state
    pub fn with_managers(
        sheet: ParsedSheet,
        included: IncludedColumns,
        config: &EditorConfig,
        history: HistoryManager,
        clipboard: ClipboardState,
        listener: Box<dyn GridListener>,
    ) -> Self {
        let header_row_index = sheet.header_row_index;

        Self {
            header_row: sheet.header_row.clone(),
            store: GridStore::from(sheet),
            header_row_index,
            included,
            selection: Selection::new(),
            history,
            clipboard,
            overlay: ValidationOverlay::new(header_row_index),
            show_only_errors: config.show_only_errors,
            edit: EditState::new(),
            generation: 0,
            find_results: Vec::new(),
            find_cursor: None,
            dragging: false,
            listener,
        }
    }

    /// Replace the grid with a newly parsed file.
    ///
    /// Selection, history, editing and find state reset with the store. The
    /// internal copy buffer survives so a block can be pasted into the new
    /// file.
    pub fn reload(&mut self, sheet: ParsedSheet) {
        self.header_row_index = sheet.header_row_index;
        self.header_row = sheet.header_row.clone();
        self.store = GridStore::from(sheet);
        self.generation += 1;

        self.selection.clear();
        self.history.clear();
        self.edit = EditState::new();
        self.overlay = ValidationOverlay::new(self.header_row_index);
        self.find_results.clear();
        self.find_cursor = None;
        self.dragging = false;

        tracing::debug!(
            generation = self.generation,
            rows = self.store.row_count(),
            "grid reloaded"
        );
    }

    /// Replace the host callbacks
    pub fn set_listener(&mut self, listener: Box<dyn GridListener>) {
        self.listener = listener;
    }

    pub fn set_included_columns(&mut self, included: IncludedColumns) {
        self.included = included;
        if let Some(pos) = self.edit.editing_position() {
            if !self.included.contains(pos.col) {
                tracing::debug!(col = pos.col, "column unmapped, closing editor");
                self.edit.cancel();
            }
        }
        self.selection.clamp_to(&self.included, self.store.row_count());
        self.find_results.clear();
        self.find_cursor = None;
    }

    pub fn set_column_mapping(&mut self, mapping: &BTreeMap<usize, ColumnMapping>) {
        self.set_included_columns(IncludedColumns::from_mapping(mapping));
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    pub fn header_row(&self) -> &DataRow {
        &self.header_row
    }

    pub fn header_row_index(&self) -> usize {
        self.header_row_index
    }

    pub fn included_columns(&self) -> &IncludedColumns {
        &self.included
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn clipboard(&self) -> &ClipboardState {
        &self.clipboard
    }

    pub fn overlay(&self) -> &ValidationOverlay {
        &self.overlay
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    /// Current values for submission
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.store.to_rows()
    }

    // --- Mutation path ---

    fn check_target(&self, row: usize, col: usize) -> GridResult<()> {
        if row >= self.store.row_count() {
            tracing::warn!(row, rows = self.store.row_count(), "edit outside the grid rejected");
            return Err(GridError::RowOutOfBounds {
                row,
                row_count: self.store.row_count(),
            });
        }
        if !self.included.contains(col) {
            tracing::warn!(col, "edit to an unmapped column rejected");
            return Err(GridError::ColumnNotIncluded { col });
        }
        Ok(())
    }

    /// Commit one cell change, record it and notify the host.
    /// Returns `false` when the value was already in place.
    fn commit_change(&mut self, change: CellChange) -> GridResult<bool> {
        if change.is_noop() {
            return Ok(false);
        }

        let (row, col) = (change.row, change.col);
        let value = change.new_value.clone();
        self.store = self
            .history
            .execute(HistoryEntry::Edit(change), &self.store)?;

        tracing::debug!(row, col, "cell edit committed");
        self.listener.on_cell_edit(row, col, &value);
        Ok(true)
    }

    /// Commit a batch as one undo step and one bulk notification.
    /// Cells whose final value equals their value before the batch are
    /// dropped; an empty batch commits nothing.
    fn commit_changes(&mut self, changes: Vec<CellChange>) -> GridResult<usize> {
        let mut net: HashMap<(usize, usize), (&str, &str)> = HashMap::new();
        for c in &changes {
            net.entry((c.row, c.col))
                .and_modify(|(_, last)| *last = c.new_value.as_str())
                .or_insert((c.old_value.as_str(), c.new_value.as_str()));
        }
        let unchanged: HashSet<(usize, usize)> = net
            .into_iter()
            .filter(|(_, (first, last))| first == last)
            .map(|(cell, _)| cell)
            .collect();

        let changes: Vec<CellChange> = changes
            .into_iter()
            .filter(|c| !c.is_noop() && !unchanged.contains(&(c.row, c.col)))
            .collect();
        if changes.is_empty() {
            return Ok(0);
        }

        let entry = HistoryEntry::bulk(changes);
        let forward = entry.forward_edits();
        self.store = self.history.execute(entry, &self.store)?;

        tracing::debug!(cells = forward.len(), "bulk edit committed");
        self.listener.on_bulk_edit(&forward);
        Ok(forward.len())
    }

    fn commit_edits(&mut self, edits: &[CellEdit]) -> GridResult<usize> {
        let changes = self.store.diff(edits);
        self.commit_changes(changes)
    }

    /// Set one cell directly. Returns whether the value changed.
    pub fn set_cell_value(&mut self, row: usize, col: usize, value: impl Into<String>) -> GridResult<bool> {
        self.check_target(row, col)?;
        let change = CellChange::new(row, col, self.store.value_at(row, col), value);
        self.commit_change(change)
    }

    /// Apply externally generated fixes as one batch.
    ///
    /// Edits aimed outside the grid or at unmapped columns are dropped.
    /// Later edits to the same cell win.
    pub fn apply_bulk_edit(&mut self, edits: Vec<CellEdit>) -> GridResult<usize> {
        let total = edits.len();
        let row_count = self.store.row_count();
        let kept: Vec<CellEdit> = edits
            .into_iter()
            .filter(|e| e.row < row_count && self.included.contains(e.col))
            .collect();

        if kept.len() < total {
            tracing::warn!(
                dropped = total - kept.len(),
                "bulk edit entries outside the grid ignored"
            );
        }
        self.commit_edits(&kept)
    }

    /// Undo the last entry. The host is not notified; it can inspect the
    /// returned entry.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        self.edit.cancel();
        match self.history.undo(&self.store) {
            Ok(Some((store, entry))) => {
                self.store = store;
                tracing::debug!(cells = entry.len(), "undo");
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("undo failed: {}", e);
                None
            }
        }
    }

    /// Redo the last undone entry
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        self.edit.cancel();
        match self.history.redo(&self.store) {
            Ok(Some((store, entry))) => {
                self.store = store;
                tracing::debug!(cells = entry.len(), "redo");
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("redo failed: {}", e);
                None
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Cell editor ---

    fn editable(&self, pos: CellPosition) -> bool {
        pos.row < self.store.row_count() && self.included.contains(pos.col)
    }

    /// Open the editor on the active cell
    pub fn start_edit(&mut self) -> bool {
        match self.selection.active_cell() {
            Some(pos) => self.start_edit_at(pos),
            None => false,
        }
    }

    /// Open the editor on `pos`. An editor open on another cell is
    /// committed first.
    pub fn start_edit_at(&mut self, pos: CellPosition) -> bool {
        if !self.editable(pos) {
            return false;
        }
        match self.edit.editing_position() {
            Some(current) if current == pos => return true,
            Some(_) => {
                if let Err(e) = self.commit_edit() {
                    tracing::warn!("pending edit dropped: {}", e);
                }
            }
            None => {}
        }
        self.selection.start_selection(pos);
        let value = self.store.value_at(pos.row, pos.col).to_string();
        self.edit.start_cell_edit(pos, value);
        true
    }

    /// Type a character: appends while editing, otherwise replaces the
    /// active cell's content with it
    pub fn type_char(&mut self, c: char) -> bool {
        let mut buf = [0u8; 4];
        let typed = c.encode_utf8(&mut buf);
        if self.edit.is_editing() {
            return self.edit.insert_text(typed);
        }

        let Some(pos) = self.selection.active_cell() else {
            return false;
        };
        if !self.editable(pos) {
            return false;
        }
        let original = self.store.value_at(pos.row, pos.col).to_string();
        self.edit.start_typing(pos, original, typed);
        true
    }

    pub fn update_edit_value(&mut self, value: impl Into<String>) -> bool {
        self.edit.update_value(value.into())
    }

    /// Close the editor and commit its content as one cell edit
    pub fn commit_edit(&mut self) -> GridResult<bool> {
        let Some(committed) = self.edit.commit() else {
            return Ok(false);
        };
        if !committed.is_change() {
            return Ok(false);
        }
        let pos = committed.position;
        self.check_target(pos.row, pos.col)?;

        let change = CellChange::new(
            pos.row,
            pos.col,
            self.store.value_at(pos.row, pos.col),
            committed.content,
        );
        self.commit_change(change)
    }

    pub fn cancel_edit(&mut self) -> Option<String> {
        self.edit.cancel()
    }

    // --- Selection ---

    /// Select `start..=end`, clamped onto the grid
    pub fn select_range(&mut self, start: CellPosition, end: CellPosition) {
        self.selection.set_range(Some(SelectionRange::new(start, end)));
        self.selection.clamp_to(&self.included, self.store.row_count());
    }

    pub fn clear_selection_range(&mut self) {
        self.selection.clear();
    }

    pub fn pointer_down(&mut self, pos: CellPosition, shift: bool) {
        if !self.editable(pos) {
            return;
        }
        if self.edit.is_editing() {
            if let Err(e) = self.commit_edit() {
                tracing::warn!("pending edit dropped: {}", e);
            }
        }

        if shift {
            self.selection.extend_selection(pos);
        } else {
            self.selection.start_selection(pos);
        }
        self.dragging = true;
    }

    pub fn pointer_drag(&mut self, pos: CellPosition) {
        if self.dragging && self.editable(pos) {
            self.selection.extend_selection(pos);
        }
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    // --- Clipboard ---

    /// Copy the selected block to `provider` and the internal buffer.
    /// Returns the copied text.
    pub fn copy(&mut self, provider: &mut dyn ClipboardProvider) -> Option<String> {
        let range = self.selection.range()?;
        let cells = range.cells(&self.included);
        if cells.is_empty() {
            return None;
        }

        let values: Vec<&str> = cells
            .iter()
            .map(|pos| self.store.value_at(pos.row, pos.col))
            .collect();
        let text = serialize(&values, BlockShape::of(&range, &self.included));

        if let Err(e) = provider.set_text(&text) {
            tracing::warn!("system clipboard write failed, keeping internal copy: {}", e);
        }
        self.clipboard.copy(text.clone(), range);
        Some(text)
    }

    /// Copy, then clear the selected cells as one batch
    pub fn cut(&mut self, provider: &mut dyn ClipboardProvider) -> GridResult<usize> {
        if self.copy(provider).is_none() {
            return Ok(0);
        }
        self.clear_selection()
    }

    /// Empty every selected cell as one batch; cells already empty are
    /// not recorded
    pub fn clear_selection(&mut self) -> GridResult<usize> {
        let row_count = self.store.row_count();
        let edits: Vec<CellEdit> = self
            .selection
            .cells_in_selection(&self.included)
            .into_iter()
            .filter(|pos| pos.row < row_count && !self.store.value_at(pos.row, pos.col).is_empty())
            .map(|pos| CellEdit::new(pos.row, pos.col, ""))
            .collect();
        self.commit_edits(&edits)
    }

    /// Capture the paste target before reading the clipboard
    pub fn begin_paste(&self) -> Option<PasteRequest> {
        let range = self.selection.range()?;
        Some(PasteRequest {
            generation: self.generation,
            anchor: range.top_left(),
        })
    }

    /// Complete a paste once the clipboard read resolved
    pub fn finish_paste(
        &mut self,
        request: PasteRequest,
        read: Result<String, ClipboardError>,
    ) -> GridResult<PasteOutcome> {
        if request.generation != self.generation {
            tracing::warn!(
                requested = request.generation,
                current = self.generation,
                "dropping paste from a previous grid"
            );
            return Ok(PasteOutcome::Stale);
        }
        let anchor = request.anchor;
        if anchor.row >= self.store.row_count() || !self.included.contains(anchor.col) {
            tracing::warn!(row = anchor.row, col = anchor.col, "paste anchor left the grid");
            return Ok(PasteOutcome::Stale);
        }

        let Some(text) = self.clipboard.resolve_paste(read) else {
            return Ok(PasteOutcome::Empty);
        };
        let block = deserialize_pasted(&text);
        let edits = paste_edits(&block, anchor, self.store.row_count(), &self.included);

        match self.commit_edits(&edits)? {
            0 => Ok(PasteOutcome::Empty),
            n => Ok(PasteOutcome::Applied(n)),
        }
    }

    /// Synchronous paste for hosts whose clipboard read does not block
    pub fn paste(&mut self, provider: &mut dyn ClipboardProvider) -> GridResult<PasteOutcome> {
        let Some(request) = self.begin_paste() else {
            return Ok(PasteOutcome::Empty);
        };
        let read = provider.get_text();
        self.finish_paste(request, read)
    }

    // --- Find / replace ---

    /// Run a search and remember its matches for [`Self::find_next`]
    pub fn find(&mut self, options: &SearchOptions) -> SearchStatus {
        let result = SearchEngine::find(&self.store, &self.included, options);
        let status = SearchStatus::from_result(&result);
        self.find_results = result.unwrap_or_default();
        self.find_cursor = None;
        status
    }

    pub fn find_results(&self) -> &[CellPosition] {
        &self.find_results
    }

    /// Select the next remembered match, wrapping at the end
    pub fn find_next(&mut self) -> Option<CellPosition> {
        if self.find_results.is_empty() {
            return None;
        }
        let next = match self.find_cursor {
            Some(i) => (i + 1) % self.find_results.len(),
            None => 0,
        };
        self.find_cursor = Some(next);

        let pos = self.find_results[next];
        self.selection.start_selection(pos);
        Some(pos)
    }

    /// Replace every match as one batch. Returns the number of changed cells.
    pub fn replace_all(&mut self, options: &ReplaceOptions) -> Result<usize, EditorError> {
        let changes = SearchEngine::replace_all(&self.store, &self.included, options)?;
        let count = self.commit_changes(changes)?;
        self.find_results.clear();
        self.find_cursor = None;
        Ok(count)
    }

    // --- Validation ---

    /// Swap in a fresh error list from the validator
    pub fn set_validation_errors(&mut self, errors: &[ValidationError]) {
        self.overlay = ValidationOverlay::build(errors, self.header_row_index, self.store.row_count());
    }

    pub fn set_show_only_errors(&mut self, on: bool) {
        self.show_only_errors = on;
    }

    pub fn show_only_errors(&self) -> bool {
        self.show_only_errors
    }

    /// Data rows to render, paired with their original index
    pub fn visible_rows(&self) -> Vec<(usize, &Arc<DataRow>)> {
        self.overlay
            .visible_rows(self.store.rows(), self.show_only_errors)
    }

    pub fn visible_row_indices(&self) -> Vec<usize> {
        self.overlay
            .visible_row_indices(self.store.row_count(), self.show_only_errors)
    }

    /// Select the first erroring cell on the next row with errors
    pub fn jump_to_next_error(&mut self) -> Option<CellPosition> {
        let after = self.selection.active_cell().map(|p| p.row);
        let row = self.overlay.next_error_row(after)?;
        let col = self
            .included
            .iter()
            .find(|&col| self.overlay.error_at(row, col).is_some())
            .or_else(|| self.included.first())?;

        let pos = CellPosition::new(row, col);
        self.selection.start_selection(pos);
        Some(pos)
    }

    // --- Render queries ---

    pub fn value_at(&self, row: usize, col: usize) -> &str {
        self.store.value_at(row, col)
    }

    pub fn error_at(&self, row: usize, col: usize) -> Option<&str> {
        self.overlay.error_at(row, col)
    }

    pub fn is_selected(&self, pos: CellPosition) -> bool {
        self.selection.is_selected(pos)
    }

    pub fn is_in_selection_range(&self, pos: CellPosition) -> bool {
        self.selection.contains(pos) && self.included.contains(pos.col)
    }

    pub fn selection_rect(&self, geometry: &dyn CellGeometry) -> Option<CellRect> {
        let range = self.selection.range()?;
        selection_rect(&range, geometry, &self.included)
    }

    // --- Keyboard ---

    /// Dispatch a mapped key press
    pub fn handle_action(
        &mut self,
        action: InputAction,
        provider: &mut dyn ClipboardProvider,
    ) -> Result<(), EditorError> {
        let row_count = self.store.row_count();

        if self.edit.is_editing() {
            match action {
                InputAction::ConfirmEdit => {
                    self.commit_edit()?;
                }
                InputAction::CancelEdit => {
                    self.edit.cancel();
                }
                InputAction::Backspace => {
                    self.edit.backspace();
                }
                InputAction::InsertChar(c) => {
                    self.type_char(c);
                }
                InputAction::MoveUp
                | InputAction::MoveDown
                | InputAction::MoveLeft
                | InputAction::MoveRight => {
                    self.commit_edit()?;
                    if let Some(direction) = action.direction() {
                        self.selection.move_focus(direction, &self.included, row_count);
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match action {
            InputAction::MoveUp
            | InputAction::MoveDown
            | InputAction::MoveLeft
            | InputAction::MoveRight => {
                if let Some(direction) = action.direction() {
                    self.selection.move_focus(direction, &self.included, row_count);
                }
            }
            InputAction::ExtendUp
            | InputAction::ExtendDown
            | InputAction::ExtendLeft
            | InputAction::ExtendRight => {
                if let Some(direction) = action.direction() {
                    self.selection.extend_focus(direction, &self.included, row_count);
                }
            }
            InputAction::SelectAll => self.selection.select_all(&self.included, row_count),
            InputAction::StartEdit | InputAction::ConfirmEdit => {
                self.start_edit();
            }
            InputAction::Delete | InputAction::Backspace => {
                self.clear_selection()?;
            }
            InputAction::Copy => {
                self.copy(provider);
            }
            InputAction::Cut => {
                self.cut(provider)?;
            }
            InputAction::Paste => {
                self.paste(provider)?;
            }
            InputAction::Undo => {
                self.undo();
            }
            InputAction::Redo => {
                self.redo();
            }
            InputAction::NextError => {
                self.jump_to_next_error();
            }
            InputAction::InsertChar(c) => {
                self.type_char(c);
            }
            // The find panel belongs to the host
            InputAction::Find | InputAction::CancelEdit | InputAction::None => {}
        }
        Ok(())
    }
}

impl std::fmt::Debug for GridController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridController")
            .field("rows", &self.store.row_count())
            .field("included", &self.included)
            .field("selection", &self.selection)
            .field("history", &self.history)
            .field("generation", &self.generation)
            .finish()
    }
}
