use std::collections::BTreeMap;

use gridedit_core::state::key_to_action;
use gridedit_core::{
    CellEdit, CellPosition, ClipboardError, ClipboardProvider, ColumnMapping, DataRow,
    EditorConfig, IncludedColumns, Key, Modifiers, ParsedSheet, ReplaceOptions, SearchEngine,
    SearchError, SearchOptions, SearchStatus, ValidationError,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::controller::{EditorError, GridController, GridListener, PasteOutcome, PasteRequest};

/// Grid editor exposed to JavaScript
#[wasm_bindgen]
pub struct GridEditor {
    controller: GridController,
}

/// Structured error object for JavaScript
#[derive(Debug, Serialize)]
pub struct JsGridError {
    code: String,
    message: String,
}

impl From<EditorError> for JsGridError {
    fn from(err: EditorError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl JsGridError {
    fn from_error<E: std::fmt::Display>(err: E) -> JsValue {
        let error = Self {
            code: "ERROR".to_string(),
            message: err.to_string(),
        };
        serde_wasm_bindgen::to_value(&error).unwrap_or(JsValue::NULL)
    }
}

fn to_js_error<E: Into<EditorError>>(err: E) -> JsValue {
    let js_error = JsGridError::from(err.into());
    serde_wasm_bindgen::to_value(&js_error).unwrap_or(JsValue::NULL)
}

/// Forwards controller events to JavaScript callbacks
#[derive(Default)]
struct JsListener {
    on_cell_edit: Option<js_sys::Function>,
    on_bulk_edit: Option<js_sys::Function>,
}

impl GridListener for JsListener {
    fn on_cell_edit(&mut self, row: usize, col: usize, value: &str) {
        let Some(callback) = &self.on_cell_edit else {
            return;
        };
        let result = callback.call3(
            &JsValue::NULL,
            &JsValue::from(row as u32),
            &JsValue::from(col as u32),
            &JsValue::from_str(value),
        );
        if let Err(e) = result {
            tracing::warn!("onCellEdit callback threw: {:?}", e);
        }
    }

    fn on_bulk_edit(&mut self, edits: &[CellEdit]) {
        let Some(callback) = &self.on_bulk_edit else {
            return;
        };
        let payload = serde_wasm_bindgen::to_value(edits).unwrap_or(JsValue::NULL);
        if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
            tracing::warn!("onBulkEdit callback threw: {:?}", e);
        }
    }
}

/// Clipboard seen from the synchronous keyboard path: writes are captured
/// for the host to forward, reads are done by the host through
/// `beginPaste`/`finishPaste`.
#[derive(Default)]
struct HostClipboard {
    written: Option<String>,
}

impl ClipboardProvider for HostClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable(
            "system clipboard is read by the host".to_string(),
        ))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.written = Some(text.to_string());
        Ok(())
    }
}

/// Map a DOM `KeyboardEvent.key` value
fn parse_key(key: &str) -> Key {
    match key {
        "ArrowUp" => Key::ArrowUp,
        "ArrowDown" => Key::ArrowDown,
        "ArrowLeft" => Key::ArrowLeft,
        "ArrowRight" => Key::ArrowRight,
        "Enter" => Key::Enter,
        "Tab" => Key::Tab,
        "Escape" | "Esc" => Key::Escape,
        "Backspace" => Key::Backspace,
        "Delete" | "Del" => Key::Delete,
        "F2" => Key::F2,
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c),
                _ => Key::Unknown,
            }
        }
    }
}

fn parse_sheet(rows_json: &str, header_json: &str, header_row_index: usize) -> serde_json::Result<ParsedSheet> {
    let data_rows: Vec<Vec<String>> = serde_json::from_str(rows_json)?;
    let header: Vec<String> = serde_json::from_str(header_json)?;
    Ok(ParsedSheet {
        header_row: DataRow::new(header),
        data_rows: data_rows.into_iter().map(DataRow::new).collect(),
        header_row_index,
    })
}

fn parse_mapping(mapping_json: &str) -> serde_json::Result<IncludedColumns> {
    let mapping: BTreeMap<usize, ColumnMapping> = serde_json::from_str(mapping_json)?;
    Ok(IncludedColumns::from_mapping(&mapping))
}

/// Message for a pattern that won't compile, `None` when it's usable
fn pattern_error(options: &SearchOptions) -> Option<String> {
    match SearchEngine::validate(options) {
        Ok(()) => None,
        Err(SearchError::InvalidPattern(msg)) => Some(msg),
    }
}

#[wasm_bindgen]
impl GridEditor {
    /// Create an editor over parsed rows.
    ///
    /// `rows_json`: `[["John","a@x.com"], ...]`, `header_json`: `["name","email"]`,
    /// `mapping_json`: `{"0": {"id": "name", "include": true}, ...}`,
    /// `config_json`: `{"historyLimit": 50, "headerRowIndex": 0, "showOnlyErrors": false}`
    #[wasm_bindgen(constructor)]
    pub fn new(
        rows_json: &str,
        header_json: &str,
        mapping_json: &str,
        config_json: &str,
    ) -> Result<GridEditor, JsValue> {
        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config_json).map_err(to_js_error)?
        };
        let sheet = parse_sheet(rows_json, header_json, config.header_row_index)
            .map_err(JsGridError::from_error)?;
        let included = parse_mapping(mapping_json).map_err(JsGridError::from_error)?;

        Ok(Self {
            controller: GridController::new(
                sheet,
                included,
                &config,
                Box::new(JsListener::default()),
            ),
        })
    }

    /// Register `(dataRow, col, value) => void` and `(edits) => void`
    #[wasm_bindgen(js_name = setCallbacks)]
    pub fn set_callbacks(&mut self, on_cell_edit: Option<js_sys::Function>, on_bulk_edit: Option<js_sys::Function>) {
        self.controller.set_listener(Box::new(JsListener {
            on_cell_edit,
            on_bulk_edit,
        }));
    }

    /// Load a new file; pending pastes become stale
    pub fn reload(&mut self, rows_json: &str, header_json: &str, header_row_index: usize) -> Result<(), JsValue> {
        let sheet = parse_sheet(rows_json, header_json, header_row_index)
            .map_err(JsGridError::from_error)?;
        self.controller.reload(sheet);
        Ok(())
    }

    #[wasm_bindgen(js_name = setColumnMapping)]
    pub fn set_column_mapping(&mut self, mapping_json: &str) -> Result<(), JsValue> {
        let included = parse_mapping(mapping_json).map_err(JsGridError::from_error)?;
        self.controller.set_included_columns(included);
        Ok(())
    }

    // --- Render queries ---

    #[wasm_bindgen(js_name = rowCount)]
    pub fn row_count(&self) -> usize {
        self.controller.row_count()
    }

    #[wasm_bindgen(js_name = valueAt)]
    pub fn value_at(&self, row: usize, col: usize) -> String {
        self.controller.value_at(row, col).to_string()
    }

    #[wasm_bindgen(js_name = errorAt)]
    pub fn error_at(&self, row: usize, col: usize) -> Option<String> {
        self.controller.error_at(row, col).map(String::from)
    }

    #[wasm_bindgen(js_name = isSelected)]
    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        self.controller.is_selected(CellPosition::new(row, col))
    }

    #[wasm_bindgen(js_name = isInSelectionRange)]
    pub fn is_in_selection_range(&self, row: usize, col: usize) -> bool {
        self.controller.is_in_selection_range(CellPosition::new(row, col))
    }

    /// Returns JSON `{start, end}` or `null`
    #[wasm_bindgen(js_name = getSelection)]
    pub fn get_selection(&self) -> String {
        serde_json::to_string(&self.controller.selection().range()).unwrap_or_else(|_| "null".to_string())
    }

    /// Returns JSON array of data-row indices to render
    #[wasm_bindgen(js_name = visibleRows)]
    pub fn visible_rows(&self) -> String {
        serde_json::to_string(&self.controller.visible_row_indices()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Returns the current values as a JSON array of rows
    #[wasm_bindgen(js_name = exportRows)]
    pub fn export_rows(&self) -> String {
        serde_json::to_string(&self.controller.to_rows()).unwrap_or_else(|_| "[]".to_string())
    }

    // --- Editing ---

    #[wasm_bindgen(js_name = setCellValue)]
    pub fn set_cell_value(&mut self, row: usize, col: usize, value: &str) -> Result<bool, JsValue> {
        self.controller
            .set_cell_value(row, col, value)
            .map_err(to_js_error)
    }

    /// Apply a JSON array of `{dataRow, col, value}` as one undo step.
    /// Returns the number of changed cells.
    #[wasm_bindgen(js_name = applyBulkEdit)]
    pub fn apply_bulk_edit(&mut self, edits_json: &str) -> Result<usize, JsValue> {
        let edits: Vec<CellEdit> = serde_json::from_str(edits_json).map_err(JsGridError::from_error)?;
        self.controller.apply_bulk_edit(edits).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = startEdit)]
    pub fn start_edit(&mut self, row: usize, col: usize) -> bool {
        self.controller.start_edit_at(CellPosition::new(row, col))
    }

    #[wasm_bindgen(js_name = updateEdit)]
    pub fn update_edit(&mut self, value: &str) -> bool {
        self.controller.update_edit_value(value)
    }

    #[wasm_bindgen(js_name = commitEdit)]
    pub fn commit_edit(&mut self) -> Result<bool, JsValue> {
        self.controller.commit_edit().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = cancelEdit)]
    pub fn cancel_edit(&mut self) -> Option<String> {
        self.controller.cancel_edit()
    }

    /// Returns the editor buffer while a cell is being edited
    #[wasm_bindgen(js_name = editValue)]
    pub fn edit_value(&self) -> Option<String> {
        self.controller
            .edit_state()
            .current_content()
            .map(String::from)
    }

    // --- Undo/Redo ---

    /// Undo the last entry; returns it as JSON or `null`
    #[wasm_bindgen]
    pub fn undo(&mut self) -> String {
        match self.controller.undo() {
            Some(entry) => serde_json::to_string(&entry).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Redo the last undone entry; returns it as JSON or `null`
    #[wasm_bindgen]
    pub fn redo(&mut self) -> String {
        match self.controller.redo() {
            Some(entry) => serde_json::to_string(&entry).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.controller.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.controller.can_redo()
    }

    // --- Selection and input ---

    #[wasm_bindgen(js_name = selectRange)]
    pub fn select_range(&mut self, start_row: usize, start_col: usize, end_row: usize, end_col: usize) {
        self.controller.select_range(
            CellPosition::new(start_row, start_col),
            CellPosition::new(end_row, end_col),
        );
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, row: usize, col: usize, shift: bool) {
        self.controller.pointer_down(CellPosition::new(row, col), shift);
    }

    #[wasm_bindgen(js_name = pointerDrag)]
    pub fn pointer_drag(&mut self, row: usize, col: usize) {
        self.controller.pointer_drag(CellPosition::new(row, col));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    /// Handle a key press. Returns text the host should write to the
    /// system clipboard (after copy or cut), if any.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> Result<Option<String>, JsValue> {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let action = key_to_action(parse_key(key), modifiers);

        let mut clipboard = HostClipboard::default();
        self.controller
            .handle_action(action, &mut clipboard)
            .map_err(to_js_error)?;
        Ok(clipboard.written)
    }

    // --- Clipboard ---

    /// Copy the selection; returns the text for the system clipboard
    pub fn copy(&mut self) -> Option<String> {
        let mut clipboard = HostClipboard::default();
        self.controller.copy(&mut clipboard)
    }

    /// Cut the selection; returns the text for the system clipboard
    pub fn cut(&mut self) -> Result<Option<String>, JsValue> {
        let mut clipboard = HostClipboard::default();
        self.controller.cut(&mut clipboard).map_err(to_js_error)?;
        Ok(clipboard.written)
    }

    /// Start a paste; returns an opaque JSON token or `null` when nothing
    /// is selected. Pass it to `finishPaste` once the clipboard read settles.
    #[wasm_bindgen(js_name = beginPaste)]
    pub fn begin_paste(&self) -> Option<String> {
        self.controller
            .begin_paste()
            .and_then(|request| serde_json::to_string(&request).ok())
    }

    /// Complete a paste. `text` is `undefined` when the read failed; the
    /// last copied block is used instead. Returns JSON `{status, cells?}`.
    #[wasm_bindgen(js_name = finishPaste)]
    pub fn finish_paste(&mut self, token: &str, text: Option<String>) -> Result<String, JsValue> {
        let request: PasteRequest = serde_json::from_str(token).map_err(JsGridError::from_error)?;
        let read = text.ok_or_else(|| ClipboardError::Unavailable("read rejected".to_string()));
        let outcome: PasteOutcome = self
            .controller
            .finish_paste(request, read)
            .map_err(to_js_error)?;
        serde_json::to_string(&outcome).map_err(JsGridError::from_error)
    }

    // --- Find/Replace ---

    /// Find matching cells.
    ///
    /// options_json format:
    /// {
    ///   "pattern": "Doe",
    ///   "case_sensitive": false,
    ///   "whole_word": true,
    ///   "use_regex": false,
    ///   "column_scope": "included"  // or {"single": 2}
    /// }
    ///
    /// Returns JSON `{status, detail}`
    #[wasm_bindgen]
    pub fn find(&mut self, options_json: &str) -> Result<String, JsValue> {
        let options: SearchOptions = serde_json::from_str(options_json)
            .map_err(JsGridError::from_error)?;
        let status = self.controller.find(&options);
        serde_json::to_string(&status).map_err(JsGridError::from_error)
    }

    /// Check the pattern as the user types; returns the error message for a
    /// bad regex, or `undefined`
    #[wasm_bindgen(js_name = checkPattern)]
    pub fn check_pattern(&self, options_json: &str) -> Result<Option<String>, JsValue> {
        let options: SearchOptions = serde_json::from_str(options_json)
            .map_err(JsGridError::from_error)?;
        Ok(pattern_error(&options))
    }

    /// Returns JSON array of the last find's positions
    #[wasm_bindgen(js_name = findResults)]
    pub fn find_results(&self) -> String {
        serde_json::to_string(self.controller.find_results()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Select the next match; returns it as JSON or `null`
    #[wasm_bindgen(js_name = findNext)]
    pub fn find_next(&mut self) -> String {
        serde_json::to_string(&self.controller.find_next()).unwrap_or_else(|_| "null".to_string())
    }

    /// Replace all matches as one undo step.
    ///
    /// options_json is the find format plus `"replacement"`. A bad regex is
    /// reported as a status, not thrown. Returns JSON `{status, detail}`.
    #[wasm_bindgen(js_name = replaceAll)]
    pub fn replace_all(&mut self, options_json: &str) -> Result<String, JsValue> {
        let options: ReplaceOptions = serde_json::from_str(options_json)
            .map_err(JsGridError::from_error)?;

        let status = match self.controller.replace_all(&options) {
            Ok(0) => SearchStatus::NoMatches,
            Ok(n) => SearchStatus::Matches(n),
            Err(EditorError::Search(e)) => SearchStatus::from_result::<()>(&Err(e)),
            Err(e) => return Err(to_js_error(e)),
        };
        serde_json::to_string(&status).map_err(JsGridError::from_error)
    }

    // --- Validation ---

    /// Replace the error list with a JSON array of
    /// `{rowIndex, columnIndex, message}` in display-row coordinates
    #[wasm_bindgen(js_name = setValidationErrors)]
    pub fn set_validation_errors(&mut self, errors_json: &str) -> Result<(), JsValue> {
        let errors: Vec<ValidationError> = serde_json::from_str(errors_json)
            .map_err(JsGridError::from_error)?;
        self.controller.set_validation_errors(&errors);
        Ok(())
    }

    #[wasm_bindgen(js_name = setShowOnlyErrors)]
    pub fn set_show_only_errors(&mut self, on: bool) {
        self.controller.set_show_only_errors(on);
    }

    #[wasm_bindgen(js_name = errorCount)]
    pub fn error_count(&self) -> usize {
        self.controller.overlay().error_count()
    }

    /// Returns JSON array of data rows with errors
    #[wasm_bindgen(js_name = rowsWithErrors)]
    pub fn rows_with_errors(&self) -> String {
        serde_json::to_string(self.controller.overlay().rows_with_errors())
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Select the next erroring cell; returns it as JSON or `null`
    #[wasm_bindgen(js_name = jumpToNextError)]
    pub fn jump_to_next_error(&mut self) -> String {
        serde_json::to_string(&self.controller.jump_to_next_error()).unwrap_or_else(|_| "null".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("ArrowLeft"), Key::ArrowLeft);
        assert_eq!(parse_key("Esc"), Key::Escape);
        assert_eq!(parse_key("a"), Key::Char('a'));
        assert_eq!(parse_key("é"), Key::Char('é'));
        assert_eq!(parse_key("Shift"), Key::Unknown);
        assert_eq!(parse_key(""), Key::Unknown);
    }

    #[test]
    fn test_parse_sheet_and_mapping() {
        let sheet = parse_sheet(r#"[["John","a@x.com"],["Jane"]]"#, r#"["name","email"]"#, 2).unwrap();
        assert_eq!(sheet.data_rows.len(), 2);
        assert_eq!(sheet.header_row.get(1), "email");
        assert_eq!(sheet.header_row_index, 2);

        let included = parse_mapping(
            r#"{"0":{"id":"name","include":true},"1":{"id":"email","include":false},"3":{"id":"x","include":true}}"#,
        )
        .unwrap();
        assert_eq!(included.as_slice(), &[0, 3]);

        assert!(parse_mapping("[1,2]").is_err());
    }

    #[test]
    fn test_pattern_error() {
        assert_eq!(pattern_error(&SearchOptions::new("(a|b)").regex(true)), None);
        assert_eq!(pattern_error(&SearchOptions::new("(").regex(false)), None);
        assert!(pattern_error(&SearchOptions::new("(").regex(true)).is_some());
    }

    #[test]
    fn test_host_clipboard_captures_writes() {
        let mut clipboard = HostClipboard::default();
        assert!(clipboard.get_text().is_err());
        clipboard.set_text("a\tb").unwrap();
        assert_eq!(clipboard.written.as_deref(), Some("a\tb"));
    }

    #[test]
    fn test_js_error_from_editor_error() {
        let err = EditorError::from(gridedit_core::GridError::ColumnNotIncluded { col: 4 });
        let js = JsGridError::from(err);
        assert_eq!(js.code, "COLUMN_NOT_INCLUDED");
        assert_eq!(js.message, "column 4 is not part of the active mapping");
    }
}
