mod api;
pub mod controller;

pub use api::GridEditor;
pub use controller::{EditorError, GridController, GridListener, NoopListener, PasteOutcome, PasteRequest};

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
