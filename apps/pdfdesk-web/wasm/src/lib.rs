//! WASM bindings for the pdfdesk editor and tool dialogs
//!
//! All state is held in Rust; JavaScript renders PDF pages (PDF.js),
//! forwards DOM events and reads files.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfEditor, ToolSession } from './pkg/pdfdesk_wasm.js';
//!
//! await init();
//!
//! // Viewer / annotator
//! const editor = new PdfEditor();
//! const ticket = editor.openBytes(file.name, bytes);
//! const pdf = await pdfjsLib.getDocument(bytes).promise;
//! editor.documentLoaded(ticket, pdf.numPages);
//! editor.selectTool("rectangle");
//! editor.render(overlayCtx, 1.0);
//!
//! // Export: rasterize each planned page, then assemble and download
//! const pages = editor.beginExport();
//! const pngs = await Promise.all(pages.map(rasterizePage));
//! editor.finishExport(pngs);
//!
//! // Tool dialog
//! const session = new ToolSession("merge-pdf", SUPABASE_URL);
//! session.setCredentials(ANON_KEY, accessToken);
//! session.stageFile(a.name, a.type, bytesA);
//! session.stageFile(b.name, b.type, bytesB);
//! session.commitFiles();
//! const result = await session.submit();
//! ```

pub mod download;
pub mod editor;
pub mod render;
pub mod tool_session;

use wasm_bindgen::prelude::*;

pub use editor::PdfEditor;
pub use tool_session::ToolSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Format bytes as "1.5 MB"
#[wasm_bindgen(js_name = formatFileSize)]
pub fn format_file_size(bytes: f64) -> String {
    pdfdesk_core::format_file_size(bytes.max(0.0) as u64)
}

/// Page count, version and metadata of a PDF, before opening it.
/// Rejects files that are not PDFs or have no pages.
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pdfdesk_tools::validate_pdf(bytes).map_err(js_error)?;
    to_js(&info)
}

/// Every tool card, processing and display-only
#[wasm_bindgen(js_name = toolCatalog)]
pub fn tool_catalog() -> Result<JsValue, JsValue> {
    to_js(pdfdesk_core::catalog())
}

pub(crate) fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
