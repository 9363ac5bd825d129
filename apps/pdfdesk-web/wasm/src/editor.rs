//! Viewer / annotator bindings
//!
//! `PdfEditor` wraps the core `Editor` over an in-memory `SceneSurface`.
//! JavaScript owns the PDF.js document and the page canvas; Rust owns
//! navigation, tools, per-page annotations and export assembly.

use pdfdesk_core::surface::DrawingSurface;
use pdfdesk_core::{
    Color, Direction, DocumentSource, Editor, ExportError, ExportPlan, LoadTicket, PageRaster,
    Point, SceneSurface, Tool, ZoomDirection, EXPORT_FILE_NAME,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;

use crate::download::download_bytes;
use crate::render::draw_overlay;
use crate::{js_error, to_js};

#[wasm_bindgen]
pub struct PdfEditor {
    editor: Editor<SceneSurface>,
    pending_export: Option<ExportPlan>,
}

#[wasm_bindgen]
impl PdfEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            editor: Editor::with_surface(SceneSurface::new()),
            pending_export: None,
        }
    }

    // ---- Document lifecycle ----

    /// Start loading a picked file. Returns the load ticket to pass back to
    /// `documentLoaded` / `documentFailed`.
    #[wasm_bindgen(js_name = openBytes)]
    pub fn open_bytes(&mut self, name: &str, bytes: &[u8]) -> u32 {
        self.open(DocumentSource::Bytes {
            name: name.to_string(),
            data: bytes.to_vec(),
        })
    }

    #[wasm_bindgen(js_name = openUrl)]
    pub fn open_url(&mut self, url: &str) -> u32 {
        self.open(DocumentSource::Url(url.to_string()))
    }

    fn open(&mut self, source: DocumentSource) -> u32 {
        self.pending_export = None;
        self.editor.open(source).id() as u32
    }

    /// Returns false when the ticket was superseded by a later open
    #[wasm_bindgen(js_name = documentLoaded)]
    pub fn document_loaded(&mut self, ticket: u32, page_count: u32) -> bool {
        self.editor
            .document_loaded(LoadTicket::from_id(ticket as u64), page_count)
    }

    #[wasm_bindgen(js_name = documentFailed)]
    pub fn document_failed(&mut self, ticket: u32, message: &str) -> bool {
        self.editor
            .document_failed(LoadTicket::from_id(ticket as u64), message)
    }

    pub fn close(&mut self) {
        self.pending_export = None;
        self.editor.close();
    }

    /// Name of the open document (file name or URL)
    #[wasm_bindgen(js_name = sourceName)]
    pub fn source_name(&self) -> Option<String> {
        self.editor.source().map(|s| s.name().to_string())
    }

    /// Bytes of a document opened with `openBytes`
    #[wasm_bindgen(js_name = sourceBytes)]
    pub fn source_bytes(&self) -> Option<Vec<u8>> {
        match self.editor.source()? {
            DocumentSource::Bytes { data, .. } => Some(data.clone()),
            DocumentSource::Url(_) => None,
        }
    }

    /// Viewer state snapshot (page, zoom, rotation, tool, color, ...)
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.editor.state())
    }

    // ---- Navigation ----

    #[wasm_bindgen(js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.editor.navigator().current_page()
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.editor.navigator().page_count()
    }

    #[wasm_bindgen(js_name = prevPage)]
    pub fn prev_page(&mut self) -> bool {
        self.editor.go_to_page(Direction::Prev)
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&mut self) -> bool {
        self.editor.go_to_page(Direction::Next)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> bool {
        self.editor.set_zoom(ZoomDirection::In)
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> bool {
        self.editor.set_zoom(ZoomDirection::Out)
    }

    /// Current zoom as a scale factor (1.0 = 100%)
    pub fn zoom(&self) -> f64 {
        self.editor.navigator().zoom().scale()
    }

    /// Rotate 90° clockwise; returns the new rotation in degrees
    pub fn rotate(&mut self) -> u16 {
        self.editor.rotate().degrees()
    }

    // ---- Tools ----

    /// "select", "text", "rectangle", "circle", "freehand" or "eraser"
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&mut self, name: &str) -> Result<bool, JsValue> {
        let tool: Tool = name.parse().map_err(js_error)?;
        Ok(self.editor.select_tool(tool))
    }

    #[wasm_bindgen(js_name = activeTool)]
    pub fn active_tool(&self) -> String {
        self.editor.controller().active_tool().to_string()
    }

    /// `#rrggbb`
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color: Color = hex.parse().map_err(js_error)?;
        self.editor.set_color(color);
        Ok(())
    }

    #[wasm_bindgen(js_name = activeColor)]
    pub fn active_color(&self) -> String {
        self.editor.controller().active_color().to_hex()
    }

    // ---- Pointer input (overlay coordinates, unscaled) ----

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.editor.controller_mut().pointer_down(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.editor.controller_mut().pointer_move(Point::new(x, y));
    }

    /// Returns the index of a finished freehand path, if one was added
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Option<u32> {
        self.editor.controller_mut().pointer_up().map(|i| i as u32)
    }

    /// Select the topmost object under the point (select tool only)
    #[wasm_bindgen(js_name = selectAt)]
    pub fn select_at(&mut self, x: f64, y: f64) -> Option<u32> {
        self.editor
            .controller_mut()
            .select_at(Point::new(x, y))
            .map(|i| i as u32)
    }

    #[wasm_bindgen(js_name = selectedIndex)]
    pub fn selected_index(&self) -> Option<u32> {
        self.editor
            .controller()
            .surface()
            .and_then(|s| s.selected())
            .map(|i| i as u32)
    }

    #[wasm_bindgen(js_name = moveSelected)]
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        self.editor.controller_mut().move_selected(dx, dy)
    }

    #[wasm_bindgen(js_name = resizeSelected)]
    pub fn resize_selected(&mut self, factor: f64) -> bool {
        self.editor.controller_mut().resize_selected(factor)
    }

    #[wasm_bindgen(js_name = recolorSelected)]
    pub fn recolor_selected(&mut self, hex: &str) -> Result<bool, JsValue> {
        let color: Color = hex.parse().map_err(js_error)?;
        Ok(self.editor.controller_mut().recolor_selected(color))
    }

    #[wasm_bindgen(js_name = editText)]
    pub fn edit_text(&mut self, text: &str) -> bool {
        self.editor.controller_mut().edit_text(text)
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&mut self) -> bool {
        self.editor.controller_mut().delete_selected().is_some()
    }

    // ---- Annotations ----

    /// Objects on the current page, bottom to top
    pub fn objects(&self) -> Result<JsValue, JsValue> {
        to_js(self.editor.controller().objects())
    }

    #[wasm_bindgen(js_name = objectCount)]
    pub fn object_count(&self) -> u32 {
        self.editor.controller().objects().len() as u32
    }

    /// Versioned JSON of every page's annotations
    #[wasm_bindgen(js_name = annotationsJson)]
    pub fn annotations_json(&mut self) -> Result<String, JsValue> {
        self.editor.annotations_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = restoreAnnotations)]
    pub fn restore_annotations(&mut self, json: &str) -> Result<(), JsValue> {
        self.editor.restore_annotations(json).map_err(js_error)
    }

    /// Redraw the overlay canvas for the current page
    pub fn render(&self, ctx: &CanvasRenderingContext2d, scale: f64) -> Result<(), JsValue> {
        let controller = self.editor.controller();
        let selected = controller.surface().and_then(|s| s.selected());
        draw_overlay(ctx, controller.objects(), selected, scale)
    }

    // ---- Export ----

    /// Capture the pages to rasterize: `[{ page, objects }]`. The caller
    /// composes each page with its overlay, encodes it as PNG or JPEG and
    /// passes the images, in order, to `finishExport`.
    #[wasm_bindgen(js_name = beginExport)]
    pub fn begin_export(&mut self) -> Result<JsValue, JsValue> {
        let plan = self.editor.plan_export().map_err(js_error)?;
        let pages = to_js(&plan.pages)?;
        self.pending_export = Some(plan);
        Ok(pages)
    }

    /// Assemble the page images into `edited-document.pdf` and download it
    #[wasm_bindgen(js_name = finishExport)]
    pub fn finish_export(&mut self, images: js_sys::Array) -> Result<(), JsValue> {
        let rasters = images
            .iter()
            .enumerate()
            .map(|(i, value)| {
                value
                    .dyn_into::<js_sys::Uint8Array>()
                    .map(|bytes| bytes.to_vec())
                    .map_err(|_| ExportError::Rasterize {
                        page: i as u32 + 1,
                        message: "expected a Uint8Array".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>();

        self.assemble_export(rasters, |pdf| {
            download_bytes(EXPORT_FILE_NAME, pdf, "application/pdf").map_err(|e| {
                ExportError::Deliver(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
            })
        })
        .map(|_| ())
        .map_err(js_error)
    }

    /// Report that rasterizing page `page` failed; emits the failure notice
    #[wasm_bindgen(js_name = failExport)]
    pub fn fail_export(&mut self, page: u32, message: &str) {
        let _ = self.assemble_export(
            Err(ExportError::Rasterize {
                page,
                message: message.to_string(),
            }),
            |_| Ok(()),
        );
    }

    fn assemble_export<D>(
        &mut self,
        rasters: Result<Vec<Vec<u8>>, ExportError>,
        deliver: D,
    ) -> Result<Vec<u8>, ExportError>
    where
        D: FnOnce(&[u8]) -> Result<(), ExportError>,
    {
        let plan = self
            .pending_export
            .take()
            .ok_or(ExportError::NothingToExport)?;
        let rasters = rasters.map(|images| images.into_iter().map(PageRaster::Encoded).collect());
        self.editor.finish_export(&plan, rasters, deliver)
    }

    /// Drain pending toast notices: `[{ title, description, variant }]`
    #[wasm_bindgen(js_name = takeNotices)]
    pub fn take_notices(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.editor.take_notices())
    }
}

impl Default for PdfEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfdesk_tools::fixtures::sample_png;
    use pdfdesk_tools::get_page_count;
    use pretty_assertions::assert_eq;

    fn loaded(pages: u32) -> PdfEditor {
        let mut editor = PdfEditor::new();
        let ticket = editor.open_bytes("a.pdf", b"%PDF-1.7");
        assert!(editor.document_loaded(ticket, pages));
        editor
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut editor = PdfEditor::new();
        let first = editor.open_bytes("a.pdf", b"a");
        let second = editor.open_url("https://example.com/b.pdf");
        assert!(!editor.document_loaded(first, 9));
        assert!(editor.document_loaded(second, 2));
        assert_eq!(editor.page_count(), 2);
        assert_eq!(editor.source_name().as_deref(), Some("https://example.com/b.pdf"));
        assert_eq!(editor.source_bytes(), None);
    }

    #[test]
    fn test_annotations_follow_pages() {
        let mut editor = loaded(3);
        editor.select_tool("rectangle").unwrap();
        assert_eq!(editor.object_count(), 1);

        assert!(editor.next_page());
        assert_eq!(editor.current_page(), 2);
        assert_eq!(editor.object_count(), 0);

        assert!(editor.prev_page());
        assert_eq!(editor.object_count(), 1);
        assert!(!editor.prev_page());
    }

    #[test]
    fn test_freehand_gesture() {
        let mut editor = loaded(1);
        editor.select_tool("draw").unwrap();
        editor.pointer_down(1.0, 1.0);
        editor.pointer_move(5.0, 5.0);
        assert_eq!(editor.pointer_up(), Some(0));
        assert_eq!(editor.object_count(), 1);
    }

    #[test]
    fn test_select_and_edit() {
        let mut editor = loaded(1);
        editor.select_tool("circle").unwrap();
        editor.select_tool("select").unwrap();
        assert_eq!(editor.select_at(130.0, 130.0), Some(0));
        assert!(editor.move_selected(10.0, 0.0));
        assert!(editor.delete_selected());
        assert_eq!(editor.object_count(), 0);
        assert_eq!(editor.selected_index(), None);
    }

    #[test]
    fn test_color_parsing() {
        let mut editor = loaded(1);
        editor.set_color("#00ff00").unwrap();
        assert_eq!(editor.active_color(), "#00ff00");
    }

    #[test]
    fn test_zoom_bounds() {
        let mut editor = loaded(1);
        while editor.zoom_in() {}
        assert_eq!(editor.zoom(), 3.0);
        while editor.zoom_out() {}
        assert_eq!(editor.zoom(), 0.5);
        assert_eq!(editor.rotate(), 90);
    }

    #[test]
    fn test_export_assembles_one_page_per_image() {
        let mut editor = loaded(2);
        editor.select_tool("text").unwrap();
        let plan = editor.editor.plan_export().unwrap();
        assert_eq!(plan.page_count(), 2);
        editor.pending_export = Some(plan);

        let png = sample_png(20, 30, [255, 255, 255, 255]);
        let pdf = editor
            .assemble_export(Ok(vec![png.clone(), png]), |_| Ok(()))
            .unwrap();
        assert_eq!(get_page_count(&pdf).unwrap(), 2);
        assert!(editor.pending_export.is_none());

        let notices = editor.editor.take_notices();
        assert_eq!(notices.last().unwrap().title, "PDF Downloaded");
    }

    #[test]
    fn test_failed_download_has_no_success_notice() {
        let mut editor = loaded(1);
        editor.editor.take_notices();
        editor.pending_export = Some(editor.editor.plan_export().unwrap());

        let png = sample_png(10, 10, [255, 255, 255, 255]);
        let result = editor.assemble_export(Ok(vec![png]), |_| {
            Err(ExportError::Deliver("anchor click failed".into()))
        });
        assert!(result.is_err());

        let titles: Vec<String> = editor
            .editor
            .take_notices()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Download Failed".to_string()]);
    }

    #[test]
    fn test_failed_rasterization_reports_once() {
        let mut editor = loaded(1);
        editor.pending_export = Some(editor.editor.plan_export().unwrap());
        editor.fail_export(1, "canvas tainted");

        let notices = editor.editor.take_notices();
        assert_eq!(notices.last().unwrap().title, "Download Failed");
        assert!(editor.pending_export.is_none());
    }

    #[test]
    fn test_finish_without_plan() {
        let mut editor = loaded(1);
        assert!(matches!(
            editor.assemble_export(Ok(vec![]), |_| Ok(())),
            Err(ExportError::NothingToExport)
        ));
    }
}
