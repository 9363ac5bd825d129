//! Editor session
//!
//! One `Editor` per open document viewer. It owns the annotation controller
//! (and through it the page store), navigation state, the pending load and
//! the notice queue. Nothing here is shared between editor instances.

use crate::annotation::Color;
use crate::controller::{AnnotationController, Tool};
use crate::error::{AnnotateError, ExportError};
use crate::export::{ExportPlan, PageRaster, PageRasterizer};
use crate::navigation::{Direction, LoadTicket, LoadTracker, Navigator, Rotation, ZoomDirection};
use crate::notice::{Notice, NoticeQueue};
use crate::store::PageAnnotationStore;
use crate::surface::DrawingSurface;
use serde::Serialize;
use tracing::{info, warn};

/// Where the open document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Bytes { name: String, data: Vec<u8> },
    Url(String),
}

impl DocumentSource {
    pub fn name(&self) -> &str {
        match self {
            DocumentSource::Bytes { name, .. } => name,
            DocumentSource::Url(url) => url.rsplit('/').next().unwrap_or(url),
        }
    }
}

/// Snapshot of everything the toolbar and page controls display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub current_page: u32,
    pub page_count: u32,
    pub zoom: f64,
    pub zoom_percent: u32,
    pub rotation: u16,
    pub active_tool: Tool,
    pub active_color: Color,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub loading: bool,
    pub has_document: bool,
}

pub struct Editor<S> {
    controller: AnnotationController<S>,
    navigator: Navigator,
    loads: LoadTracker,
    source: Option<DocumentSource>,
    notices: NoticeQueue,
}

impl<S: DrawingSurface> Default for Editor<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DrawingSurface> Editor<S> {
    pub fn new() -> Self {
        Self {
            controller: AnnotationController::new(),
            navigator: Navigator::new(),
            loads: LoadTracker::default(),
            source: None,
            notices: NoticeQueue::default(),
        }
    }

    pub fn with_surface(surface: S) -> Self {
        let mut editor = Self::new();
        editor.controller.attach(surface);
        editor
    }

    pub fn controller(&self) -> &AnnotationController<S> {
        &self.controller
    }

    /// Direct access for pointer input and selection edits
    pub fn controller_mut(&mut self) -> &mut AnnotationController<S> {
        &mut self.controller
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn store(&self) -> &PageAnnotationStore {
        self.controller.store()
    }

    pub fn source(&self) -> Option<&DocumentSource> {
        self.source.as_ref()
    }

    pub fn state(&self) -> ViewerState {
        ViewerState {
            current_page: self.navigator.current_page(),
            page_count: self.navigator.page_count(),
            zoom: self.navigator.zoom().scale(),
            zoom_percent: self.navigator.zoom_percent(),
            rotation: self.navigator.rotation().degrees(),
            active_tool: self.controller.active_tool(),
            active_color: self.controller.active_color(),
            can_go_prev: self.navigator.can_go_prev(),
            can_go_next: self.navigator.can_go_next(),
            loading: self.loads.is_loading(),
            has_document: self.source.is_some(),
        }
    }

    /// Replace the document. Viewer state and annotations are reset and the
    /// page count stays 0 until `document_loaded` is called with the
    /// returned ticket.
    pub fn open(&mut self, source: DocumentSource) -> LoadTicket {
        let ticket = self.loads.begin();
        info!(name = source.name(), ticket = ticket.id(), "opening document");
        self.source = Some(source);
        self.navigator.reset();
        self.controller.reset();
        ticket
    }

    /// Renderer finished decoding. Ignored unless `ticket` is current.
    pub fn document_loaded(&mut self, ticket: LoadTicket, page_count: u32) -> bool {
        if !self.loads.complete(ticket) {
            return false;
        }
        self.navigator.set_page_count(page_count);
        self.notices.push(Notice::info(
            "PDF Loaded",
            format!("Document loaded with {} pages", page_count),
        ));
        true
    }

    /// Renderer failed to decode. Ignored unless `ticket` is current.
    pub fn document_failed(&mut self, ticket: LoadTicket, message: &str) -> bool {
        if !self.loads.complete(ticket) {
            return false;
        }
        warn!(reason = message, "document load failed");
        self.source = None;
        self.notices.push(Notice::destructive(
            "Load Failed",
            "The PDF could not be opened",
        ));
        true
    }

    /// Drop the document and cancel any pending load
    pub fn close(&mut self) {
        self.loads.cancel();
        self.source = None;
        self.navigator.reset();
        self.controller.reset();
    }

    /// Persists the outgoing page before loading the incoming one. At either
    /// end nothing changes and nothing is written.
    pub fn go_to_page(&mut self, direction: Direction) -> bool {
        match self.navigator.go_to_page(direction) {
            Some(switch) => {
                self.controller.switch_page(switch.to);
                true
            }
            None => false,
        }
    }

    pub fn set_zoom(&mut self, direction: ZoomDirection) -> bool {
        self.navigator.set_zoom(direction)
    }

    pub fn rotate(&mut self) -> Rotation {
        self.navigator.rotate()
    }

    pub fn select_tool(&mut self, tool: Tool) -> bool {
        let applied = self.controller.select_tool(tool);
        if applied && tool == Tool::Eraser {
            self.notices.push(Notice::info(
                "Annotations Cleared",
                "All annotations removed from current page",
            ));
        }
        applied
    }

    pub fn set_color(&mut self, color: Color) {
        self.controller.set_color(color);
    }

    pub fn annotations_json(&mut self) -> Result<String, AnnotateError> {
        self.controller.persist();
        self.controller.store().to_json()
    }

    pub fn restore_annotations(&mut self, json: &str) -> Result<(), AnnotateError> {
        let store = PageAnnotationStore::from_json(json)?;
        self.controller.restore(store);
        Ok(())
    }

    /// First half of an export: persist the bound page, then capture every
    /// page's overlay
    pub fn plan_export(&mut self) -> Result<ExportPlan, ExportError> {
        self.controller.persist();
        let plan = ExportPlan::new(self.navigator.page_count(), self.controller.store());
        if let Err(err) = &plan {
            self.report_export_failure(err);
        }
        plan
    }

    /// Second half: assemble the rasters produced for `plan` and hand the
    /// PDF to `deliver`. The success notice is only emitted once delivery
    /// succeeded.
    pub fn finish_export<D>(
        &mut self,
        plan: &ExportPlan,
        rasters: Result<Vec<PageRaster>, ExportError>,
        deliver: D,
    ) -> Result<Vec<u8>, ExportError>
    where
        D: FnOnce(&[u8]) -> Result<(), ExportError>,
    {
        let result = rasters
            .and_then(|rasters| plan.assemble(rasters))
            .and_then(|pdf| deliver(&pdf).map(|()| pdf));
        self.report_export(result)
    }

    /// Plan, rasterize and assemble in one go
    pub fn export_with<R: PageRasterizer + ?Sized>(
        &mut self,
        rasterizer: &mut R,
    ) -> Result<Vec<u8>, ExportError> {
        let plan = self.plan_export()?;
        let result = plan.run(rasterizer);
        self.report_export(result)
    }

    fn report_export(
        &mut self,
        result: Result<Vec<u8>, ExportError>,
    ) -> Result<Vec<u8>, ExportError> {
        match &result {
            Ok(_) => self.notices.push(Notice::info(
                "PDF Downloaded",
                "Your edited PDF has been downloaded",
            )),
            Err(err) => self.report_export_failure(err),
        }
        result
    }

    fn report_export_failure(&mut self, err: &ExportError) {
        warn!(error = %err, "export failed");
        self.notices.push(Notice::destructive(
            "Download Failed",
            "There was an error downloading the PDF",
        ));
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationObject;
    use crate::export::PageOverlay;
    use crate::notice::NoticeVariant;
    use crate::surface::SceneSurface;
    use pdfdesk_tools::fixtures::sample_png;
    use pretty_assertions::assert_eq;

    fn loaded_editor(pages: u32) -> Editor<SceneSurface> {
        let mut editor = Editor::with_surface(SceneSurface::new());
        let ticket = editor.open(DocumentSource::Url("https://example.com/doc.pdf".into()));
        assert!(editor.document_loaded(ticket, pages));
        editor
    }

    fn kinds(objects: &[AnnotationObject]) -> Vec<&'static str> {
        objects.iter().map(AnnotationObject::kind).collect()
    }

    #[test]
    fn test_load_emits_notice() {
        let mut editor = loaded_editor(3);
        let notices = editor.take_notices();
        assert_eq!(
            notices,
            vec![Notice::info("PDF Loaded", "Document loaded with 3 pages")]
        );
        assert_eq!(editor.state().page_count, 3);
        assert!(!editor.state().loading);
    }

    #[test]
    fn test_page_count_is_zero_until_loaded() {
        let mut editor: Editor<SceneSurface> = Editor::with_surface(SceneSurface::new());
        editor.open(DocumentSource::Bytes {
            name: "a.pdf".into(),
            data: vec![],
        });
        let state = editor.state();
        assert_eq!(state.page_count, 0);
        assert!(state.loading);
        assert!(!editor.go_to_page(Direction::Next));
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut editor: Editor<SceneSurface> = Editor::with_surface(SceneSurface::new());
        let first = editor.open(DocumentSource::Url("/one.pdf".into()));
        let second = editor.open(DocumentSource::Url("/two.pdf".into()));

        assert!(!editor.document_loaded(first, 9));
        assert_eq!(editor.state().page_count, 0);
        assert!(editor.document_loaded(second, 2));
        assert_eq!(editor.state().page_count, 2);
        assert_eq!(editor.source().map(DocumentSource::name), Some("two.pdf"));
    }

    #[test]
    fn test_close_cancels_pending_load() {
        let mut editor: Editor<SceneSurface> = Editor::with_surface(SceneSurface::new());
        let ticket = editor.open(DocumentSource::Url("/doc.pdf".into()));
        editor.close();
        assert!(!editor.document_loaded(ticket, 4));
        assert!(!editor.document_failed(ticket, "late"));
        assert!(editor.take_notices().is_empty());
        assert!(!editor.state().has_document);
    }

    #[test]
    fn test_failed_load_notice() {
        let mut editor: Editor<SceneSurface> = Editor::with_surface(SceneSurface::new());
        let ticket = editor.open(DocumentSource::Url("/broken.pdf".into()));
        assert!(editor.document_failed(ticket, "bad xref"));
        let notice = &editor.take_notices()[0];
        assert_eq!(notice.variant, NoticeVariant::Destructive);
        assert!(editor.source().is_none());
    }

    #[test]
    fn test_annotations_survive_navigation() {
        let mut editor = loaded_editor(3);

        editor.select_tool(Tool::Rectangle);
        assert!(editor.go_to_page(Direction::Next));
        editor.select_tool(Tool::Text);
        assert!(editor.go_to_page(Direction::Prev));

        assert_eq!(kinds(editor.controller().objects()), vec!["rectangle"]);
        assert_eq!(kinds(editor.store().page(2)), vec!["text"]);
        assert!(editor.store().page(3).is_empty());
    }

    #[test]
    fn test_boundary_navigation_writes_nothing() {
        let mut editor = loaded_editor(2);
        editor.select_tool(Tool::Circle);

        assert!(!editor.go_to_page(Direction::Prev));
        assert!(editor.store().visited_pages().is_empty());

        assert!(editor.go_to_page(Direction::Next));
        let visited = editor.store().visited_pages();
        assert!(!editor.go_to_page(Direction::Next));
        assert_eq!(editor.store().visited_pages(), visited);
        assert_eq!(editor.state().current_page, 2);
    }

    #[test]
    fn test_new_document_resets_state() {
        let mut editor = loaded_editor(3);
        editor.select_tool(Tool::Freehand);
        editor.set_color(Color::rgb(0, 0, 0));
        editor.set_zoom(ZoomDirection::In);
        editor.rotate();
        editor.go_to_page(Direction::Next);

        let ticket = editor.open(DocumentSource::Url("/next.pdf".into()));
        editor.document_loaded(ticket, 5);
        let state = editor.state();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.rotation, 0);
        assert_eq!(state.active_tool, Tool::Select);
        assert_eq!(state.active_color, Color::RED);
        assert!(editor.store().visited_pages().is_empty());
    }

    #[test]
    fn test_eraser_notice() {
        let mut editor = loaded_editor(1);
        editor.take_notices();
        editor.select_tool(Tool::Rectangle);
        editor.select_tool(Tool::Eraser);
        assert_eq!(editor.take_notices()[0].title, "Annotations Cleared");
        assert!(editor.store().load_page(1).is_empty());
    }

    #[test]
    fn test_export_two_annotated_pages() {
        let mut editor = loaded_editor(2);
        editor.select_tool(Tool::Rectangle);
        editor.go_to_page(Direction::Next);
        editor.select_tool(Tool::Circle);
        editor.select_tool(Tool::Text);
        editor.take_notices();

        let mut overlays = Vec::new();
        let mut rasterizer = |overlay: &PageOverlay| {
            overlays.push(kinds(&overlay.objects));
            Ok::<_, ExportError>(PageRaster::Encoded(sample_png(10, 14, [255, 255, 255, 255])))
        };
        let bytes = editor.export_with(&mut rasterizer).unwrap();

        // Page 2 was still bound to the surface and must be persisted first
        assert_eq!(overlays, vec![vec!["rectangle"], vec!["circle", "text"]]);
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(editor.take_notices()[0].title, "PDF Downloaded");
    }

    #[test]
    fn test_export_failure_is_generic() {
        let mut editor = loaded_editor(2);
        editor.take_notices();
        let mut rasterizer = |overlay: &PageOverlay| {
            Err::<PageRaster, _>(ExportError::Rasterize {
                page: overlay.page,
                message: "boom".into(),
            })
        };
        assert!(editor.export_with(&mut rasterizer).is_err());
        assert_eq!(
            editor.take_notices(),
            vec![Notice::destructive(
                "Download Failed",
                "There was an error downloading the PDF"
            )]
        );
    }

    #[test]
    fn test_split_export_flow() {
        let mut editor = loaded_editor(1);
        let plan = editor.plan_export().unwrap();
        let rasters = vec![PageRaster::Encoded(sample_png(3, 3, [0, 0, 0, 255]))];
        assert!(editor.finish_export(&plan, Ok(rasters), |_| Ok(())).is_ok());
        assert_eq!(editor.take_notices().last().unwrap().title, "PDF Downloaded");
    }

    #[test]
    fn test_failed_delivery_only_reports_failure() {
        let mut editor = loaded_editor(1);
        editor.take_notices();
        let plan = editor.plan_export().unwrap();
        let rasters = vec![PageRaster::Encoded(sample_png(3, 3, [0, 0, 0, 255]))];
        let result = editor.finish_export(&plan, Ok(rasters), |_| {
            Err(ExportError::Deliver("blocked".into()))
        });
        assert!(matches!(result, Err(ExportError::Deliver(_))));
        assert_eq!(
            editor.take_notices(),
            vec![Notice::destructive(
                "Download Failed",
                "There was an error downloading the PDF"
            )]
        );
    }

    #[test]
    fn test_export_without_document_fails() {
        let mut editor: Editor<SceneSurface> = Editor::with_surface(SceneSurface::new());
        assert!(matches!(
            editor.plan_export(),
            Err(ExportError::NothingToExport)
        ));
        assert_eq!(editor.take_notices()[0].title, "Download Failed");
    }

    #[test]
    fn test_annotations_json_round_trip() {
        let mut editor = loaded_editor(2);
        editor.select_tool(Tool::Rectangle);
        let json = editor.annotations_json().unwrap();

        let mut other = loaded_editor(2);
        other.restore_annotations(&json).unwrap();
        assert_eq!(kinds(other.controller().objects()), vec!["rectangle"]);
    }
}
