//! pdfdesk editor and tool-dialog state
//!
//! Everything here is platform independent: the browser bindings in
//! `pdfdesk-wasm` and native callers drive the same types.
//!
//! - `Editor`: viewer/annotator session (navigation, annotation tools,
//!   per-page store, export)
//! - `ToolDialog`: one processing-tool dialog (file selection, one request in
//!   flight, result and notices)
//! - `client` (feature `client`): reqwest-based caller for the processing
//!   functions

pub mod annotation;
pub mod controller;
pub mod dialog;
pub mod editor;
pub mod error;
pub mod export;
pub mod navigation;
pub mod notice;
pub mod protocol;
pub mod selection;
pub mod store;
pub mod surface;
pub mod tools;

#[cfg(feature = "client")]
pub mod client;

pub use annotation::{AnnotationObject, Color, Point, Size};
pub use controller::{AnnotationController, Tool};
pub use dialog::{ProcessRequest, ToolDialog};
pub use editor::{DocumentSource, Editor, ViewerState};
pub use error::{AnnotateError, DialogError, ExportError, SelectionError};
pub use export::{ExportPlan, PageOverlay, PageRaster, PageRasterizer, EXPORT_FILE_NAME};
pub use navigation::{Direction, LoadTicket, Navigator, Rotation, Zoom, ZoomDirection};
pub use notice::{Notice, NoticeVariant};
pub use protocol::{interpret_response, ProcessResponse, SplitFile};
pub use selection::{format_file_size, FileSelection, SelectedFile};
pub use store::PageAnnotationStore;
pub use surface::{DrawingSurface, SceneSurface};
pub use tools::{catalog, Endpoint, ToolCard};
