use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Unsupported annotation schema version {0}")]
    UnsupportedSchema(u32),

    #[error("Annotation JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{name} is not an accepted file type ({accept})")]
    Rejected { name: String, accept: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No document loaded")]
    NothingToExport,

    #[error("Failed to rasterize page {page}: {message}")]
    Rasterize { page: u32, message: String },

    #[error("Expected {expected} page images, got {got}")]
    PageCountMismatch { expected: usize, got: usize },

    #[error("Failed to assemble PDF: {0}")]
    Assemble(#[from] pdfdesk_tools::ToolError),

    #[error("Failed to deliver PDF: {0}")]
    Deliver(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("A request is already in progress")]
    InFlight,

    #[error("No files selected")]
    NoFiles,

    #[error("At least {required} files are required, {got} selected")]
    TooFewFiles { required: usize, got: usize },

    #[error("{0} does not process files")]
    DisplayOnly(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Function call failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}
