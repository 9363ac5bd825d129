use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Unsupported image: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl From<lopdf::Error> for ToolError {
    fn from(err: lopdf::Error) -> Self {
        ToolError::ParseError(err.to_string())
    }
}
