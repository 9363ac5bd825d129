//! PDF transformations behind the pdfdesk processing functions
//!
//! Everything here works on in-memory bytes using lopdf:
//! - `merge_documents`: concatenate pages of several PDFs
//! - `split_into_parts`: cut one PDF into several by page groups
//! - `compress_document`: rewrite a PDF with compressed streams
//! - `images_to_pdf`: one page per image
//! - `RasterPdfBuilder`: raster-only PDFs (image-to-PDF and editor export)

pub mod compress;
pub mod error;
pub mod image_to_pdf;
pub mod merge;
pub mod raster;
pub mod split;
pub mod validation;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use compress::{compress_document, CompressionReport};
pub use error::ToolError;
pub use image_to_pdf::{images_to_pdf, ImageInput};
pub use merge::merge_documents;
pub use raster::{PageBox, Placement, RasterImage, RasterPdfBuilder, A4};
pub use split::{split_into_parts, SplitPart};
pub use validation::{quick_validate, validate_pdf, PdfInfo};

use std::ops::RangeInclusive;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, ToolError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| ToolError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse a range string into one page group per comma-separated part.
///
/// `"1-3, 5"` yields `[1..=3, 5..=5]`. Order is preserved; groups may overlap.
/// Bounds are checked against a document only when it is split.
pub fn parse_range_groups(input: &str) -> Result<Vec<RangeInclusive<u32>>, ToolError> {
    let mut groups = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| ToolError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| ToolError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(ToolError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }
            groups.push(start..=end);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| ToolError::InvalidRange(format!("Invalid page: {}", part)))?;
            groups.push(page..=page);
        }
    }

    Ok(groups)
}

/// Render a sorted page list back into compact range notation ("1-3, 5")
pub fn format_page_list(pages: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(", ")
}
