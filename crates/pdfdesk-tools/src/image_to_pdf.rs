//! Image to PDF conversion
//!
//! One page per image. Pages follow the image size capped at roughly A4
//! (595 × 842 pt); images larger than that are scaled down to fit and centered.
//! Each page carries the source file name as a small footer.

use crate::error::ToolError;
use crate::raster::{PageBox, Placement, RasterImage, RasterPdfBuilder};
use tracing::debug;

pub const MAX_PAGE_WIDTH: f64 = 595.0;
pub const MAX_PAGE_HEIGHT: f64 = 842.0;

/// An uploaded image
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Page size and image placement for an image of `width × height` pixels
/// (one pixel maps to one point)
pub fn fit_page(width: u32, height: u32) -> (PageBox, Placement) {
    let (w, h) = (width as f64, height as f64);
    let page = PageBox {
        width: w.min(MAX_PAGE_WIDTH),
        height: h.min(MAX_PAGE_HEIGHT),
    };
    let scale = (page.width / w).min(page.height / h);
    let (draw_w, draw_h) = (w * scale, h * scale);
    let placement = Placement {
        x: (page.width - draw_w) / 2.0,
        y: (page.height - draw_h) / 2.0,
        width: draw_w,
        height: draw_h,
    };
    (page, placement)
}

/// Convert images to a single PDF, preserving input order
pub fn images_to_pdf(images: &[ImageInput]) -> Result<Vec<u8>, ToolError> {
    if images.is_empty() {
        return Err(ToolError::ImageError("No images provided".into()));
    }

    let mut builder = RasterPdfBuilder::new();
    for input in images {
        let image = RasterImage::decode(&input.bytes)
            .map_err(|e| ToolError::ImageError(format!("{}: {}", input.name, e)))?;
        let (page, placement) = fit_page(image.width(), image.height());
        debug!(
            "Adding {} ({}x{}) on {:.0}x{:.0}pt page",
            input.name,
            image.width(),
            image.height(),
            page.width,
            page.height
        );
        let caption = if input.name.is_empty() {
            "image"
        } else {
            input.name.as_str()
        };
        builder.add_page(&image, page, placement, Some(caption))?;
    }

    builder.finish()
}
