//! Flattened export
//!
//! Export runs in two halves. `ExportPlan` captures each page's overlay once
//! the bound page has been persisted. A rasterizer then turns every page
//! (document render plus overlay) into a bitmap, and `assemble` writes those
//! bitmaps as A4 pages of a raster-only PDF. The browser rasterizes
//! asynchronously between the two halves; native callers use `run`.

use crate::annotation::AnnotationObject;
use crate::error::ExportError;
use crate::store::PageAnnotationStore;
use pdfdesk_tools::{Placement, RasterImage, RasterPdfBuilder, A4};
use serde::Serialize;
use tracing::{debug, info};

pub const EXPORT_FILE_NAME: &str = "edited-document.pdf";

/// One page to rasterize and the annotations to composite over it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOverlay {
    pub page: u32,
    pub objects: Vec<AnnotationObject>,
}

/// Bitmap of one composed page
#[derive(Debug, Clone)]
pub enum PageRaster {
    /// PNG or JPEG bytes, e.g. from `canvas.toDataURL`
    Encoded(Vec<u8>),
    /// Interleaved RGBA, e.g. from `getImageData`
    Rgba {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

pub trait PageRasterizer {
    fn rasterize(&mut self, overlay: &PageOverlay) -> Result<PageRaster, ExportError>;
}

impl<F> PageRasterizer for F
where
    F: FnMut(&PageOverlay) -> Result<PageRaster, ExportError>,
{
    fn rasterize(&mut self, overlay: &PageOverlay) -> Result<PageRaster, ExportError> {
        self(overlay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub pages: Vec<PageOverlay>,
}

impl ExportPlan {
    /// One overlay per page `1..=page_count`, read from `store`
    pub fn new(page_count: u32, store: &PageAnnotationStore) -> Result<Self, ExportError> {
        if page_count == 0 {
            return Err(ExportError::NothingToExport);
        }
        let pages = (1..=page_count)
            .map(|page| PageOverlay {
                page,
                objects: store.load_page(page),
            })
            .collect();
        Ok(Self { pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write one A4 page per raster, in page order. Any bad raster aborts
    /// the whole export.
    pub fn assemble(&self, rasters: Vec<PageRaster>) -> Result<Vec<u8>, ExportError> {
        if rasters.len() != self.pages.len() {
            return Err(ExportError::PageCountMismatch {
                expected: self.pages.len(),
                got: rasters.len(),
            });
        }

        let mut builder = RasterPdfBuilder::new();
        for (overlay, raster) in self.pages.iter().zip(rasters) {
            let image = decode_raster(overlay.page, raster)?;
            debug!(
                page = overlay.page,
                width = image.width(),
                height = image.height(),
                "adding export page"
            );
            builder.add_page(&image, A4, Placement::full(A4), None)?;
        }

        let bytes = builder.finish()?;
        info!(pages = self.pages.len(), bytes = bytes.len(), "export assembled");
        Ok(bytes)
    }

    /// Rasterize every page with `rasterizer`, then assemble
    pub fn run<R: PageRasterizer + ?Sized>(&self, rasterizer: &mut R) -> Result<Vec<u8>, ExportError> {
        let rasters = self
            .pages
            .iter()
            .map(|overlay| rasterizer.rasterize(overlay))
            .collect::<Result<Vec<_>, _>>()?;
        self.assemble(rasters)
    }
}

fn decode_raster(page: u32, raster: PageRaster) -> Result<RasterImage, ExportError> {
    match raster {
        PageRaster::Encoded(bytes) => {
            RasterImage::decode(&bytes).map_err(|e| ExportError::Rasterize {
                page,
                message: e.to_string(),
            })
        }
        PageRaster::Rgba {
            width,
            height,
            pixels,
        } => {
            let expected = width as usize * height as usize * 4;
            if width == 0 || height == 0 || pixels.len() != expected {
                return Err(ExportError::Rasterize {
                    page,
                    message: format!(
                        "{}x{} RGBA needs {} bytes, got {}",
                        width,
                        height,
                        expected,
                        pixels.len()
                    ),
                });
            }
            Ok(RasterImage::from_rgba(width, height, &pixels, false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::tests::rect;
    use lopdf::Document;
    use pdfdesk_tools::fixtures::sample_png;

    fn annotated_store() -> PageAnnotationStore {
        let mut store = PageAnnotationStore::new();
        store.save_page(1, vec![rect(0.0, 0.0)]);
        store.save_page(2, vec![rect(1.0, 1.0), rect(2.0, 2.0)]);
        store
    }

    #[test]
    fn test_plan_requires_pages() {
        let result = ExportPlan::new(0, &PageAnnotationStore::new());
        assert!(matches!(result, Err(ExportError::NothingToExport)));
    }

    #[test]
    fn test_plan_collects_each_page_overlay() {
        let plan = ExportPlan::new(3, &annotated_store()).unwrap();
        let counts: Vec<usize> = plan.pages.iter().map(|p| p.objects.len()).collect();
        assert_eq!(counts, vec![1, 2, 0]);
    }

    #[test]
    fn test_two_page_export_has_two_a4_pages() {
        let plan = ExportPlan::new(2, &annotated_store()).unwrap();
        let mut seen = Vec::new();
        let mut rasterizer = |overlay: &PageOverlay| {
            seen.push((overlay.page, overlay.objects.len()));
            Ok::<_, ExportError>(PageRaster::Encoded(sample_png(20, 28, [255, 255, 255, 255])))
        };
        let bytes = plan.run(&mut rasterizer).unwrap();
        assert_eq!(seen, vec![(1, 1), (2, 2)]);

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        for page_id in pages.values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let width = media_box[2].as_float().unwrap();
            let height = media_box[3].as_float().unwrap();
            assert!((width - 595.28).abs() < 0.01);
            assert!((height - 841.89).abs() < 0.01);
        }
    }

    #[test]
    fn test_failed_page_aborts_export() {
        let plan = ExportPlan::new(3, &annotated_store()).unwrap();
        let mut rasterizer = |overlay: &PageOverlay| {
            if overlay.page == 2 {
                Err(ExportError::Rasterize {
                    page: 2,
                    message: "canvas tainted".into(),
                })
            } else {
                Ok(PageRaster::Encoded(sample_png(4, 4, [0, 0, 0, 255])))
            }
        };
        let err = plan.run(&mut rasterizer).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize { page: 2, .. }));
    }

    #[test]
    fn test_raster_count_must_match() {
        let plan = ExportPlan::new(2, &annotated_store()).unwrap();
        let err = plan
            .assemble(vec![PageRaster::Encoded(sample_png(2, 2, [0, 0, 0, 255]))])
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::PageCountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_rgba_raster_is_size_checked() {
        let plan = ExportPlan::new(1, &PageAnnotationStore::new()).unwrap();
        let bad = PageRaster::Rgba {
            width: 2,
            height: 2,
            pixels: vec![0; 3],
        };
        assert!(plan.assemble(vec![bad]).is_err());

        let good = PageRaster::Rgba {
            width: 2,
            height: 2,
            pixels: vec![255; 16],
        };
        assert!(plan.assemble(vec![good]).is_ok());
    }

    #[test]
    fn test_undecodable_raster_reports_page() {
        let plan = ExportPlan::new(1, &PageAnnotationStore::new()).unwrap();
        let err = plan
            .assemble(vec![PageRaster::Encoded(b"not an image".to_vec())])
            .unwrap_err();
        assert!(matches!(err, ExportError::Rasterize { page: 1, .. }));
    }
}
