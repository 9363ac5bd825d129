//! Raster-only PDF assembly
//!
//! Builds documents in which every page is a single image XObject, optionally
//! with a one-line caption. Used both for image-to-PDF conversion and for the
//! editor's flattened export.

use crate::error::ToolError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageDecoder, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::{Cursor, Write};

/// A4 page in points (210 × 297 mm)
pub const A4: PageBox = PageBox {
    width: 595.28,
    height: 841.89,
};

/// Page or image rectangle size in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub width: f64,
    pub height: f64,
}

/// Where an image is drawn on its page (origin bottom-left, points)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Stretch over the whole page
    pub fn full(page: PageBox) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: page.width,
            height: page.height,
        }
    }
}

/// An image ready to embed
#[derive(Debug, Clone)]
pub enum RasterImage {
    /// JPEG bytes embedded unchanged with DCTDecode
    Jpeg {
        width: u32,
        height: u32,
        components: u8,
        data: Vec<u8>,
    },
    /// 8-bit RGB pixels with optional 8-bit alpha plane
    Pixels {
        width: u32,
        height: u32,
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        match self {
            RasterImage::Jpeg { width, .. } | RasterImage::Pixels { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            RasterImage::Jpeg { height, .. } | RasterImage::Pixels { height, .. } => *height,
        }
    }

    /// Decode encoded image bytes, sniffing the format from magic bytes.
    ///
    /// JPEG is validated by `image` and kept encoded; PNG goes through the
    /// `png` decoder; GIF, BMP and WebP through `image`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ToolError> {
        if bytes.starts_with(&[0xFF, 0xD8]) {
            return jpeg_from_bytes(bytes);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            return png_from_bytes(bytes);
        }

        let img = image::load_from_memory(bytes)
            .map_err(|e| ToolError::ImageError(e.to_string()))?;
        let has_alpha = img.color().has_alpha();
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_rgba(width, height, &rgba.into_raw(), has_alpha))
    }

    /// Build from interleaved RGBA, dropping the alpha plane when opaque
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8], keep_alpha: bool) -> Self {
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for px in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        let alpha = if keep_alpha && alpha.iter().any(|&a| a != 255) {
            Some(alpha)
        } else {
            None
        };
        RasterImage::Pixels {
            width,
            height,
            rgb,
            alpha,
        }
    }
}

fn png_from_bytes(bytes: &[u8]) -> Result<RasterImage, ToolError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| ToolError::ImageError(format!("PNG: {}", e)))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ToolError::ImageError(format!("PNG: {}", e)))?;
    let data = &buf[..info.buffer_size()];
    let (width, height) = (info.width, info.height);

    let image = match info.color_type {
        png::ColorType::Rgb => RasterImage::Pixels {
            width,
            height,
            rgb: data.to_vec(),
            alpha: None,
        },
        png::ColorType::Rgba => RasterImage::from_rgba(width, height, data, true),
        png::ColorType::Grayscale => RasterImage::Pixels {
            width,
            height,
            rgb: data.iter().flat_map(|&g| [g, g, g]).collect(),
            alpha: None,
        },
        png::ColorType::GrayscaleAlpha => {
            let rgba: Vec<u8> = data
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect();
            RasterImage::from_rgba(width, height, &rgba, true)
        }
        png::ColorType::Indexed => {
            return Err(ToolError::ImageError(
                "PNG: palette was not expanded".into(),
            ))
        }
    };
    Ok(image)
}

/// Fully decode the JPEG to validate it, then keep the original bytes for
/// DCTDecode. CMYK and other layouts fall back to decoded pixels.
fn jpeg_from_bytes(bytes: &[u8]) -> Result<RasterImage, ToolError> {
    let jpeg_err = |e: image::ImageError| ToolError::ImageError(format!("JPEG: {}", e));

    let decoder = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Jpeg)
        .into_decoder()
        .map_err(jpeg_err)?;
    let components = match decoder.original_color_type() {
        ExtendedColorType::L8 => Some(1),
        ExtendedColorType::Rgb8 => Some(3),
        _ => None,
    };
    let decoded = DynamicImage::from_decoder(decoder).map_err(jpeg_err)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ToolError::ImageError("JPEG: zero dimension".into()));
    }

    Ok(match components {
        Some(components) => RasterImage::Jpeg {
            width,
            height,
            components,
            data: bytes.to_vec(),
        },
        None => RasterImage::from_rgba(width, height, &decoded.to_rgba8().into_raw(), false),
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ToolError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| ToolError::OperationError(format!("Flate encoding failed: {}", e)))
}

/// Incrementally builds a PDF whose pages each carry one image
pub struct RasterPdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_id: Option<ObjectId>,
}

impl Default for RasterPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterPdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            font_id: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a page of size `page` showing `image` at `placement`.
    ///
    /// `caption` is drawn in Helvetica 10pt at (24, 16).
    pub fn add_page(
        &mut self,
        image: &RasterImage,
        page: PageBox,
        placement: Placement,
        caption: Option<&str>,
    ) -> Result<(), ToolError> {
        let image_id = self.add_image_xobject(image)?;

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width as f32),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(placement.height as f32),
                    Object::Real(placement.x as f32),
                    Object::Real(placement.y as f32),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ];

        let mut resources = dictionary! {
            "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
        };

        if let Some(caption) = caption {
            let font_id = self.font();
            resources.set("Font", dictionary! { "F1" => Object::Reference(font_id) });
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
                Operation::new("Td", vec![Object::Integer(24), Object::Integer(16)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(winansi_lossy(caption), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| ToolError::OperationError(format!("Content encoding failed: {}", e)))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width as f32),
                Object::Real(page.height as f32),
            ],
            "Resources" => resources,
            "Contents" => Object::Reference(content_id),
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Serialize the document. Fails if no page was added.
    pub fn finish(mut self) -> Result<Vec<u8>, ToolError> {
        if self.page_ids.is_empty() {
            return Err(ToolError::OperationError("Document has no pages".into()));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ToolError::OperationError(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    fn add_image_xobject(&mut self, image: &RasterImage) -> Result<ObjectId, ToolError> {
        match image {
            RasterImage::Jpeg {
                width,
                height,
                components,
                data,
            } => {
                let color_space = match components {
                    1 => "DeviceGray",
                    4 => "DeviceCMYK",
                    _ => "DeviceRGB",
                };
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width as i64,
                    "Height" => *height as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                };
                Ok(self.doc.add_object(Stream::new(dict, data.clone())))
            }
            RasterImage::Pixels {
                width,
                height,
                rgb,
                alpha,
            } => {
                let expected = (*width as usize) * (*height as usize) * 3;
                if rgb.len() != expected {
                    return Err(ToolError::ImageError(format!(
                        "Pixel buffer is {} bytes, expected {}",
                        rgb.len(),
                        expected
                    )));
                }

                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width as i64,
                    "Height" => *height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                };

                if let Some(alpha) = alpha {
                    let mask = dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => *width as i64,
                        "Height" => *height as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                        "Filter" => "FlateDecode",
                    };
                    let mask_id = self.doc.add_object(Stream::new(mask, deflate(alpha)?));
                    dict.set("SMask", Object::Reference(mask_id));
                }

                Ok(self.doc.add_object(Stream::new(dict, deflate(rgb)?)))
            }
        }
    }
}

/// Helvetica with WinAnsi covers ASCII safely; anything else becomes '?'
fn winansi_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}
