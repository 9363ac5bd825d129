//! Tool catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A remote processing function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    ImageToPdf,
    CompressPdf,
    SplitPdf,
    MergePdf,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::ImageToPdf,
        Endpoint::CompressPdf,
        Endpoint::SplitPdf,
        Endpoint::MergePdf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::ImageToPdf => "image-to-pdf",
            Endpoint::CompressPdf => "compress-pdf",
            Endpoint::SplitPdf => "split-pdf",
            Endpoint::MergePdf => "merge-pdf",
        }
    }

    pub fn accepted_files(self) -> &'static str {
        match self {
            Endpoint::ImageToPdf => ".jpg,.jpeg,.png,.gif,.bmp,.webp",
            Endpoint::CompressPdf | Endpoint::SplitPdf | Endpoint::MergePdf => ".pdf",
        }
    }

    pub fn multiple_files(self) -> bool {
        matches!(self, Endpoint::ImageToPdf | Endpoint::MergePdf)
    }

    pub fn min_files(self) -> usize {
        match self {
            Endpoint::MergePdf => 2,
            _ => 1,
        }
    }

    /// Multipart field carrying the upload(s)
    pub fn form_field(self) -> &'static str {
        if self.multiple_files() {
            "files"
        } else {
            "file"
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("Unknown function: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCard {
    pub title: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub highlighted: bool,
    /// `None` for display-only tools
    pub endpoint: Option<Endpoint>,
}

impl ToolCard {
    pub fn is_processing(&self) -> bool {
        self.endpoint.is_some()
    }
}

static CATALOG: [ToolCard; 10] = [
    ToolCard {
        title: "Image to PDF",
        description: "Convert JPG, PNG, and other images to PDF format instantly",
        features: &[
            "Support for multiple image formats",
            "Batch conversion available",
            "Preserve image quality",
            "Custom page layouts",
        ],
        highlighted: true,
        endpoint: Some(Endpoint::ImageToPdf),
    },
    ToolCard {
        title: "Compress PDF",
        description: "Reduce PDF file size while maintaining document quality",
        features: &[
            "Lossless stream compression",
            "Unused objects removed",
            "Size report after processing",
            "Original quality preserved",
        ],
        highlighted: false,
        endpoint: Some(Endpoint::CompressPdf),
    },
    ToolCard {
        title: "PDF Cutter",
        description: "Split large PDFs into smaller documents or extract specific pages",
        features: &[
            "Extract specific page ranges",
            "One file per page by default",
            "Each part downloadable on its own",
            "Bulk page extraction",
        ],
        highlighted: false,
        endpoint: Some(Endpoint::SplitPdf),
    },
    ToolCard {
        title: "Merge PDFs",
        description: "Combine multiple PDF files into a single document",
        features: &[
            "Pages kept in upload order",
            "Unlimited file merging",
            "Mixed page sizes supported",
            "Single download",
        ],
        highlighted: false,
        endpoint: Some(Endpoint::MergePdf),
    },
    ToolCard {
        title: "PDF to Text",
        description: "Extract text content from PDF documents for editing",
        features: &[
            "OCR text recognition",
            "Multiple output formats",
            "Preserve formatting",
            "Batch text extraction",
        ],
        highlighted: false,
        endpoint: None,
    },
    ToolCard {
        title: "Protect PDF",
        description: "Add password protection and security to your documents",
        features: &[
            "Password encryption",
            "Permission controls",
            "Digital signatures",
            "Watermark addition",
        ],
        highlighted: false,
        endpoint: None,
    },
    ToolCard {
        title: "Rotate PDF",
        description: "Rotate PDF pages to correct orientation and improve readability",
        features: &[
            "90°, 180°, 270° rotation",
            "Individual page rotation",
            "Bulk page rotation",
            "Preview before saving",
        ],
        highlighted: false,
        endpoint: None,
    },
    ToolCard {
        title: "PDF Organizer",
        description: "Reorder, delete, and organize pages within your PDF",
        features: &[
            "Drag & drop page reordering",
            "Delete unwanted pages",
            "Duplicate pages",
            "Page thumbnails preview",
        ],
        highlighted: false,
        endpoint: None,
    },
    ToolCard {
        title: "Sign PDF",
        description: "Add digital signatures and annotations to your documents",
        features: &[
            "Digital signature creation",
            "Handwritten signatures",
            "Text annotations",
            "Legal compliance",
        ],
        highlighted: false,
        endpoint: None,
    },
    ToolCard {
        title: "PDF Converter",
        description: "Convert PDFs to various formats including Word, Excel, PowerPoint",
        features: &[
            "Convert to Word/Excel/PPT",
            "HTML and image exports",
            "Preserve document layout",
            "Batch conversion support",
        ],
        highlighted: false,
        endpoint: None,
    },
];

pub fn catalog() -> &'static [ToolCard] {
    &CATALOG
}

pub fn card_for(endpoint: Endpoint) -> Option<&'static ToolCard> {
    CATALOG.iter().find(|card| card.endpoint == Some(endpoint))
}
