//! PDF compression
//!
//! Lossless: drops unreachable objects and empty streams, then Flate-encodes
//! every uncompressed stream. Images are not resampled.

use crate::error::ToolError;
use lopdf::Document;
use serde::Serialize;
use tracing::debug;

/// Size accounting for one compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressionReport {
    /// Percentage of bytes saved, rounded down
    pub fn saved_percent(&self) -> u32 {
        if self.original_size == 0 || self.compressed_size >= self.original_size {
            return 0;
        }
        let saved = self.original_size - self.compressed_size;
        (saved * 100 / self.original_size) as u32
    }

    /// "30%" style label
    pub fn ratio_label(&self) -> String {
        format!("{}%", self.saved_percent())
    }
}

/// Compress a PDF.
///
/// If rewriting does not make the file smaller the original bytes are
/// returned and the report shows no saving.
pub fn compress_document(bytes: &[u8]) -> Result<(Vec<u8>, CompressionReport), ToolError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| ToolError::ParseError(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(ToolError::OperationError(
            "Encrypted PDFs cannot be compressed".into(),
        ));
    }

    doc.prune_objects();
    doc.delete_zero_length_streams();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ToolError::OperationError(format!("Save failed: {}", e)))?;

    let (output, compressed_size) = if buffer.len() < bytes.len() {
        let len = buffer.len();
        (buffer, len)
    } else {
        (bytes.to_vec(), bytes.len())
    };

    let report = CompressionReport {
        original_size: bytes.len(),
        compressed_size,
    };
    debug!(
        "Compressed {} -> {} bytes ({})",
        report.original_size,
        report.compressed_size,
        report.ratio_label()
    );

    Ok((output, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_pdf;

    #[test]
    fn test_ratio_label() {
        let report = CompressionReport {
            original_size: 1000,
            compressed_size: 700,
        };
        assert_eq!(report.ratio_label(), "30%");
    }

    #[test]
    fn test_ratio_never_negative() {
        let report = CompressionReport {
            original_size: 100,
            compressed_size: 150,
        };
        assert_eq!(report.saved_percent(), 0);
        let empty = CompressionReport {
            original_size: 0,
            compressed_size: 0,
        };
        assert_eq!(empty.saved_percent(), 0);
    }

    #[test]
    fn test_compress_never_grows_output() {
        let pdf = sample_pdf(20);
        let (output, report) = compress_document(&pdf).unwrap();
        assert!(output.len() <= pdf.len());
        assert_eq!(report.original_size, pdf.len());
        assert_eq!(report.compressed_size, output.len());
    }

    #[test]
    fn test_compressed_output_keeps_pages() {
        let pdf = sample_pdf(4);
        let (output, _) = compress_document(&pdf).unwrap();
        let doc = Document::load_mem(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
    }

    #[test]
    fn test_compress_rejects_garbage() {
        assert!(compress_document(b"%PDF-nope").is_err());
    }
}
