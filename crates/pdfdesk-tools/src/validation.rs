//! PDF validation and info extraction

use crate::error::ToolError;
use lopdf::{Dictionary, Document};
use serde::Serialize;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, ToolError> {
    check_header(bytes)?;

    let version = extract_version(bytes);
    let document = Document::load_mem(bytes)?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err(ToolError::ParseError("PDF has no pages".into()));
    }

    let info = info_dictionary(&document);
    let title = info.and_then(|d| text_entry(d, b"Title"));
    let author = info.and_then(|d| text_entry(d, b"Author"));

    Ok(PdfInfo {
        page_count,
        version,
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title,
        author,
    })
}

/// Quick validation without full parsing (for large uploads)
pub fn quick_validate(bytes: &[u8]) -> Result<(), ToolError> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(ToolError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".into(),
        ));
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), ToolError> {
    if bytes.len() < 8 {
        return Err(ToolError::ParseError("File too small to be a valid PDF".into()));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(ToolError::ParseError(
            "Not a valid PDF file (missing %PDF- header)".into(),
        ));
    }
    Ok(())
}

/// Header format: %PDF-1.7
fn extract_version(bytes: &[u8]) -> String {
    std::str::from_utf8(&bytes[5..8])
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| "1.4".to_string())
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    document.get_dictionary(id).ok()
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let decoded = String::from_utf8_lossy(bytes).into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_pdf;
    use lopdf::{dictionary, Object, StringFormat};

    #[test]
    fn test_validate_too_small() {
        let result = validate_pdf(b"%PDF");
        assert!(result.unwrap_err().to_string().contains("too small"));
    }

    #[test]
    fn test_validate_wrong_magic() {
        let result = validate_pdf(b"GIF89a\x00\x00\x00\x00");
        assert!(result.unwrap_err().to_string().contains("%PDF-"));
    }

    #[test]
    fn test_validate_reads_page_count_and_version() {
        let pdf = sample_pdf(3);
        let info = validate_pdf(&pdf).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.version, "1.7");
        assert_eq!(info.size_bytes, pdf.len());
        assert!(!info.encrypted);
        assert!(info.title.is_none());
    }

    #[test]
    fn test_validate_reads_metadata() {
        let mut doc = Document::load_mem(&sample_pdf(1)).unwrap();
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly".to_vec(), StringFormat::Literal),
            "Author" => Object::String(b"".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", Object::Reference(info_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let info = validate_pdf(&bytes).unwrap();
        assert_eq!(info.title.as_deref(), Some("Quarterly"));
        assert_eq!(info.author, None);
    }

    #[test]
    fn test_quick_validate() {
        assert!(quick_validate(&sample_pdf(1)).is_ok());
        assert!(quick_validate(b"%PDF-1.7\nno trailer here").is_err());
        assert!(quick_validate(b"hello").is_err());
    }
}
