//! PDF split
//!
//! Extracts pages by deleting everything that was not asked for and pruning
//! whatever became unreachable.

use crate::error::ToolError;
use crate::format_page_list;
use lopdf::Document;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// One output of a split
#[derive(Debug, Clone, Serialize)]
pub struct SplitPart {
    /// Pages taken from the source, in range notation ("1-3")
    pub pages: String,
    pub bytes: Vec<u8>,
}

/// Split a PDF into one document per page group.
///
/// With no groups, every page becomes its own document. Every group is checked
/// against the page count before any page list is built.
pub fn split_into_parts(
    bytes: &[u8],
    groups: &[RangeInclusive<u32>],
) -> Result<Vec<SplitPart>, ToolError> {
    let doc = Document::load_mem(bytes).map_err(|e| ToolError::ParseError(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;

    let groups: Vec<RangeInclusive<u32>> = if groups.is_empty() {
        (1..=page_count).map(|p| p..=p).collect()
    } else {
        groups.to_vec()
    };
    for group in &groups {
        check_group(group, page_count)?;
    }

    groups
        .into_iter()
        .map(|group| {
            let pages: Vec<u32> = group.collect();
            let bytes = extract_pages(&doc, &pages)?;
            let label = format_page_list(&pages);
            debug!("Split part {} -> {} bytes", label, bytes.len());
            Ok(SplitPart {
                pages: label,
                bytes,
            })
        })
        .collect()
}

fn check_group(group: &RangeInclusive<u32>, page_count: u32) -> Result<(), ToolError> {
    if group.is_empty() {
        return Err(ToolError::InvalidRange("No pages specified".into()));
    }
    if *group.start() == 0 {
        return Err(ToolError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }
    if *group.end() > page_count {
        return Err(ToolError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            group.end(),
            page_count
        )));
    }
    Ok(())
}

fn extract_pages(doc: &Document, pages: &[u32]) -> Result<Vec<u8>, ToolError> {
    let page_count = doc.get_pages().len() as u32;
    let mut new_doc = doc.clone();

    let keep: HashSet<u32> = pages.iter().copied().collect();
    let to_delete: Vec<u32> = (1..=page_count).filter(|p| !keep.contains(p)).collect();
    if !to_delete.is_empty() {
        new_doc.delete_pages(&to_delete);
    }

    new_doc.prune_objects();
    new_doc.compress();

    let mut buffer = Vec::new();
    new_doc
        .save_to(&mut buffer)
        .map_err(|e| ToolError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}
