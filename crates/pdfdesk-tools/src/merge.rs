//! PDF merge
//!
//! Concatenates the pages of several PDFs, in input order, into one document.

use crate::error::ToolError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If single document, return it as-is
/// 3. Use the first document as the destination
/// 4. For each further document:
///    a. Copy inherited page attributes onto its pages
///    b. Import all objects with IDs shifted past the destination's max ID
///    c. Re-parent its pages under the destination page tree
/// 5. Rewrite the destination Kids/Count, compress and serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, ToolError> {
    let mut documents = documents.into_iter();
    let first = documents
        .next()
        .ok_or_else(|| ToolError::OperationError("No documents to merge".into()))?;
    let rest: Vec<Vec<u8>> = documents.collect();

    if rest.is_empty() {
        return Ok(first);
    }

    let mut dest = Document::load_mem(&first)
        .map_err(|e| ToolError::ParseError(format!("Failed to load document 0: {}", e)))?;
    materialize_inherited_attributes(&mut dest);

    let pages_id = page_tree_root(&dest)?;
    let mut dest_page_refs: Vec<ObjectId> = dest.get_pages().values().copied().collect();
    let mut dest_max_id = dest.max_id;

    for (i, bytes) in rest.iter().enumerate() {
        let mut source = Document::load_mem(bytes).map_err(|e| {
            ToolError::ParseError(format!("Failed to load document {}: {}", i + 1, e))
        })?;
        materialize_inherited_attributes(&mut source);

        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        let id_offset = dest_max_id;
        debug!(
            "Merging document {} ({} pages, id offset {})",
            i + 1,
            source_pages.len(),
            id_offset
        );

        let remapped: BTreeMap<ObjectId, Object> = source
            .objects
            .into_iter()
            .map(|(old_id, object)| {
                (
                    (old_id.0 + id_offset, old_id.1),
                    remap_object_refs(object, id_offset),
                )
            })
            .collect();
        dest.objects.extend(remapped);

        for old_page_ref in source_pages {
            let new_page_ref = (old_page_ref.0 + id_offset, old_page_ref.1);
            if let Some(Object::Dictionary(page)) = dest.objects.get_mut(&new_page_ref) {
                page.set("Parent", Object::Reference(pages_id));
            }
            dest_page_refs.push(new_page_ref);
        }

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    dest.max_id = dest_max_id;
    update_page_tree(&mut dest, pages_id, &dest_page_refs)?;

    // Source catalogs and page-tree nodes are now unreachable
    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| ToolError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

    Ok(buffer)
}

/// Resolve the catalog's /Pages reference
fn page_tree_root(doc: &Document) -> Result<ObjectId, ToolError> {
    doc.catalog()
        .map_err(|_| ToolError::OperationError("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| ToolError::OperationError("No Pages reference in catalog".into()))
}

/// Copy attributes inherited from page-tree ancestors onto each page so the
/// page survives being re-parented
fn materialize_inherited_attributes(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

    for page_id in page_ids {
        let mut inherited = Vec::new();
        for key in INHERITABLE {
            if let Some(value) = find_inherited(doc, page_id, key) {
                inherited.push((key, value));
            }
        }
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            for (key, value) in inherited {
                if !page.has(key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
    }
}

fn find_inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    if current.has(key) {
        return None;
    }
    // Depth bound guards against cyclic Parent chains
    for _ in 0..32 {
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
    }
    None
}

/// Recursively shift object references by `offset`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

fn update_page_tree(
    doc: &mut Document,
    pages_id: ObjectId,
    page_refs: &[ObjectId],
) -> Result<(), ToolError> {
    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids = page_refs.iter().map(|&id| Object::Reference(id)).collect();
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
            Ok(())
        }
        _ => Err(ToolError::OperationError(
            "Invalid pages dictionary".into(),
        )),
    }
}
