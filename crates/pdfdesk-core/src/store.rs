//! Per-page annotation storage

use crate::annotation::{AnnotationDocument, AnnotationObject};
use crate::error::AnnotateError;
use std::collections::BTreeMap;
use tracing::trace;

/// Page index -> ordered annotations (insertion order is z-order).
///
/// A page without an entry reads as empty. Entries appear only for pages
/// that have been saved at least once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAnnotationStore {
    pages: BTreeMap<u32, Vec<AnnotationObject>>,
}

impl PageAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the sequence for `page`
    pub fn save_page(&mut self, page: u32, objects: Vec<AnnotationObject>) {
        trace!(page, count = objects.len(), "save page annotations");
        self.pages.insert(page, objects);
    }

    /// Stored sequence for `page`, or empty
    pub fn load_page(&self, page: u32) -> Vec<AnnotationObject> {
        self.page(page).to_vec()
    }

    pub fn page(&self, page: u32) -> &[AnnotationObject] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pages that have an entry, including ones saved empty
    pub fn visited_pages(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    pub fn page_count_with_annotations(&self) -> usize {
        self.pages.values().filter(|objs| !objs.is_empty()).count()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn to_json(&self) -> Result<String, AnnotateError> {
        AnnotationDocument::new(self.pages.clone()).to_json()
    }

    pub fn from_json(json: &str) -> Result<Self, AnnotateError> {
        let doc = AnnotationDocument::from_json(json)?;
        Ok(Self { pages: doc.pages })
    }
}
