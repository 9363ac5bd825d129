//! File selection for uploads
//!
//! Validates offered files against an accept list in the format of an HTML
//! `accept` attribute and keeps the current selection.

use crate::error::SelectionError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptEntry {
    /// Lower-case, with leading dot
    Extension(String),
    Mime(String),
    /// `image/*` stored as `image/`
    MimePrefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptList {
    source: String,
    entries: Vec<AcceptEntry>,
}

impl AcceptList {
    /// Parse a comma-separated list such as `.pdf,application/pdf,image/*`
    pub fn parse(accept: &str) -> Self {
        let entries = accept
            .split(',')
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| {
                if e.starts_with('.') {
                    AcceptEntry::Extension(e)
                } else if let Some(prefix) = e.strip_suffix('*') {
                    AcceptEntry::MimePrefix(prefix.to_string())
                } else {
                    AcceptEntry::Mime(e)
                }
            })
            .collect();
        Self {
            source: accept.trim().to_string(),
            entries,
        }
    }

    /// A file matches if its extension or its MIME type is listed.
    ///
    /// An empty list accepts everything.
    pub fn matches(&self, name: &str, mime: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let name = name.to_ascii_lowercase();
        let mime = mime.trim().to_ascii_lowercase();
        self.entries.iter().any(|entry| match entry {
            AcceptEntry::Extension(ext) => name.ends_with(ext.as_str()),
            AcceptEntry::Mime(m) => !mime.is_empty() && mime == *m,
            AcceptEntry::MimePrefix(prefix) => mime.starts_with(prefix.as_str()),
        })
    }
}

impl fmt::Display for AcceptList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type; may be empty or `application/octet-stream`
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Name and size of a selected file, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub size_label: String,
}

#[derive(Debug, Clone)]
pub struct FileSelection {
    accept: AcceptList,
    multiple: bool,
    files: Vec<SelectedFile>,
    drag_active: bool,
}

impl FileSelection {
    pub fn new(accept: &str, multiple: bool) -> Self {
        Self {
            accept: AcceptList::parse(accept),
            multiple,
            files: Vec::new(),
            drag_active: false,
        }
    }

    pub fn accept(&self) -> &AcceptList {
        &self.accept
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    /// Offer files from the picker or a drop.
    ///
    /// Either every file is accepted or none is: a single mismatch rejects
    /// the whole offer and leaves the selection unchanged. In single mode
    /// an accepted offer replaces the selection (only its first file is
    /// kept); in multiple mode it is appended. Returns the number of files
    /// added.
    pub fn offer(&mut self, files: Vec<SelectedFile>) -> Result<usize, SelectionError> {
        if files.is_empty() {
            return Ok(0);
        }
        if let Some(bad) = files.iter().find(|f| !self.accept.matches(&f.name, &f.mime)) {
            return Err(SelectionError::Rejected {
                name: bad.name.clone(),
                accept: self.accept.to_string(),
            });
        }

        if self.multiple {
            let added = files.len();
            self.files.extend(files);
            Ok(added)
        } else {
            self.files = files.into_iter().take(1).collect();
            Ok(1)
        }
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> Result<usize, SelectionError> {
        self.drag_active = false;
        self.offer(files)
    }

    pub fn remove(&mut self, index: usize) -> Option<SelectedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files
            .iter()
            .map(|f| FileSummary {
                name: f.name.clone(),
                size: f.size(),
                size_label: format_file_size(f.size()),
            })
            .collect()
    }
}

/// Human-readable size with up to two decimals: `0 Bytes`, `1.5 KB`, `2 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }
    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
