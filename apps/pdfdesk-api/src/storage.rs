//! Object storage for processed files
//!
//! Objects live under `{root}/{bucket}/{name}`. Names are flat: no path
//! separators and no leading dot.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where processed outputs are published
pub trait ObjectStore: Send + Sync {
    fn put(&self, bucket: &str, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// `Ok(None)` when the object does not exist
    fn get(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, name: &str) -> Result<PathBuf, StorageError> {
        check_name(bucket)?;
        check_name(name)?;
        Ok(self.root.join(bucket).join(name))
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, bucket: &str, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(bucket, name)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, bytes)?;
        debug!("Stored {}/{} ({} bytes)", bucket, name, bytes.len());
        Ok(())
    }

    fn get(&self, bucket: &str, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.object_path(bucket, name)?;
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

/// Reduce an uploaded file name to characters that are safe in an object
/// name and a URL path segment
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store.put("pdf-files", "a.pdf", b"%PDF").unwrap();
        assert_eq!(store.get("pdf-files", "a.pdf").unwrap(), Some(b"%PDF".to_vec()));
        assert_eq!(store.get("pdf-files", "missing.pdf").unwrap(), None);
        assert_eq!(store.get("other", "a.pdf").unwrap(), None);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        for name in ["../etc/passwd", "..", "a/b.pdf", ".hidden", ""] {
            assert!(
                matches!(store.put("pdf-files", name, b"x"), Err(StorageError::InvalidName(_))),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report 2024.pdf"), "report_2024.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\scan.pdf"), "scan.pdf");
        assert_eq!(sanitize_file_name("../../x.pdf"), "x.pdf");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    proptest! {
        #[test]
        fn sanitized_names_are_storable(name in ".{0,40}") {
            let cleaned = sanitize_file_name(&name);
            prop_assert!(check_name(&cleaned).is_ok());
            prop_assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c)));
        }
    }
}
