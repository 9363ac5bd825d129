//! Shared application state

use std::sync::Arc;

use crate::error::ApiError;
use crate::storage::ObjectStore;

pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    /// Base of every download link, without trailing slash
    pub public_url: String,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, public_url: &str) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public link for an object; `?download=` makes browsers save it
    pub fn download_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}?download={}",
            self.public_url, self.bucket, name, name
        )
    }

    /// Store an output in the bucket and return its download link
    pub fn publish(&self, name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        self.store.put(&self.bucket, name, bytes)?;
        Ok(self.download_url(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_publish_returns_public_link() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            Arc::new(LocalStore::new(dir.path())),
            "pdf-files",
            "http://localhost:54321/",
        );

        let url = state.publish("merged_1.pdf", b"%PDF").unwrap();
        assert_eq!(
            url,
            "http://localhost:54321/storage/v1/object/public/pdf-files/merged_1.pdf?download=merged_1.pdf"
        );
        assert!(dir.path().join("pdf-files/merged_1.pdf").exists());
    }
}
