//! Wire format of the processing functions

use crate::error::DialogError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitFile {
    pub file_name: String,
    /// Page range in the source, e.g. "1-3"
    pub pages: String,
    pub download_url: String,
}

/// JSON body returned by every function.
///
/// Failure bodies may carry only `error`; a missing `success` reads as false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_files: Option<Vec<SplitFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_merged: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_processed: Option<u32>,
}

impl ProcessResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Every download link in the response, single file first
    pub fn download_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.download_url.iter().map(String::as_str).collect();
        if let Some(parts) = &self.split_files {
            urls.extend(parts.iter().map(|p| p.download_url.as_str()));
        }
        urls
    }
}

/// Turn an HTTP status and body into a response or a failure.
///
/// Non-2xx, unparseable JSON and `success: false` are all failures.
pub fn interpret_response(status: u16, body: &str) -> Result<ProcessResponse, DialogError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ProcessResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(DialogError::Http {
            status,
            body: message,
        });
    }

    let response: ProcessResponse =
        serde_json::from_str(body).map_err(|e| DialogError::Malformed(e.to_string()))?;
    if !response.success {
        return Err(DialogError::Rejected(
            response
                .error
                .unwrap_or_else(|| "Processing failed".to_string()),
        ));
    }
    Ok(response)
}
