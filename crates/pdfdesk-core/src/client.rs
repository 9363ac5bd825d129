//! Native HTTP client for the processing functions

use crate::dialog::{ProcessRequest, ToolDialog};
use crate::error::DialogError;
use crate::protocol::{interpret_response, ProcessResponse};
use reqwest::multipart::{Form, Part};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as the `apikey` header
    pub anon_key: Option<String>,
    /// Sent as `Authorization: Bearer`
    pub access_token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: None,
            access_token: None,
        }
    }

    /// `PDFDESK_URL` (required), `PDFDESK_ANON_KEY`, `PDFDESK_ACCESS_TOKEN`
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PDFDESK_URL").ok()?;
        Some(Self {
            base_url,
            anon_key: std::env::var("PDFDESK_ANON_KEY").ok(),
            access_token: std::env::var("PDFDESK_ACCESS_TOKEN").ok(),
        })
    }

    pub fn url_for(&self, request: &ProcessRequest) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), request.path())
    }
}

#[derive(Debug, Clone)]
pub struct FunctionsClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl FunctionsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST the request as multipart form data and interpret the reply
    pub async fn call(&self, request: &ProcessRequest) -> Result<ProcessResponse, DialogError> {
        let transport = |e: reqwest::Error| DialogError::Transport(e.to_string());

        let mut form = Form::new();
        for file in &request.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            if !file.mime.is_empty() {
                part = part.mime_str(&file.mime).map_err(transport)?;
            }
            form = form.part(request.field, part);
        }
        for (name, value) in &request.fields {
            form = form.text(name.clone(), value.clone());
        }

        let url = self.config.url_for(request);
        debug!(%url, files = request.files.len(), "calling function");

        let mut builder = self.http.post(&url).multipart(form);
        if let Some(key) = &self.config.anon_key {
            builder = builder.header("apikey", key);
        }
        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        interpret_response(status, &body)
    }

    /// Submit the dialog, send the request and settle the dialog with the
    /// outcome
    pub async fn run(&self, dialog: &mut ToolDialog) -> Result<ProcessResponse, DialogError> {
        let request = dialog.submit()?;
        let outcome = self.call(&request).await;
        dialog.settle(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectedFile;
    use crate::tools::Endpoint;

    #[test]
    fn test_url_joins_base_and_path() {
        let config = ClientConfig::new("http://localhost:54321/");
        let request = ProcessRequest {
            endpoint: Endpoint::MergePdf,
            field: "files",
            files: vec![SelectedFile::new("a.pdf", "", vec![])],
            fields: vec![],
        };
        assert_eq!(
            config.url_for(&request),
            "http://localhost:54321/functions/v1/merge-pdf"
        );
    }
}
