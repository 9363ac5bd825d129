//! Tool dialog bindings
//!
//! One `ToolSession` per open dialog. Files are staged one by one from JS
//! and committed as a single offer, so a batch is accepted or rejected as a
//! whole. `submit` sends the upload with `fetch` and settles the dialog when
//! the reply arrives.

use std::cell::RefCell;
use std::rc::Rc;

use pdfdesk_core::{
    interpret_response, DialogError, Endpoint, ProcessRequest, ProcessResponse, SelectedFile,
    ToolDialog,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

use crate::download::bytes_to_blob;
use crate::{js_error, to_js};

#[wasm_bindgen]
pub struct ToolSession {
    dialog: Rc<RefCell<ToolDialog>>,
    staged: Vec<SelectedFile>,
    base_url: String,
    anon_key: Option<String>,
    access_token: Option<String>,
}

#[wasm_bindgen]
impl ToolSession {
    /// `endpoint` is a function name such as "merge-pdf"; `base_url` the
    /// server hosting `/functions/v1/...`
    #[wasm_bindgen(constructor)]
    pub fn new(endpoint: &str, base_url: &str) -> Result<ToolSession, JsValue> {
        let endpoint: Endpoint = endpoint.parse().map_err(|e: String| JsValue::from_str(&e))?;
        Ok(Self::for_endpoint(endpoint, base_url))
    }

    #[wasm_bindgen(getter)]
    pub fn endpoint(&self) -> String {
        self.dialog.borrow().endpoint().to_string()
    }

    /// Sent as the `apikey` header and `Authorization: Bearer`
    #[wasm_bindgen(js_name = setCredentials)]
    pub fn set_credentials(&mut self, anon_key: Option<String>, access_token: Option<String>) {
        self.anon_key = anon_key.filter(|k| !k.is_empty());
        self.access_token = access_token.filter(|t| !t.is_empty());
    }

    /// The catalog card for this tool
    pub fn card(&self) -> Result<JsValue, JsValue> {
        to_js(&self.dialog.borrow().card())
    }

    /// Value for the file input's `accept` attribute
    pub fn accept(&self) -> String {
        self.dialog.borrow().endpoint().accepted_files().to_string()
    }

    #[wasm_bindgen(js_name = isMultiple)]
    pub fn is_multiple(&self) -> bool {
        self.dialog.borrow().endpoint().multiple_files()
    }

    // ---- File selection ----

    #[wasm_bindgen(js_name = stageFile)]
    pub fn stage_file(&mut self, name: &str, mime: &str, bytes: &[u8]) {
        self.staged
            .push(SelectedFile::new(name, mime, bytes.to_vec()));
    }

    /// Offer the staged files as picked from the file input
    #[wasm_bindgen(js_name = commitFiles)]
    pub fn commit_files(&mut self) -> Result<u32, JsValue> {
        self.commit(false).map(|n| n as u32).map_err(js_error)
    }

    /// Offer the staged files as dropped onto the drop zone
    #[wasm_bindgen(js_name = commitDrop)]
    pub fn commit_drop(&mut self) -> Result<u32, JsValue> {
        self.commit(true).map(|n| n as u32).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&mut self, index: usize) -> bool {
        self.dialog.borrow_mut().remove_file(index).is_some()
    }

    #[wasm_bindgen(js_name = fileCount)]
    pub fn file_count(&self) -> u32 {
        self.dialog.borrow().selection().len() as u32
    }

    /// `[{ name, size, sizeLabel }]`
    pub fn files(&self) -> Result<JsValue, JsValue> {
        to_js(&self.dialog.borrow().selection().summaries())
    }

    #[wasm_bindgen(js_name = dragEnter)]
    pub fn drag_enter(&mut self) {
        self.dialog.borrow_mut().selection_mut().drag_enter();
    }

    #[wasm_bindgen(js_name = dragOver)]
    pub fn drag_over(&mut self) {
        self.dialog.borrow_mut().selection_mut().drag_over();
    }

    #[wasm_bindgen(js_name = dragLeave)]
    pub fn drag_leave(&mut self) {
        self.dialog.borrow_mut().selection_mut().drag_leave();
    }

    #[wasm_bindgen(js_name = isDragActive)]
    pub fn is_drag_active(&self) -> bool {
        self.dialog.borrow().selection().is_drag_active()
    }

    /// Page ranges for split ("1-3, 5"); empty means one file per page
    #[wasm_bindgen(js_name = setRanges)]
    pub fn set_ranges(&mut self, ranges: Option<String>) {
        self.dialog.borrow_mut().set_ranges(ranges);
    }

    // ---- Request ----

    #[wasm_bindgen(js_name = isInFlight)]
    pub fn is_in_flight(&self) -> bool {
        self.dialog.borrow().is_in_flight()
    }

    /// Send the selection. Resolves with the response body, rejects with the
    /// failure message; either way the dialog is settled first.
    pub fn submit(&mut self) -> Result<js_sys::Promise, JsValue> {
        let request = self.dialog.borrow_mut().submit().map_err(js_error)?;
        let url = function_url(&self.base_url, &request);

        let fetch_request = match build_request(
            &url,
            &request,
            self.anon_key.as_deref(),
            self.access_token.as_deref(),
        ) {
            Ok(r) => r,
            Err(err) => {
                let err = DialogError::Transport(describe(&err));
                self.dialog.borrow_mut().settle(Err(err.clone()));
                return Err(js_error(err));
            }
        };

        let dialog = Rc::clone(&self.dialog);
        Ok(future_to_promise(async move {
            let outcome = send(fetch_request).await;
            dialog.borrow_mut().settle(outcome.clone());
            match outcome {
                Ok(response) => to_js(&response),
                Err(err) => Err(js_error(err)),
            }
        }))
    }

    /// Last successful response, or `undefined`
    pub fn result(&self) -> Result<JsValue, JsValue> {
        match self.dialog.borrow().result() {
            Some(response) => to_js(response),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = downloadUrl)]
    pub fn download_url(&self) -> Option<String> {
        self.dialog.borrow().download_url().map(str::to_string)
    }

    /// Every link in the last result (split produces several)
    #[wasm_bindgen(js_name = downloadUrls)]
    pub fn download_urls(&self) -> Result<JsValue, JsValue> {
        let dialog = self.dialog.borrow();
        let urls = dialog
            .result()
            .map(ProcessResponse::download_urls)
            .unwrap_or_default();
        to_js(&urls)
    }

    #[wasm_bindgen(js_name = takeNotices)]
    pub fn take_notices(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.dialog.borrow_mut().take_notices())
    }
}

impl ToolSession {
    pub fn for_endpoint(endpoint: Endpoint, base_url: &str) -> Self {
        Self {
            dialog: Rc::new(RefCell::new(ToolDialog::new(endpoint))),
            staged: Vec::new(),
            base_url: base_url.to_string(),
            anon_key: None,
            access_token: None,
        }
    }

    fn commit(&mut self, dropped: bool) -> Result<usize, DialogError> {
        let files = std::mem::take(&mut self.staged);
        let mut dialog = self.dialog.borrow_mut();
        if dropped {
            dialog.drop_files(files)
        } else {
            dialog.offer_files(files)
        }
    }
}

fn function_url(base_url: &str, request: &ProcessRequest) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), request.path())
}

fn build_request(
    url: &str,
    request: &ProcessRequest,
    anon_key: Option<&str>,
    access_token: Option<&str>,
) -> Result<Request, JsValue> {
    let form = FormData::new()?;
    for file in &request.files {
        let blob = bytes_to_blob(&file.bytes, &file.mime)?;
        form.append_with_blob_and_filename(request.field, &blob, &file.name)?;
    }
    for (name, value) in &request.fields {
        form.append_with_str(name, value)?;
    }

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);

    let fetch_request = Request::new_with_str_and_init(url, &opts)?;
    if let Some(key) = anon_key {
        fetch_request.headers().set("apikey", key)?;
    }
    if let Some(token) = access_token {
        fetch_request
            .headers()
            .set("Authorization", &format!("Bearer {}", token))?;
    }
    Ok(fetch_request)
}

async fn send(request: Request) -> Result<ProcessResponse, DialogError> {
    let transport = |err: JsValue| DialogError::Transport(describe(&err));

    let window =
        web_sys::window().ok_or_else(|| DialogError::Transport("No window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(transport)?;
    let response: Response = response.dyn_into().map_err(transport)?;
    let body = JsFuture::from(response.text().map_err(transport)?)
        .await
        .map_err(transport)?;

    interpret_response(response.status(), &body.as_string().unwrap_or_default())
}

fn describe(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "Request failed".to_string())
}


#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_request_carries_headers() {
        let request = ProcessRequest {
            endpoint: Endpoint::CompressPdf,
            field: "file",
            files: vec![SelectedFile::new("a.pdf", "application/pdf", b"%PDF".to_vec())],
            fields: vec![],
        };
        let built = build_request(
            "http://localhost/functions/v1/compress-pdf",
            &request,
            Some("anon"),
            Some("jwt"),
        )
        .unwrap();
        assert_eq!(built.method(), "POST");
        assert_eq!(built.headers().get("apikey").unwrap().as_deref(), Some("anon"));
        assert_eq!(
            built.headers().get("authorization").unwrap().as_deref(),
            Some("Bearer jwt")
        );
    }

    #[wasm_bindgen_test]
    async fn test_unreachable_server_settles_dialog() {
        let mut session = ToolSession::for_endpoint(Endpoint::CompressPdf, "http://127.0.0.1:9");
        session.stage_file("a.pdf", "application/pdf", b"%PDF");
        session.commit(false).unwrap();

        let promise = session.submit().unwrap();
        assert!(JsFuture::from(promise).await.is_err());
        assert!(!session.is_in_flight());
        assert!(session.download_url().is_none());
    }
}
