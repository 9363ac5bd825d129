//! Router tests for the pdfdesk API
//!
//! Requests go through `tower::ServiceExt::oneshot`; the object store is a
//! temporary directory.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pdfdesk_core::ProcessResponse;
use pdfdesk_tools::fixtures::{sample_pdf, sample_png};
use pdfdesk_tools::get_page_count;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{router, AppState, LocalStore};

const BOUNDARY: &str = "pdfdesk-test-boundary";

fn test_app(max_upload_bytes: usize) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(
        Arc::new(LocalStore::new(dir.path())),
        "pdf-files",
        "http://files.test",
    );
    (router(Arc::new(state), max_upload_bytes), dir)
}

enum Part<'a> {
    File(&'a str, &'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File(field, name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        field, name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(field, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        field, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post(path: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, ProcessResponse) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Read a published object back from the store through its download link
async fn fetch(app: &Router, url: &str) -> Vec<u8> {
    let path = url.strip_prefix("http://files.test").unwrap();
    let (status, body) = send(
        app,
        Request::builder().uri(path).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "GET {path}");
    body
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app(1 << 20);
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "pdfdesk-api");
}

#[tokio::test]
async fn test_merge_keeps_upload_order() {
    let (app, _dir) = test_app(1 << 20);
    let a = sample_pdf(2);
    let b = sample_pdf(3);

    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/merge-pdf",
            &[Part::File("files", "a.pdf", &a), Part::File("files", "b.pdf", &b)],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.files_merged, Some(2));
    assert_eq!(response.total_size, Some((a.len() + b.len()) as u64));

    let merged = fetch(&app, response.download_url.as_deref().unwrap()).await;
    assert_eq!(get_page_count(&merged).unwrap(), 5);
}

#[tokio::test]
async fn test_merge_needs_two_files() {
    let (app, _dir) = test_app(1 << 20);
    let a = sample_pdf(1);
    let (status, response) = send_json(
        &app,
        post("/functions/v1/merge-pdf", &[Part::File("files", "a.pdf", &a)]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("At least 2 PDF files required for merging")
    );
}

#[tokio::test]
async fn test_compress_reports_real_sizes() {
    let (app, _dir) = test_app(1 << 20);
    let pdf = sample_pdf(4);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/compress-pdf",
            &[Part::File("file", "big report.pdf", &pdf)],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.original_size, Some(pdf.len() as u64));
    let compressed_size = response.compressed_size.unwrap();
    assert!(compressed_size <= pdf.len() as u64);
    assert!(response.compression_ratio.as_deref().unwrap().ends_with('%'));
    assert!(response.file_name.as_deref().unwrap().ends_with("_big_report.pdf"));

    let output = fetch(&app, response.download_url.as_deref().unwrap()).await;
    assert_eq!(output.len() as u64, compressed_size);
    assert_eq!(get_page_count(&output).unwrap(), 4);
}

#[tokio::test]
async fn test_compress_without_file_is_400() {
    let (app, _dir) = test_app(1 << 20);
    let (status, response) = send_json(
        &app,
        post("/functions/v1/compress-pdf", &[Part::Text("note", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error.as_deref(), Some("No file provided"));
}

#[tokio::test]
async fn test_compress_rejects_non_pdf() {
    let (app, _dir) = test_app(1 << 20);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/compress-pdf",
            &[Part::File("file", "notes.pdf", b"plain text")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.starts_with("notes.pdf: "), "{error}");
    assert!(error.contains("Failed to parse PDF"), "{error}");
}

#[tokio::test]
async fn test_split_defaults_to_one_file_per_page() {
    let (app, _dir) = test_app(1 << 20);
    let pdf = sample_pdf(3);
    let (status, response) = send_json(
        &app,
        post("/functions/v1/split-pdf", &[Part::File("file", "doc.pdf", &pdf)]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parts = response.split_files.unwrap();
    assert_eq!(
        parts.iter().map(|p| p.pages.as_str()).collect::<Vec<_>>(),
        vec!["1", "2", "3"]
    );
    assert_eq!(parts[0].file_name, "doc_part_1.pdf");
    for part in &parts {
        let bytes = fetch(&app, &part.download_url).await;
        assert_eq!(get_page_count(&bytes).unwrap(), 1);
    }
}

#[tokio::test]
async fn test_split_by_ranges() {
    let (app, _dir) = test_app(1 << 20);
    let pdf = sample_pdf(5);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/split-pdf",
            &[
                Part::Text("ranges", "1-3, 5"),
                Part::File("file", "doc.pdf", &pdf),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parts = response.split_files.unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].pages, "1-3");
    assert_eq!(parts[1].pages, "5");
    let first = fetch(&app, &parts[0].download_url).await;
    assert_eq!(get_page_count(&first).unwrap(), 3);
}

#[tokio::test]
async fn test_split_out_of_range_is_400() {
    let (app, _dir) = test_app(1 << 20);
    let pdf = sample_pdf(2);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/split-pdf",
            &[
                Part::File("file", "doc.pdf", &pdf),
                Part::Text("ranges", "4-6"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!response.success);

    let (status, _) = send_json(
        &app,
        post(
            "/functions/v1/split-pdf",
            &[
                Part::File("file", "doc.pdf", &pdf),
                Part::Text("ranges", "two"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_split_huge_range_is_400() {
    let (app, _dir) = test_app(1 << 20);
    let pdf = sample_pdf(3);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/split-pdf",
            &[
                Part::File("file", "doc.pdf", &pdf),
                Part::Text("ranges", "1-4000000000"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.error.unwrap().contains("does not exist"));
}

#[tokio::test]
async fn test_image_to_pdf_one_page_per_image() {
    let (app, _dir) = test_app(1 << 20);
    let red = sample_png(40, 20, [255, 0, 0, 255]);
    let clear = sample_png(10, 10, [0, 0, 255, 128]);

    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/image-to-pdf",
            &[
                Part::File("files", "red.png", &red),
                Part::File("files", "clear.png", &clear),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.images_processed, Some(2));
    assert!(response.file_name.unwrap().starts_with("converted_"));
    let pdf = fetch(&app, response.download_url.as_deref().unwrap()).await;
    assert_eq!(get_page_count(&pdf).unwrap(), 2);
}

#[tokio::test]
async fn test_image_to_pdf_rejects_garbage() {
    let (app, _dir) = test_app(1 << 20);
    let (status, response) = send_json(
        &app,
        post(
            "/functions/v1/image-to-pdf",
            &[Part::File("files", "x.png", b"not an image")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!response.success);

    let (status, response) = send_json(
        &app,
        post("/functions/v1/image-to-pdf", &[Part::Text("note", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error.as_deref(), Some("No images provided"));
}

#[tokio::test]
async fn test_download_headers() {
    let (app, dir) = test_app(1 << 20);
    std::fs::create_dir_all(dir.path().join("pdf-files")).unwrap();
    std::fs::write(dir.path().join("pdf-files/a.pdf"), b"%PDF").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/storage/v1/object/public/pdf-files/a.pdf?download=a.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a.pdf\""
    );
}

#[tokio::test]
async fn test_missing_objects_and_buckets_are_404() {
    let (app, _dir) = test_app(1 << 20);
    for uri in [
        "/storage/v1/object/public/pdf-files/nope.pdf",
        "/storage/v1/object/public/pdf-files/.x",
        "/storage/v1/object/public/private/a.pdf",
        "/functions/v1/rotate-pdf",
    ] {
        let (status, body) = send(
            &app,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        let response: ProcessResponse = serde_json::from_slice(&body).unwrap();
        assert!(!response.success);
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_function_headers() {
    let (app, _dir) = test_app(1 << 20);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/functions/v1/compress-pdf")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "authorization, apikey, content-type",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    for name in ["authorization", "x-client-info", "apikey", "content-type"] {
        assert!(allowed.contains(name), "{name} not allowed: {allowed}");
    }
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let (app, _dir) = test_app(1024);
    let big = vec![b'x'; 4096];
    let (status, body) = send(
        &app,
        post("/functions/v1/compress-pdf", &[Part::File("file", "a.pdf", &big)]),
    )
    .await;
    assert!(status.is_client_error(), "{status}");
    let response: ProcessResponse = serde_json::from_slice(&body).unwrap();
    assert!(!response.success);
}
