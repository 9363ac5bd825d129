//! HTTP handlers
//!
//! - `POST /functions/v1/{image-to-pdf,compress-pdf,split-pdf,merge-pdf}`:
//!   multipart upload, process, publish, reply with a `ProcessResponse`
//! - `GET /storage/v1/object/public/:bucket/:name`: published outputs
//! - `GET /health`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use pdfdesk_core::{Endpoint, ProcessResponse, SplitFile};
use pdfdesk_tools::{
    compress_document, images_to_pdf, merge_documents, parse_range_groups, quick_validate,
    split_into_parts, ImageInput,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{sanitize_file_name, StorageError};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfdesk-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One uploaded file
struct Upload {
    name: String,
    bytes: Vec<u8>,
}

/// Parsed multipart body: files under the endpoint's field, everything else
/// as text
struct FormInput {
    files: Vec<Upload>,
    fields: HashMap<String, String>,
}

async fn read_form(mut multipart: Multipart, endpoint: Endpoint) -> Result<FormInput, ApiError> {
    let file_field = endpoint.form_field();
    let mut files = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == file_field {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                files.push(Upload {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
        } else if !field_name.is_empty() {
            let text = field.text().await?;
            fields.insert(field_name, text);
        }
    }

    debug!(
        "{}: {} file(s), fields {:?}",
        endpoint,
        files.len(),
        fields.keys().collect::<Vec<_>>()
    );
    Ok(FormInput { files, fields })
}

/// Reject anything that is not a complete PDF before doing real work
fn check_pdfs(files: &[Upload]) -> Result<(), ApiError> {
    for file in files {
        quick_validate(&file.bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", file.name, e)))?;
    }
    Ok(())
}

/// `{prefix}_{millis}_{random}` plus an optional suffix
fn object_name(prefix: &str, suffix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        &id[..8],
        suffix
    )
}

/// Run CPU-bound processing and storage writes off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// Handler: POST /functions/v1/compress-pdf
pub async fn compress_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let form = read_form(multipart, Endpoint::CompressPdf).await?;
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InvalidRequest("No file provided".into()))?;
    check_pdfs(std::slice::from_ref(&upload))?;

    let response = blocking(move || {
        let (bytes, report) = compress_document(&upload.bytes)?;
        let name = object_name(
            "compressed",
            &format!("_{}", sanitize_file_name(&upload.name)),
        );
        let url = state.publish(&name, &bytes)?;
        info!(
            "Compressed {} -> {} bytes ({})",
            report.original_size,
            report.compressed_size,
            report.ratio_label()
        );
        Ok(ProcessResponse {
            success: true,
            download_url: Some(url),
            file_name: Some(name),
            original_size: Some(report.original_size as u64),
            compressed_size: Some(report.compressed_size as u64),
            compression_ratio: Some(report.ratio_label()),
            ..ProcessResponse::default()
        })
    })
    .await?;

    Ok(Json(response))
}

/// Handler: POST /functions/v1/merge-pdf
pub async fn merge_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let form = read_form(multipart, Endpoint::MergePdf).await?;
    if form.files.len() < Endpoint::MergePdf.min_files() {
        return Err(ApiError::InvalidRequest(
            "At least 2 PDF files required for merging".into(),
        ));
    }
    check_pdfs(&form.files)?;

    let files_merged = form.files.len() as u32;
    let total_size: u64 = form.files.iter().map(|f| f.bytes.len() as u64).sum();
    let documents: Vec<Vec<u8>> = form.files.into_iter().map(|f| f.bytes).collect();

    let response = blocking(move || {
        let merged = merge_documents(documents)?;
        let name = object_name("merged", ".pdf");
        let url = state.publish(&name, &merged)?;
        info!("Merged {} files into {} bytes", files_merged, merged.len());
        Ok(ProcessResponse {
            success: true,
            download_url: Some(url),
            file_name: Some(name),
            files_merged: Some(files_merged),
            total_size: Some(total_size),
            ..ProcessResponse::default()
        })
    })
    .await?;

    Ok(Json(response))
}

/// Handler: POST /functions/v1/split-pdf
///
/// Optional `ranges` field ("1-3, 5"): one output per comma-separated group.
/// Without it every page becomes its own file.
pub async fn split_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let mut form = read_form(multipart, Endpoint::SplitPdf).await?;
    let groups = match form.fields.remove("ranges") {
        Some(ranges) if !ranges.trim().is_empty() => parse_range_groups(&ranges)?,
        _ => Vec::new(),
    };
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InvalidRequest("No file provided".into()))?;
    check_pdfs(std::slice::from_ref(&upload))?;

    let response = blocking(move || {
        let parts = split_into_parts(&upload.bytes, &groups)?;
        let stem = sanitize_file_name(&upload.name);
        let stem = stem.strip_suffix(".pdf").unwrap_or(&stem).to_string();
        let batch = object_name("split", "");

        let mut split_files = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let file_name = format!("{}_part_{}.pdf", stem, index + 1);
            let object = format!("{}_{}", batch, file_name);
            let download_url = state.publish(&object, &part.bytes)?;
            split_files.push(SplitFile {
                file_name,
                pages: part.pages.clone(),
                download_url,
            });
        }
        info!("Split {} into {} parts", upload.name, split_files.len());

        Ok(ProcessResponse {
            success: true,
            split_files: Some(split_files),
            ..ProcessResponse::default()
        })
    })
    .await?;

    Ok(Json(response))
}

/// Handler: POST /functions/v1/image-to-pdf
pub async fn image_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let form = read_form(multipart, Endpoint::ImageToPdf).await?;
    if form.files.is_empty() {
        return Err(ApiError::InvalidRequest("No images provided".into()));
    }

    let images: Vec<ImageInput> = form
        .files
        .into_iter()
        .map(|f| ImageInput {
            name: f.name,
            bytes: f.bytes,
        })
        .collect();

    let response = blocking(move || {
        let pdf = images_to_pdf(&images)?;
        let name = object_name("converted", ".pdf");
        let url = state.publish(&name, &pdf)?;
        info!("Converted {} images into {} bytes", images.len(), pdf.len());
        Ok(ProcessResponse {
            success: true,
            download_url: Some(url),
            file_name: Some(name),
            images_processed: Some(images.len() as u32),
            ..ProcessResponse::default()
        })
    })
    .await?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    pub download: Option<String>,
}

/// Handler: GET /storage/v1/object/public/:bucket/:name
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, name)): Path<(String, String)>,
    Query(query): Query<ObjectQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    if bucket != state.bucket {
        return Err(ApiError::NotFound(format!("Bucket {}", bucket)));
    }

    let store = state.store.clone();
    let lookup = name.clone();
    let bytes = blocking(move || match store.get(&bucket, &lookup) {
        Err(StorageError::InvalidName(_)) => Ok(None),
        other => Ok(other?),
    })
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Object {}", name)))?;

    let content_type = if name.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    if let Some(download) = query.download {
        let file_name = if download.is_empty() {
            name.clone()
        } else {
            sanitize_file_name(&download)
        };
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((headers, bytes))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route".into())
}
