//! pdfdesk API server
//!
//! Hosts the processing functions called by the tool dialogs and serves
//! their outputs from a public bucket.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use pdfdesk_core::Endpoint;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod storage;

pub use config::Args;
pub use error::ApiError;
pub use state::AppState;
pub use storage::{LocalStore, ObjectStore, StorageError};

fn function_path(endpoint: Endpoint) -> String {
    format!("/functions/v1/{}", endpoint)
}

/// Build the router with CORS, tracing and the upload limit applied
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            &function_path(Endpoint::ImageToPdf),
            post(handlers::image_to_pdf),
        )
        .route(
            &function_path(Endpoint::CompressPdf),
            post(handlers::compress_pdf),
        )
        .route(&function_path(Endpoint::SplitPdf), post(handlers::split_pdf))
        .route(&function_path(Endpoint::MergePdf), post(handlers::merge_pdf))
        .route(
            "/storage/v1/object/public/:bucket/:name",
            get(handlers::get_object),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
