//! Command-line and environment configuration

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the pdfdesk API server.
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfdesk-api")]
#[command(about = "pdfdesk processing functions and public file storage")]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "PDFDESK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "54321")]
    pub port: u16,

    /// Directory holding stored objects, one subdirectory per bucket
    #[arg(long, env = "PDFDESK_STORAGE_DIR", default_value = "./storage")]
    pub storage_dir: PathBuf,

    /// Base URL used in download links (defaults to the bind address)
    #[arg(long, env = "PDFDESK_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Bucket that receives processed files
    #[arg(long, env = "PDFDESK_BUCKET", default_value = "pdf-files")]
    pub bucket: String,

    /// Largest accepted request body in bytes
    #[arg(long, env = "PDFDESK_MAX_UPLOAD_BYTES", default_value_t = 50 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.host.as_str() {
                    "0.0.0.0" | "::" => "localhost",
                    other => other,
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}
