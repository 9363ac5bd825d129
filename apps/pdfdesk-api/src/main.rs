//! pdfdesk API server binary

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use pdfdesk_api::{router, AppState, Args, LocalStore};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(log_level.into())
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    std::fs::create_dir_all(&args.storage_dir)?;
    let store = LocalStore::new(&args.storage_dir);
    let public_url = args.public_url();
    let state = Arc::new(AppState::new(Arc::new(store), &args.bucket, &public_url));

    let app = router(state, args.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("pdfdesk API listening on http://{}", addr);
    info!("Storage: {} (bucket {})", args.storage_dir.display(), args.bucket);
    info!("Download links under {}", public_url);

    axum::serve(listener, app).await?;

    Ok(())
}
