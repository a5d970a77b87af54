use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cattery_media::{
    content::ContentStore,
    ingest::IngestService,
    web,
};

const PUBLIC_PREFIX: &str = "/static";
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);
    let bind_address = format!("0.0.0.0:{}", port);

    let content_dir = resolve_content_dir();
    let legacy_files = resolve_legacy_files();

    let store = ContentStore::new(content_dir.clone(), PUBLIC_PREFIX);
    store.ensure_layout().await?;
    let service = Arc::new(IngestService::new(store).with_legacy_files(legacy_files));

    // Periodic temp sweep alongside the maintenance endpoint.
    let sweeper = service.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sweeper.sweep_temp().await {
                Ok(removed) if removed > 0 => info!(removed, "temp sweep"),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "temp sweep failed"),
            }
        }
    });

    let router = axum::Router::new()
        .route(
            "/api/upload/photo",
            post(web::handle_photo_upload).layer(DefaultBodyLimit::max(50 * 1024 * 1024)),
        )
        .route("/api/upload/inline", post(web::handle_inline_upload))
        .route("/api/upload/cleanup", delete(web::handle_cleanup))
        .route("/api/images", get(web::handle_list_images))
        .route("/api/images/{id}", delete(web::handle_delete_image))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(content_dir.clone()))
        .with_state(service);

    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(
        address = %bind_address,
        content_dir = %content_dir.display(),
        legacy_files,
        "cattery media service started"
    );

    let _ = axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    Ok(())
}

fn resolve_content_dir() -> PathBuf {
    let content_dir = env::var("CONTENT_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    if let Some(dir) = content_dir {
        return dir;
    }
    let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("cattery-media");
    base.push("static");
    base
}

fn resolve_legacy_files() -> bool {
    match env::var("MEDIA_LEGACY_FILES") {
        Ok(value) => !matches!(
            value.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        Err(_) => true,
    }
}
