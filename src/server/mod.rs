//! HTTP surface: routing, shared state and server lifecycle.

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

use crate::config::Config;
use crate::cookies::CookieProvisioner;
use crate::extractors::{MediaExtractor, YtDlpExtractor};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "video-download-api";

/// Shared state injected into every handler.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provisioner: Arc<CookieProvisioner>,
    pub extractor: Arc<dyn MediaExtractor>,
}

impl AppState {
    /// Parse the configured credentials once and bundle them with the extractor
    pub fn new(config: Config, extractor: Arc<dyn MediaExtractor>) -> Self {
        let provisioner = CookieProvisioner::new(
            config.cookies.as_deref(),
            config.extractor.temp_dir.clone(),
        );

        Self {
            config: Arc::new(config),
            provisioner: Arc::new(provisioner),
            extractor,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = state.config.server.cors;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/download-audio-base64", post(handlers::download_audio_base64))
        .route("/video-url", post(handlers::video_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind the configured address and serve until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    let extractor = YtDlpExtractor::new(config.extractor.yt_dlp_path.clone());
    if !extractor.check_availability().await {
        tracing::warn!("{} is not runnable, extraction requests will fail", extractor.path());
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(config, Arc::new(extractor));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding to {}:{}", host, port))?;
    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // Without a handler, keep serving until the process is killed.
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
}
