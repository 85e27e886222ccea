use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::Instrument;
use uuid::Uuid;

use super::{AppState, ApiError, ApiResult, SERVICE_NAME};
use crate::config::Config;
use crate::extractors::{find_downloaded_audio, AudioFormat, ExtractionOptions, MediaMetadata, AUDIO_FILE_STEM};
use crate::utils;

/// Body accepted by the extraction endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResponse {
    pub success: bool,
    pub audio_base64: String,
    pub mime_type: String,
    /// Rounded to two decimals
    pub file_size_mb: f64,
    pub metadata: MediaMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoUrlResponse {
    pub success: bool,
    pub video_url: String,
    pub metadata: MediaMetadata,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// Download the audio track of `url` and return it base64-encoded with metadata
pub async fn download_audio_base64(
    State(state): State<AppState>,
    payload: Result<Json<MediaRequest>, JsonRejection>,
) -> ApiResult<Json<AudioResponse>> {
    let url = requested_url(payload)?;
    let span = tracing::info_span!("download_audio", request_id = %Uuid::new_v4());

    fetch_audio(&state, &url).instrument(span).await.map(Json)
}

/// Resolve a direct media URL for `url`
pub async fn video_url(
    State(state): State<AppState>,
    payload: Result<Json<MediaRequest>, JsonRejection>,
) -> ApiResult<Json<VideoUrlResponse>> {
    let url = requested_url(payload)?;
    let span = tracing::info_span!("video_url", request_id = %Uuid::new_v4());

    resolve_video_url(&state, &url).instrument(span).await.map(Json)
}

fn requested_url(payload: Result<Json<MediaRequest>, JsonRejection>) -> ApiResult<String> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection);
        ApiError::bad_request("Invalid JSON body")
    })?;

    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("No URL provided"))?;

    utils::validate_url(&url).map_err(|e| {
        tracing::debug!("Rejected URL: {}", e);
        ApiError::bad_request("Invalid URL")
    })?;
    Ok(url)
}

async fn fetch_audio(state: &AppState, url: &str) -> ApiResult<AudioResponse> {
    tracing::info!("Downloading audio from: {}", url);

    // Held until the response is built; dropping it deletes the file.
    let cookie_jar = state.provisioner.provision();
    let options = ExtractionOptions::new(&state.config.extractor.audio_format).with_cookie_jar(cookie_jar.as_ref());

    let info = state
        .extractor
        .extract_info(url, &options)
        .await
        .map_err(|e| ApiError::extraction(&e))?;
    let metadata = info.metadata;
    tracing::info!("Metadata extracted: {} by @{}", metadata.title, metadata.creator_handle);

    let download_dir = scratch_dir(&state.config).map_err(ApiError::unexpected)?;
    let template = download_dir.path().join(format!("{}.%(ext)s", AUDIO_FILE_STEM));
    let download_options = options.with_output_template(template.to_string_lossy());

    state
        .extractor
        .download(url, &download_options)
        .await
        .map_err(|e| ApiError::extraction(&e))?;

    let audio_path = find_downloaded_audio(download_dir.path())
        .await
        .map_err(ApiError::unexpected)?
        .ok_or_else(|| ApiError::internal("Audio file not found after download"))?;

    let file_size = fs_err::tokio::metadata(&audio_path)
        .await
        .context("Failed to inspect downloaded audio")
        .map_err(ApiError::unexpected)?
        .len();
    let file_size_mb = utils::bytes_to_megabytes(file_size);

    if file_size > state.config.max_audio_bytes() {
        return Err(ApiError::bad_request(format!(
            "Audio file too large ({:.1}MB). Maximum size is {}MB.",
            file_size_mb, state.config.extractor.max_audio_size_mb
        )));
    }

    let audio = fs_err::tokio::read(&audio_path)
        .await
        .context("Failed to read downloaded audio")
        .map_err(ApiError::unexpected)?;
    let mime_type = AudioFormat::mime_type_for_path(&audio_path);

    tracing::info!("Audio downloaded successfully: {:.2}MB ({})", file_size_mb, mime_type);

    Ok(AudioResponse {
        success: true,
        audio_base64: general_purpose::STANDARD.encode(&audio),
        mime_type: mime_type.to_string(),
        file_size_mb: utils::round_to(file_size_mb, 2),
        metadata,
    })
}

async fn resolve_video_url(state: &AppState, url: &str) -> ApiResult<VideoUrlResponse> {
    tracing::info!("Resolving media URL for: {}", url);

    let cookie_jar = state.provisioner.provision();
    let options = ExtractionOptions::new(&state.config.extractor.video_format).with_cookie_jar(cookie_jar.as_ref());

    let info = state
        .extractor
        .extract_info(url, &options)
        .await
        .map_err(|e| ApiError::extraction(&e))?;

    let video_url = info
        .direct_url
        .ok_or_else(|| ApiError::bad_request("No direct media URL available for this content"))?;

    Ok(VideoUrlResponse {
        success: true,
        video_url,
        metadata: info.metadata,
    })
}

/// Per-request download directory, removed on drop
fn scratch_dir(config: &Config) -> anyhow::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("download-");

    let dir = match &config.extractor.temp_dir {
        Some(base) => builder.tempdir_in(base),
        None => builder.tempdir(),
    };
    dir.context("Failed to create download directory")
}
