use url::Url;

use crate::{Result, ServiceError};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Check that a URL parses and uses HTTP or HTTPS
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|_| ServiceError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ServiceError::InvalidUrl(format!("{} (must use HTTP or HTTPS)", url)).into());
    }

    Ok(())
}

/// Convert a byte count to (binary) megabytes
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Check for optional tools that yt-dlp uses when present
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    // ffmpeg is optional but recommended
    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - recommended for merging and remuxing audio streams".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
