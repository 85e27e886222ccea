use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::{ExtractionOptions, MediaExtractor, MediaInfo};
use crate::{Result, ServiceError};

/// Extractor backed by the yt-dlp command-line tool
pub struct YtDlpExtractor {
    yt_dlp_path: String,
}

impl YtDlpExtractor {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.yt_dlp_path
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Build the full argument list for one invocation
    fn build_args(options: &ExtractionOptions, extra: &[&str], url: &str) -> Vec<String> {
        let mut args = options.to_args();
        args.extend(extra.iter().map(|a| a.to_string()));
        // Keep the URL from being read as an option
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Run yt-dlp and return its stdout; a non-zero exit becomes [`ServiceError::ExtractionFailed`]
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>> {
        let output = Command::new(&self.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to launch {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::ExtractionFailed(failure_message(&stderr, output.status.code())).into());
        }

        Ok(output.stdout)
    }
}

/// Pick the most useful text out of yt-dlp's stderr
fn failure_message(stderr: &str, code: Option<i32>) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        match code {
            Some(code) => format!("yt-dlp exited with status {}", code),
            None => "yt-dlp was terminated by a signal".to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract_info(&self, url: &str, options: &ExtractionOptions) -> Result<MediaInfo> {
        tracing::debug!("Extracting media info for: {}", url);

        // One document even when the URL expands to several entries
        let args = Self::build_args(options, &["--dump-single-json", "--skip-download"], url);
        let stdout = self.run(args).await?;

        let info: Value = serde_json::from_slice(&stdout).context("yt-dlp returned malformed JSON")?;
        Ok(MediaInfo::from_info(&info))
    }

    async fn download(&self, url: &str, options: &ExtractionOptions) -> Result<()> {
        tracing::debug!("Downloading media for: {}", url);

        let args = Self::build_args(options, &["--no-part"], url);
        self.run(args).await?;

        Ok(())
    }
}
