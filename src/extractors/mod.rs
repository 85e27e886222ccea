use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub mod ytdlp;

pub use ytdlp::YtDlpExtractor;

use crate::cookies::CookieJar;
use crate::Result;

/// File stem yt-dlp is told to write downloads under
pub const AUDIO_FILE_STEM: &str = "audio";

/// Options passed to a single extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// yt-dlp format selector, e.g. `bestaudio/best`
    pub format: String,

    pub quiet: bool,

    pub no_warnings: bool,

    /// Only process the single item behind the URL
    pub no_playlist: bool,

    /// Netscape cookie file used to authenticate requests
    pub cookie_file: Option<PathBuf>,

    /// yt-dlp output template for downloads
    pub output_template: Option<String>,
}

impl ExtractionOptions {
    /// Base template for a format selector
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            quiet: true,
            no_warnings: true,
            no_playlist: true,
            cookie_file: None,
            output_template: None,
        }
    }

    /// Reference the jar's file, if any. The jar must outlive the extraction call.
    pub fn with_cookie_jar(mut self, jar: Option<&CookieJar>) -> Self {
        self.cookie_file = jar.map(|j| j.path().to_path_buf());
        self
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    /// Render as yt-dlp command-line arguments
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--format".to_string(), self.format.clone()];

        if self.quiet {
            args.push("--quiet".to_string());
        }
        if self.no_warnings {
            args.push("--no-warnings".to_string());
        }
        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if let Some(cookie_file) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookie_file.to_string_lossy().into_owned());
        }
        if let Some(template) = &self.output_template {
            args.push("--output".to_string());
            args.push(template.clone());
        }

        args
    }
}

/// Metadata returned to clients alongside media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub creator: String,
    pub creator_handle: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// `YYYYMMDD` as reported by the extractor
    pub upload_date: String,
    /// Seconds
    pub duration: f64,
    pub platform: String,
}

impl MediaMetadata {
    /// Build from a yt-dlp info document, falling back to defaults for missing fields
    pub fn from_info(info: &Value) -> Self {
        let text = |key: &str| info[key].as_str().filter(|s| !s.is_empty());
        let count = |key: &str| info[key].as_u64().unwrap_or(0);

        Self {
            title: text("title").unwrap_or("Unknown").to_string(),
            creator: text("uploader").or_else(|| text("channel")).unwrap_or("Unknown").to_string(),
            creator_handle: text("uploader_id").or_else(|| text("channel_id")).unwrap_or("").to_string(),
            views: count("view_count"),
            likes: count("like_count"),
            comments: count("comment_count"),
            upload_date: text("upload_date").unwrap_or("").to_string(),
            duration: info["duration"].as_f64().unwrap_or(0.0),
            platform: text("extractor_key").unwrap_or("").to_lowercase(),
        }
    }
}

/// Result of an info extraction
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub metadata: MediaMetadata,

    /// Direct URL of the selected format, when a single stream was selected
    pub direct_url: Option<String>,
}

impl MediaInfo {
    pub fn from_info(info: &Value) -> Self {
        Self {
            metadata: MediaMetadata::from_info(info),
            direct_url: info["url"].as_str().map(|s| s.to_string()),
        }
    }
}

/// Audio formats the service can return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
    Opus,
    Webm,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            "opus" => Some(AudioFormat::Opus),
            "webm" => Some(AudioFormat::Webm),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Webm => "audio/webm",
        }
    }

    /// MIME type for a downloaded file; unknown extensions are reported as MP3
    pub fn mime_type_for_path(path: &Path) -> &'static str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(AudioFormat::Mp3)
            .mime_type()
    }
}

/// Trait for the external tool that resolves URLs to media
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve metadata (and a direct URL, when available) without downloading.
    ///
    /// Errors carry the tool's own failure text so they can be normalized.
    async fn extract_info(&self, url: &str, options: &ExtractionOptions) -> Result<MediaInfo>;

    /// Download media to the location given by `options.output_template`
    async fn download(&self, url: &str, options: &ExtractionOptions) -> Result<()>;
}

/// Locate the file a download wrote under [`AUDIO_FILE_STEM`], ignoring partial files
pub async fn find_downloaded_audio(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates = Vec::new();
    let mut entries = fs_err::tokio::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_match = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(AUDIO_FILE_STEM) && !n.ends_with(".part") && !n.ends_with(".ytdl"))
            .unwrap_or(false);

        if is_match && entry.file_type().await?.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}
