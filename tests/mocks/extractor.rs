use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use video_download_api::{ExtractionOptions, MediaExtractor, MediaInfo, MediaMetadata, ServiceError};

/// Records what an extraction call saw
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub url: String,
    pub cookie_file: Option<PathBuf>,
    /// Cookie file contents at call time
    pub cookie_content: Option<String>,
}

/// Extractor double: answers from canned data and writes a fake audio file
#[derive(Clone)]
pub struct FakeExtractor {
    pub info_error: Option<String>,
    pub download_error: Option<String>,
    pub direct_url: Option<String>,
    pub audio_ext: String,
    pub audio: Vec<u8>,
    pub calls: Arc<Mutex<Vec<SeenCall>>>,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self {
            info_error: None,
            download_error: None,
            direct_url: Some("https://cdn.example.com/media.mp4".to_string()),
            audio_ext: "m4a".to_string(),
            audio: b"ID3 fake audio".to_vec(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeExtractor {
    pub fn failing(message: &str) -> Self {
        Self {
            info_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, url: &str, options: &ExtractionOptions) {
        let cookie_content = options
            .cookie_file
            .as_ref()
            .map(|path| std::fs::read_to_string(path).unwrap());

        self.calls.lock().unwrap().push(SeenCall {
            url: url.to_string(),
            cookie_file: options.cookie_file.clone(),
            cookie_content,
        });
    }
}

pub fn sample_metadata() -> MediaMetadata {
    MediaMetadata {
        title: "Street food tour".to_string(),
        creator: "Food Channel".to_string(),
        creator_handle: "foodchannel".to_string(),
        views: 5400,
        likes: 320,
        comments: 12,
        upload_date: "20240312".to_string(),
        duration: 58.0,
        platform: "instagram".to_string(),
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn extract_info(&self, url: &str, options: &ExtractionOptions) -> video_download_api::Result<MediaInfo> {
        self.record(url, options);

        if let Some(message) = &self.info_error {
            return Err(ServiceError::ExtractionFailed(message.clone()).into());
        }

        Ok(MediaInfo {
            metadata: sample_metadata(),
            direct_url: self.direct_url.clone(),
        })
    }

    async fn download(&self, url: &str, options: &ExtractionOptions) -> video_download_api::Result<()> {
        self.record(url, options);

        if let Some(message) = &self.download_error {
            return Err(ServiceError::ExtractionFailed(message.clone()).into());
        }

        let template = options
            .output_template
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("download called without an output template"))?;
        std::fs::write(template.replace("%(ext)s", &self.audio_ext), &self.audio)?;

        Ok(())
    }
}
