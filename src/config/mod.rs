use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cookies::ParseOutcome;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Extraction settings
    pub extractor: ExtractorConfig,

    /// Credential blob for authenticated extraction.
    ///
    /// Usually supplied through `INSTAGRAM_COOKIES` rather than the config file.
    #[serde(skip_serializing)]
    pub cookies: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    pub port: u16,

    /// Allow cross-origin requests from any origin
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Format selector for audio downloads
    pub audio_format: String,

    /// Format selector when resolving a direct media URL
    pub video_format: String,

    /// Largest audio payload returned inline, in megabytes
    pub max_audio_size_mb: u64,

    /// Directory for cookie jars and downloads (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            extractor: ExtractorConfig::default(),
            cookies: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors: true,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            audio_format: "bestaudio/best".to_string(),
            video_format: "best".to_string(),
            max_audio_size_mb: 16,
            temp_dir: None,
        }
    }
}

/// Values from the command line or environment that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cookies: Option<String>,
    pub yt_dlp_path: Option<String>,
}

impl Config {
    /// Load configuration from `path`, the default location, or built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::config_path().ok().filter(|p| p.exists()),
        };

        let config = match config_path {
            Some(config_path) => {
                tracing::debug!("Loading configuration from {}", config_path.display());
                let content = fs_err::read_to_string(&config_path)
                    .context("Failed to read config file")?;

                serde_yaml::from_str(&content)
                    .context("Failed to parse config file")?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line and environment overrides, then re-validate
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(cookies) = overrides.cookies {
            self.cookies = Some(cookies);
        }
        if let Some(yt_dlp_path) = overrides.yt_dlp_path {
            self.extractor.yt_dlp_path = yt_dlp_path;
        }

        self.validate()?;
        Ok(self)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("video-download-api").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if self.extractor.yt_dlp_path.trim().is_empty() {
            anyhow::bail!("yt-dlp path must not be empty");
        }

        if self.extractor.max_audio_size_mb == 0 {
            anyhow::bail!("max_audio_size_mb must be greater than zero");
        }

        if self.extractor.max_audio_size_mb.checked_mul(BYTES_PER_MEGABYTE).is_none() {
            anyhow::bail!("max_audio_size_mb is too large: {}", self.extractor.max_audio_size_mb);
        }

        Ok(())
    }

    /// Largest inline audio payload in bytes
    pub fn max_audio_bytes(&self) -> u64 {
        self.extractor.max_audio_size_mb.saturating_mul(BYTES_PER_MEGABYTE)
    }

    /// Describe the configured cookies without revealing them
    pub fn cookies_summary(&self) -> String {
        match self.cookies.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(blob) => ParseOutcome::parse(blob).describe(),
            None => "not configured".to_string(),
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen Address: {}:{}", self.server.host, self.server.port);
        println!("  CORS: {}", if self.server.cors { "permissive" } else { "disabled" });
        println!("  yt-dlp: {}", self.extractor.yt_dlp_path);
        println!("  Audio Format: {}", self.extractor.audio_format);
        println!("  Video Format: {}", self.extractor.video_format);
        println!("  Max Audio Size: {}MB", self.extractor.max_audio_size_mb);
        if let Some(temp_dir) = &self.extractor.temp_dir {
            println!("  Temp Dir: {}", temp_dir.display());
        }
        println!("  Cookies: {}", self.cookies_summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 9090\nextractor:\n  max_audio_size_mb: 8\n").unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.extractor.max_audio_size_mb, 8);
        assert_eq!(config.extractor.audio_format, "bestaudio/best");
        assert_eq!(config.max_audio_bytes(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = Config::default()
            .with_overrides(Overrides {
                host: Some("127.0.0.1".into()),
                port: Some(3000),
                cookies: Some("sessionid=abc".into()),
                yt_dlp_path: None,
            })
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cookies.as_deref(), Some("sessionid=abc"));
        assert_eq!(config.extractor.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let overrides = Overrides {
            port: Some(0),
            ..Default::default()
        };
        assert!(Config::default().with_overrides(overrides).is_err());

        let overrides = Overrides {
            yt_dlp_path: Some("  ".into()),
            ..Default::default()
        };
        assert!(Config::default().with_overrides(overrides).is_err());
    }

    #[test]
    fn test_oversized_audio_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "extractor:\n  max_audio_size_mb: 17592186044416\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("max_audio_size_mb is too large"));

        let config: Config = serde_yaml::from_str("extractor:\n  max_audio_size_mb: 17592186044416\n").unwrap();
        assert_eq!(config.max_audio_bytes(), u64::MAX);

        let config: Config = serde_yaml::from_str("extractor:\n  max_audio_size_mb: 17592186044415\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip_omits_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.server.port = 8181;
        config.cookies = Some("sessionid=secretsecretsecretsecret".into());
        config.save(Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret"));

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8181);
        assert!(loaded.cookies.is_none());
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_cookies_summary_is_redacted() {
        let mut config = Config::default();
        assert_eq!(config.cookies_summary(), "not configured");

        config.cookies = Some(r#"[{"name":"sessionid","value":"hunter2"}]"#.into());
        let summary = config.cookies_summary();
        assert!(summary.contains("1 usable records"));
        assert!(!summary.contains("hunter2"));
    }
}
