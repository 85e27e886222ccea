//! Video Download API - a small HTTP service in front of yt-dlp
//!
//! This library turns social-media URLs into direct media links or base64-encoded
//! audio payloads. Authentication cookies are provisioned per request from a
//! credential blob, and extraction failures are normalized into user-facing messages.

pub mod cli;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod extractors;
pub mod server;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use cookies::{CookieJar, CookieProvisioner, ParseOutcome};
pub use errors::{normalize, ErrorCategory, NormalizedError};
pub use extractors::{ExtractionOptions, MediaExtractor, MediaInfo, MediaMetadata};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the service
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Raw failure text reported by the extraction tool, kept verbatim
    #[error("{0}")]
    ExtractionFailed(String),
}
