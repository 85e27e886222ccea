//! Cookie provisioning for authenticated extraction.
//!
//! A credential blob is read once from configuration and parsed into a
//! [`ParseOutcome`]. Every request then asks the [`CookieProvisioner`] for a
//! fresh [`CookieJar`]: a Netscape cookie file in a uniquely named temporary
//! file that is removed when the jar is dropped.

use serde::Deserialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Domain used when a cookie record (or a bare session token) does not name one
pub const DEFAULT_DOMAIN: &str = ".instagram.com";

/// Path used when a cookie record does not name one
pub const DEFAULT_PATH: &str = "/";

/// First line of every jar; yt-dlp uses it to recognize the format
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

const SESSION_COOKIE: &str = "sessionid";
const SESSION_PREFIX: &str = "sessionid=";
const MIN_BARE_TOKEN_LEN: usize = 20;

/// Failures while materializing a cookie jar
#[derive(thiserror::Error, Debug)]
pub enum CookieError {
    #[error("credential blob is unusable: {0}")]
    InvalidBlob(String),

    #[error("no usable cookie records in credential blob")]
    NoValidRecords,

    #[error("failed to write cookie jar: {0}")]
    Io(#[from] std::io::Error),
}

/// A cookie record as exported by browser extensions.
///
/// Unknown fields (`hostOnly`, `httpOnly`, `sameSite`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieRecord {
    pub name: Option<String>,
    pub value: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    #[serde(rename = "expirationDate")]
    pub expiration_date: Option<f64>,
}

impl CookieRecord {
    /// Convert into a jar line, or `None` when the record cannot produce a valid one.
    ///
    /// Records without a non-empty `name` and `value` are skipped, as are records
    /// whose fields would break the tab-separated layout.
    pub fn to_line(&self) -> Option<CookieLine> {
        let name = self.name.as_deref().filter(|s| !s.is_empty())?;
        let value = self.value.as_deref().filter(|s| !s.is_empty())?;
        let domain = self.domain.as_deref().unwrap_or(DEFAULT_DOMAIN);
        let path = self.path.as_deref().unwrap_or(DEFAULT_PATH);

        if [name, value, domain, path].iter().any(|field| has_separator(field)) {
            return None;
        }

        Some(CookieLine {
            domain: domain.to_string(),
            include_subdomains: domain.starts_with('.'),
            path: path.to_string(),
            secure: self.secure.unwrap_or(false),
            expires: self.expiration_date.map(|e| e.trunc() as i64).unwrap_or(0),
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

fn has_separator(field: &str) -> bool {
    field.contains(['\t', '\n', '\r'])
}

/// One line of a Netscape cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieLine {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix timestamp; 0 marks a session cookie
    pub expires: i64,
    pub name: String,
    pub value: String,
}

impl CookieLine {
    /// Session cookie carrying a bare token under the default domain
    pub fn session(token: &str) -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            include_subdomains: true,
            path: DEFAULT_PATH.to_string(),
            secure: true,
            expires: 0,
            name: SESSION_COOKIE.to_string(),
            value: token.to_string(),
        }
    }
}

impl fmt::Display for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.domain,
            netscape_bool(self.include_subdomains),
            self.path,
            netscape_bool(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }
}

fn netscape_bool(flag: bool) -> &'static str {
    if flag {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Result of interpreting a credential blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// JSON array of cookie records, already filtered to the usable ones
    StructuredCookies(Vec<CookieLine>),
    /// Bare session token with any `sessionid=` prefix removed
    BareToken(String),
    /// Neither shape; carries the reason for logging
    Invalid(String),
}

impl ParseOutcome {
    /// Interpret a non-empty credential blob
    pub fn parse(blob: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(blob) {
            Ok(serde_json::Value::Array(items)) => Self::from_records(items),
            Ok(other) => Self::Invalid(format!(
                "expected a JSON array of cookies, found {}",
                json_kind(&other)
            )),
            Err(_) => Self::from_bare_token(blob),
        }
    }

    fn from_records(items: Vec<serde_json::Value>) -> Self {
        let mut lines = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let record: CookieRecord = match serde_json::from_value(item) {
                Ok(record) => record,
                Err(e) => {
                    return Self::Invalid(format!("cookie record {} has unexpected shape: {}", index, e))
                }
            };

            match record.to_line() {
                Some(line) => lines.push(line),
                None => tracing::debug!("Skipping cookie record {} without a usable name/value", index),
            }
        }

        Self::StructuredCookies(lines)
    }

    fn from_bare_token(blob: &str) -> Self {
        if !blob.starts_with(SESSION_PREFIX) && blob.chars().count() <= MIN_BARE_TOKEN_LEN {
            return Self::Invalid("blob is neither JSON nor a session token".to_string());
        }

        let trimmed = blob.trim();
        let token = trimmed.strip_prefix(SESSION_PREFIX).unwrap_or(trimmed).trim();

        if token.is_empty() {
            Self::Invalid("session token is empty".to_string())
        } else if has_separator(token) {
            Self::Invalid("session token contains control characters".to_string())
        } else {
            Self::BareToken(token.to_string())
        }
    }

    /// Jar lines this outcome produces
    pub fn lines(&self) -> Result<Vec<CookieLine>, CookieError> {
        match self {
            Self::StructuredCookies(lines) if lines.is_empty() => Err(CookieError::NoValidRecords),
            Self::StructuredCookies(lines) => Ok(lines.clone()),
            Self::BareToken(token) => Ok(vec![CookieLine::session(token)]),
            Self::Invalid(reason) => Err(CookieError::InvalidBlob(reason.clone())),
        }
    }

    /// Short description for logs and `config --show`; never includes cookie values
    pub fn describe(&self) -> String {
        match self {
            Self::StructuredCookies(lines) => format!("JSON cookie array ({} usable records)", lines.len()),
            Self::BareToken(_) => "bare session token".to_string(),
            Self::Invalid(reason) => format!("invalid ({})", reason),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Render the full text of a Netscape cookie file
pub fn render_jar(lines: &[CookieLine]) -> String {
    let mut content = String::from(NETSCAPE_HEADER);
    content.push('\n');
    for line in lines {
        content.push_str(&line.to_string());
        content.push('\n');
    }
    content
}

/// A cookie file on disk, deleted when dropped
#[derive(Debug)]
pub struct CookieJar {
    file: NamedTempFile,
    entries: usize,
}

impl CookieJar {
    /// Write `lines` to a new uniquely named file in `dir` (or the system temp dir)
    pub fn create(lines: &[CookieLine], dir: Option<&Path>) -> Result<Self, CookieError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cookies-").suffix(".txt");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(render_jar(lines).as_bytes())?;
        file.flush()?;

        Ok(Self {
            file,
            entries: lines.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of cookie lines in the jar
    pub fn entries(&self) -> usize {
        self.entries
    }
}

/// Owns the parsed credential blob and hands out per-request cookie jars.
///
/// Parsing happens once in [`CookieProvisioner::new`]; `provision` only writes
/// files, so one provisioner can serve concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct CookieProvisioner {
    credentials: Option<ParseOutcome>,
    temp_dir: Option<PathBuf>,
}

impl CookieProvisioner {
    pub fn new(blob: Option<&str>, temp_dir: Option<PathBuf>) -> Self {
        let credentials = blob
            .filter(|b| !b.trim().is_empty())
            .map(ParseOutcome::parse);

        match &credentials {
            None => tracing::info!("No cookies configured, extraction will run unauthenticated"),
            Some(ParseOutcome::Invalid(reason)) => {
                tracing::warn!("Failed to parse cookie credentials: {}", reason)
            }
            Some(outcome) => tracing::info!("Cookie credentials loaded: {}", outcome.describe()),
        }

        Self {
            credentials,
            temp_dir,
        }
    }

    pub fn credentials(&self) -> Option<&ParseOutcome> {
        self.credentials.as_ref()
    }

    /// Materialize a fresh cookie jar for one request.
    ///
    /// Returns `None` when no credentials are configured or when they cannot be
    /// turned into a jar; failures are logged and never propagate.
    pub fn provision(&self) -> Option<CookieJar> {
        let credentials = self.credentials.as_ref()?;

        match self.try_provision(credentials) {
            Ok(jar) => {
                tracing::debug!("Cookie jar with {} entries written to {}", jar.entries(), jar.path().display());
                Some(jar)
            }
            Err(e) => {
                tracing::warn!("Proceeding without cookies: {}", e);
                None
            }
        }
    }

    fn try_provision(&self, credentials: &ParseOutcome) -> Result<CookieJar, CookieError> {
        let lines = credentials.lines()?;
        CookieJar::create(&lines, self.temp_dir.as_deref())
    }
}
