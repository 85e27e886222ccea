//! Normalization of extraction failures into user-facing messages.

use serde::Serialize;

/// User-facing classification of an extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Content is restricted, private or deleted
    Restricted,
    RateLimited,
    AuthRequired,
    NotFound,
    Unclassified,
}

/// Markers checked in order; the first category with a matching marker wins
const RULES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::Restricted, &["unable to extract", "empty media response"]),
    (ErrorCategory::RateLimited, &["rate-limit", "too many requests"]),
    (ErrorCategory::AuthRequired, &["login required", "not available"]),
    (ErrorCategory::NotFound, &["video not found", "404"]),
];

impl ErrorCategory {
    /// Classify a raw error string by case-insensitive substring match
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();

        RULES
            .iter()
            .find(|(_, markers)| markers.iter().any(|m| lowered.contains(m)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unclassified)
    }

    /// Message shown to the end user
    pub fn user_message(&self, raw: &str) -> String {
        match self {
            ErrorCategory::Restricted => {
                "This video may be restricted, private, or deleted. Please try a different public video.".to_string()
            }
            ErrorCategory::RateLimited => {
                "Instagram rate limit reached. Please wait a few minutes and try again.".to_string()
            }
            ErrorCategory::AuthRequired => {
                "This video requires authentication or is not publicly available.".to_string()
            }
            ErrorCategory::NotFound => {
                "Video not found. It may have been deleted or the URL is incorrect.".to_string()
            }
            ErrorCategory::Unclassified => format!("Unable to download video: {}", raw),
        }
    }
}

/// A failure ready to be returned to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedError {
    pub category: ErrorCategory,
    pub message: String,
    /// The raw error, untouched
    pub technical: String,
}

/// Map a raw extraction error to a user-safe message, keeping the original text
pub fn normalize(raw: &str) -> NormalizedError {
    let category = ErrorCategory::classify(raw);

    NormalizedError {
        category,
        message: category.user_message(raw),
        technical: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_content_message() {
        let raw = "Unable to extract video data: empty media response";
        let normalized = normalize(raw);

        assert_eq!(normalized.category, ErrorCategory::Restricted);
        assert_eq!(
            normalized.message,
            "This video may be restricted, private, or deleted. Please try a different public video."
        );
        assert_eq!(normalized.technical, raw);
    }

    #[test]
    fn test_each_category_is_reachable() {
        let cases = [
            ("ERROR: [Instagram] Empty media response", ErrorCategory::Restricted),
            ("HTTP Error 429: Too Many Requests", ErrorCategory::RateLimited),
            ("ERROR: [Instagram] abc: Requested content is not available, rate-limit reached", ErrorCategory::RateLimited),
            ("ERROR: [Instagram] abc: LOGIN REQUIRED", ErrorCategory::AuthRequired),
            ("This content is not available in your country", ErrorCategory::AuthRequired),
            ("Video not found", ErrorCategory::NotFound),
            ("HTTP Error 404: Not Found", ErrorCategory::NotFound),
            ("Unsupported URL: https://example.com", ErrorCategory::Unclassified),
            ("", ErrorCategory::Unclassified),
        ];

        for (raw, expected) in cases {
            assert_eq!(ErrorCategory::classify(raw), expected, "{:?}", raw);
        }
    }

    #[test]
    fn test_priority_rate_limit_beats_not_found() {
        let raw = "HTTP Error 404 after rate-limit";
        assert_eq!(normalize(raw).category, ErrorCategory::RateLimited);

        let raw = "404: unable to extract shared data";
        assert_eq!(normalize(raw).category, ErrorCategory::Restricted);
    }

    #[test]
    fn test_unclassified_embeds_raw_error() {
        let raw = "ERROR: Something odd happened";
        let normalized = normalize(raw);

        assert_eq!(normalized.message, "Unable to download video: ERROR: Something odd happened");
        assert_eq!(normalized.technical, raw);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        for raw in ["Too Many Requests", "weird", "Login required", "\u{1F600} 404"] {
            assert_eq!(normalize(raw), normalize(raw));
            assert_eq!(normalize(raw).technical, raw);
        }
    }
}
