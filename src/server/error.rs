use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::normalize;

/// Error returned by handlers, rendered as `{"success": false, ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Raw failure text for diagnostics
    pub technical: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    technical_error: Option<&'a str>,
}

impl ApiError {
    /// Creates a 400 error with the provided message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            technical: None,
        }
    }

    /// Creates a 500 error with the provided message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            technical: None,
        }
    }

    /// A failed extraction call: 400 with a normalized message
    pub fn extraction(err: &anyhow::Error) -> Self {
        Self::normalized(StatusCode::BAD_REQUEST, err, "Download error")
    }

    /// Anything else that went wrong while serving the request
    pub fn unexpected(err: anyhow::Error) -> Self {
        Self::normalized(StatusCode::INTERNAL_SERVER_ERROR, &err, "Unexpected error")
    }

    fn normalized(status: StatusCode, err: &anyhow::Error, label: &str) -> Self {
        let raw = format!("{:#}", err);
        tracing::error!("{}: {}", label, raw);

        let normalized = normalize(&raw);
        Self {
            status,
            message: normalized.message,
            technical: Some(normalized.technical),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
            technical_error: self.technical.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
