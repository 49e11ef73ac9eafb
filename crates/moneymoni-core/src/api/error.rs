use serde::Deserialize;
use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not signed in: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rejected by server: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI error body: `{"detail": "..."}`. Validation failures (422) carry
/// a list of objects instead of a string.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `detail` message out of a backend error body, falling back
    /// to the (truncated) raw body.
    fn detail_from_body(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody {
                detail: serde_json::Value::Array(items),
            }) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::detail_from_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(detail),
            401 => ApiError::Unauthorized(detail),
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// The message the backend (or client-side validation) attached to this
    /// error, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Unauthorized(d)
            | ApiError::AccessDenied(d)
            | ApiError::NotFound(d)
            | ApiError::BadRequest(d)
            | ApiError::ServerError(d) => {
                if d.trim().is_empty() {
                    None
                } else {
                    Some(d.clone())
                }
            }
            ApiError::Validation(v) => Some(v.to_string()),
            ApiError::Network(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Turn any error from the client into a message suitable for a banner or
/// inline form error: the backend's detail when there is one, otherwise
/// `fallback`. Transport failures get a connection hint instead.
pub fn error_message(err: &anyhow::Error, fallback: &str) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Network(e)) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        Some(ApiError::Network(_)) => {
            "Unable to connect to server. Check that the backend is running.".to_string()
        }
        Some(api_err) => api_err.detail().unwrap_or_else(|| fallback.to_string()),
        None => fallback.to_string(),
    }
}
