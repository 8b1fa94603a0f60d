//! Classification of failed forge API responses.

use reqwest::StatusCode;
use serde::Deserialize;

/// Error body returned by the Pagure API.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    error_code: Option<String>,
}

/// A forge API request that the server rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401
    AuthenticationFailed(String),
    /// HTTP 403
    Forbidden(String),
    /// HTTP 404
    NotFound(String),
    /// HTTP 429
    RateLimitExceeded(String),
    /// Other 4xx responses
    ClientError { status: u16, message: String },
    /// 5xx responses
    ServerError { status: u16, message: String },
}

impl ApiError {
    /// Build an error from a response status and its raw body.
    pub fn classify(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status {
            StatusCode::UNAUTHORIZED => ApiError::AuthenticationFailed(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimitExceeded(message),
            s if s.is_server_error() => ApiError::ServerError {
                status: s.as_u16(),
                message,
            },
            s => ApiError::ClientError {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// The server's explanation.
    pub fn message(&self) -> &str {
        match self {
            ApiError::AuthenticationFailed(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::RateLimitExceeded(msg) => msg,
            ApiError::ClientError { message, .. } | ApiError::ServerError { message, .. } => {
                message
            }
        }
    }
}

/// Extract a readable message from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(error),
            error_code,
        }) => {
            let text = match error {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            match error_code {
                Some(code) => format!("{} ({})", text, code),
                None => text,
            }
        }
        _ => body.trim().to_string(),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your Pagure API token.", msg)
            }
            ApiError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}. The token may lack the required ACL.", msg)
            }
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::RateLimitExceeded(msg) => {
                write!(f, "Rate limit exceeded: {}. Try again later.", msg)
            }
            ApiError::ClientError { status, message } => {
                write!(f, "Request rejected (HTTP {}): {}", status, message)
            }
            ApiError::ServerError { status, message } => {
                write!(f, "Server error (HTTP {}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
