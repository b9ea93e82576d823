//! API error types.
//!
//! The variants follow the failure classes a caller has to tell apart:
//! transport failure, authentication failure that reauthorization could not
//! fix, validation failure (4xx with field detail), and server failure (5xx).

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Keys checked, in order, for a message that applies to the whole form.
const GENERAL_MESSAGE_KEYS: [&str; 3] = ["detail", "error", "non_field_errors"];

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response received (connection refused, DNS, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// 401 that reauthorization did not recover from
    #[error("Unauthorized: {}", summarize_body(.body))]
    Unauthorized { body: Value },

    /// Other 4xx; the body usually carries field-level detail
    #[error("Request rejected (HTTP {status}): {}", summarize_body(.body))]
    Validation { status: StatusCode, body: Value },

    /// 5xx
    #[error("Server error (HTTP {status}): {}", summarize_body(.body))]
    Server { status: StatusCode, body: Value },

    /// Response body did not match the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token storage failed
    #[error("Token storage error: {0}")]
    Storage(#[from] meetup_storage::StorageError),

    /// Base URL or path could not be turned into a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(status: StatusCode, body: Value) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { body }
        } else if status.is_server_error() {
            ApiError::Server { status, body }
        } else {
            ApiError::Validation { status, body }
        }
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Validation { status, .. } | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 401 that was propagated to the caller.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Response body, when a response was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Unauthorized { body }
            | ApiError::Validation { body, .. }
            | ApiError::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    /// First message found under the given fields, in order.
    ///
    /// A field may hold a string or a list of strings (the first is used).
    pub fn field_message(&self, fields: &[&str]) -> Option<String> {
        let body = self.body()?.as_object()?;
        fields
            .iter()
            .find_map(|field| body.get(*field).and_then(first_message))
    }

    /// Message to show the user: a general message if the server sent one,
    /// else the first field-specific message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.field_message(&GENERAL_MESSAGE_KEYS) {
            return message;
        }

        self.body()
            .and_then(Value::as_object)
            .and_then(|body| body.values().find_map(first_message))
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

fn summarize_body(body: &Value) -> String {
    const MAX_LEN: usize = 200;
    let text = match body {
        Value::Null => return "<empty body>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_LEN {
        let truncated: String = text.chars().take(MAX_LEN).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classifies_statuses() {
        assert!(ApiError::from_response(StatusCode::UNAUTHORIZED, Value::Null).is_unauthorized());
        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_REQUEST, Value::Null),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, Value::Null),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_GATEWAY, Value::Null),
            ApiError::Server { .. }
        ));
    }

    #[test]
    fn test_status_is_reported() {
        let err = ApiError::from_response(StatusCode::FORBIDDEN, Value::Null);
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(ApiError::Network("refused".into()).status(), None);
    }

    #[test]
    fn test_user_message_prefers_detail() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Login failed", "username": ["ignored"] }),
        );
        assert_eq!(err.user_message("fallback"), "Login failed");
    }

    #[test]
    fn test_user_message_reads_error_key() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "This meetup is full" }),
        );
        assert_eq!(err.user_message("Failed to join meetup"), "This meetup is full");
    }

    #[test]
    fn test_user_message_falls_back_to_first_field_list() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            json!({ "email": ["Enter a valid email address."] }),
        );
        assert_eq!(
            err.user_message("Registration failed"),
            "Enter a valid email address."
        );
    }

    #[test]
    fn test_user_message_uses_fallback() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, Value::Null);
        assert_eq!(err.user_message("Registration failed"), "Registration failed");

        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn test_field_message_respects_order() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            json!({
                "email": ["user with this email already exists."],
                "username": ["A user with that username already exists."]
            }),
        );
        assert_eq!(
            err.field_message(&["username", "email"]).as_deref(),
            Some("A user with that username already exists.")
        );
        assert_eq!(
            err.field_message(&["email", "username"]).as_deref(),
            Some("user with this email already exists.")
        );
        assert_eq!(err.field_message(&["password"]), None);
    }

    #[test]
    fn test_display_truncates_large_bodies() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, json!("x".repeat(1000)));
        let text = err.to_string();
        assert!(text.starts_with("Server error (HTTP 502 Bad Gateway)"));
        assert!(text.ends_with("..."));
        assert!(text.len() < 300);
    }
}
