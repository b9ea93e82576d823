//! Session error types.

use meetup_api::ApiError;
use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The server call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Tokens could not be persisted
    #[error("Token storage error: {0}")]
    Storage(#[from] meetup_storage::StorageError),

    /// Registration form repeated the password differently
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl SessionError {
    /// Message to show the user, falling back to `fallback` when the server
    /// gave nothing usable.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SessionError::Api(e) => e.user_message(fallback),
            SessionError::PasswordMismatch => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use meetup_api::StatusCode;
    use serde_json::json;

    #[test]
    fn test_user_message_delegates_to_api_error() {
        let err = SessionError::from(ApiError::from_response(
            StatusCode::BAD_REQUEST,
            json!({ "username": ["A user with that username already exists."] }),
        ));
        assert_eq!(
            err.user_message("Registration failed"),
            "A user with that username already exists."
        );
    }

    #[test]
    fn test_password_mismatch_message() {
        assert_eq!(
            SessionError::PasswordMismatch.user_message("Registration failed"),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_other_errors_use_fallback() {
        let err = SessionError::InvalidStateTransition("x".into());
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }
}
