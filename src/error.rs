//! Error types for Library Portal

use reqwest::StatusCode;
use thiserror::Error;

/// How a failure is surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caught before any request left the client, shown inline
    Validation,
    /// The backend refused or could not be reached; terminal to the action
    Request,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a non-2xx status and the backend's message onto an error variant
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => AppError::Authentication(message),
            StatusCode::FORBIDDEN => AppError::Authorization(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::CONFLICT => AppError::Conflict(message),
            _ => AppError::Request {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Request,
        }
    }

    /// Message suitable for an inline error or toast
    pub fn user_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::Session(msg) => msg.clone(),
            AppError::Request { message, .. } => message.clone(),
            AppError::Network(e) => {
                if e.is_timeout() {
                    "The server took too long to respond".to_string()
                } else {
                    "Unable to reach the server".to_string()
                }
            }
            AppError::Decode(_) => "Unexpected response from the server".to_string(),
            AppError::Io(e) => e.to_string(),
            AppError::Internal(_) => "Something went wrong".to_string(),
        }
    }

    /// The session token was rejected and should be dropped
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AppError::Authentication(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = crate::views::forms::flatten_errors(&errors)
            .into_iter()
            .next()
            .map(|(_, message)| message)
            .unwrap_or_else(|| "Invalid input".to_string());
        AppError::Validation(first)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AppError::from_status(StatusCode::UNAUTHORIZED, "expired"),
            AppError::Authentication(_)
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::CONFLICT, "book has active loans"),
            AppError::Conflict(_)
        ));
        match AppError::from_status(StatusCode::BAD_GATEWAY, "upstream down") {
            AppError::Request { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_category() {
        assert_eq!(
            AppError::Validation("Title is required".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(AppError::NotFound("book".into()).category(), ErrorCategory::Request);
        assert_eq!(
            AppError::Conflict("Cannot delete".into()).user_message(),
            "Cannot delete"
        );
    }
}
