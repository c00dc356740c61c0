//! Application error types

use app_api::ApiError;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Nothing to do: {0}")]
    NothingSelected(String),

    // ===== Fatal Errors (application termination) =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(_) | AppError::Io(_) | AppError::Clipboard(_) | AppError::NothingSelected(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Http(e)) if e.is_timeout() => "Server did not respond in time".to_string(),
            AppError::Api(ApiError::Http(_)) => "Cannot reach the gallery server".to_string(),
            AppError::Api(ApiError::Status { status, .. }) => format!("Server error ({})", status),
            AppError::Api(ApiError::Decode(_)) => "Server sent an unexpected response".to_string(),
            AppError::Api(ApiError::Rejected(msg)) => format!("Request rejected: {}", msg),
            AppError::Clipboard(_) => "Failed to copy to clipboard".to_string(),
            AppError::NothingSelected(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(e: toml::ser::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AppError::Api(ApiError::Decode("x".into())).is_recoverable());
        assert!(AppError::Clipboard("busy".into()).is_recoverable());
        assert!(AppError::Config("bad".into()).is_fatal());
    }

    #[test]
    fn test_user_messages() {
        let e = AppError::Api(ApiError::Status { status: 404, url: "http://x/api/browse/a".into() });
        assert_eq!(e.user_message(), "Server error (404)");

        let e = AppError::Api(ApiError::Decode("expected value".into()));
        assert_eq!(e.user_message(), "Server sent an unexpected response");

        let e = AppError::NothingSelected("No images selected".into());
        assert_eq!(e.user_message(), "No images selected");
    }
}
