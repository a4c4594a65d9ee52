use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Message surfaced when a failure carries no usable text of its own.
pub const FALLBACK_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{message}")]
    Api { code: ErrorCode, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response status {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::api(ErrorCode::Validation, message)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::Status { status: 401 } => Some(ErrorCode::Unauthorized),
            Self::Status { status: 403 } => Some(ErrorCode::Forbidden),
            Self::Status { status: 404 } => Some(ErrorCode::NotFound),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code() == Some(ErrorCode::Validation)
    }

    /// Text carried by the failure itself, if any.
    pub fn message(&self) -> Option<&str> {
        let message = match self {
            Self::Api { message, .. } => message.as_str(),
            Self::Transport(message) | Self::Decode(message) => message.as_str(),
            Self::Status { .. } => return None,
        };
        let message = message.trim();
        (!message.is_empty()).then_some(message)
    }

    pub fn display_message(&self) -> String {
        self.message()
            .unwrap_or(FALLBACK_ERROR_MESSAGE)
            .to_string()
    }
}

impl From<ApiError> for RemoteError {
    fn from(value: ApiError) -> Self {
        Self::Api {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_fall_back_to_generic_message() {
        let err = RemoteError::Status { status: 500 };
        assert_eq!(err.message(), None);
        assert_eq!(err.display_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn blank_api_messages_fall_back_to_generic_message() {
        let err = RemoteError::api(ErrorCode::Internal, "   ");
        assert_eq!(err.display_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn api_messages_are_surfaced_verbatim() {
        let err = RemoteError::api(ErrorCode::Unauthorized, "invalid credentials");
        assert_eq!(err.display_message(), "invalid credentials");
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[test]
    fn validation_is_derived_from_error_code() {
        assert!(RemoteError::validation("rating must be between 1 and 5").is_validation());
        assert!(!RemoteError::Status { status: 422 }.is_validation());
        assert_eq!(
            RemoteError::Status { status: 404 }.code(),
            Some(ErrorCode::NotFound)
        );
    }
}
