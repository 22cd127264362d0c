use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by an editing session.
///
/// Every variant is terminal for the attempt that produced it. The session
/// keeps its previous mask so the caller can retry without re-uploading.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid image: {0}")]
    InvalidInput(String),

    #[error(
        "Request timed out after {} s. The segmentation server is sleeping or overloaded.",
        .after.as_secs()
    )]
    Timeout { after: Duration },

    #[error("Backend error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Backend { status: Option<u16>, message: String },

    #[error("No image loaded")]
    NoImage,

    #[error("A segmentation request is already in flight")]
    Busy,

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

impl SessionError {
    pub fn backend(message: impl Into<String>) -> Self {
        SessionError::Backend {
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Backend {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_limit() {
        let err = SessionError::Timeout {
            after: Duration::from_secs(180),
        };
        assert!(err.to_string().contains("180 s"));
    }

    #[test]
    fn test_backend_message_with_and_without_status() {
        let with = SessionError::Backend {
            status: Some(503),
            message: "down".into(),
        };
        assert_eq!(with.to_string(), "Backend error (status 503): down");
        assert_eq!(SessionError::backend("oops").to_string(), "Backend error: oops");
    }
}
