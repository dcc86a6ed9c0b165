use thiserror::Error;

use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or(.body.as_str()))]
    Status {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Invalid response from backend: {0}")]
    Decode(String),

    #[error("Invalid form field: {0}")]
    InvalidForm(String),

    #[error("Stored token cannot be sent as a header")]
    InvalidToken,

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let target = err
                .url()
                .map(|url| url.to_string())
                .unwrap_or_else(|| "request".to_string());
            ApiError::Timeout(target)
        } else {
            ApiError::Transport(err)
        }
    }
}

impl ApiError {
    /// HTTP status returned by the backend, if the request got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend was never reached or never answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Transport(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_prefers_backend_message() {
        let error = ApiError::Status {
            status: 404,
            message: Some("Room Not Found".to_string()),
            body: r#"{"statusCode":404,"message":"Room Not Found"}"#.to_string(),
        };
        assert_eq!(error.to_string(), "Backend returned 404: Room Not Found");
        assert_eq!(error.status_code(), Some(404));
        assert!(!error.is_transport());
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let error = ApiError::Status {
            status: 502,
            message: None,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(error.to_string(), "Backend returned 502: Bad Gateway");
    }

    #[test]
    fn test_unauthorized_statuses() {
        for status in [401, 403] {
            let error = ApiError::Status {
                status,
                message: None,
                body: String::new(),
            };
            assert!(error.is_unauthorized());
        }

        let error = ApiError::Status {
            status: 500,
            message: None,
            body: String::new(),
        };
        assert!(!error.is_unauthorized());
    }

    #[tokio::test]
    async fn test_transport_error_keeps_its_source() {
        use std::error::Error as _;

        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/rooms/all")
            .send()
            .await
            .unwrap_err();
        let error = ApiError::from(err);

        assert!(matches!(error, ApiError::Transport(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_timeout_is_transport() {
        let error = ApiError::Timeout("http://localhost/rooms/all".to_string());
        assert!(error.is_transport());
        assert_eq!(error.status_code(), None);
    }

    #[test]
    fn test_decode_error_is_not_transport() {
        let error = ApiError::Decode("expected value at line 1".to_string());
        assert!(!error.is_transport());
        assert!(!error.is_unauthorized());
    }
}
