use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by the local HTTP surface. Only malformed local requests end
/// up here; failures of the stats service are reported as toasts instead.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures talking to the remote stats service, or rejected locally before
/// a request was made.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("an activity is already running")]
    AlreadyRunning,

    #[error("server rejected request ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// Short text for the transient message banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::AlreadyRunning => "Finish the current task first".to_string(),
            ClientError::Server { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Server { status, .. } => format!("Request failed ({status})"),
            ClientError::Transport(_) => "Network error, please try again".to_string(),
            ClientError::Malformed(_) => "Unexpected response from server".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Problems with the identity file the host writes before launching us.
/// All of these are fatal at start-up.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("host identity not found at {0}")]
    Missing(PathBuf),

    #[error("failed to read host identity: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid host identity: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("host identity has no user id")]
    NoUserId,
}
