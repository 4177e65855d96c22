use strum::Display;
use thiserror::Error;

/// Coarse classification used by callers to decide how fatal an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Local configuration is incomplete; nothing was sent to the server.
    Config,
    /// The device-code request was rejected.
    Request,
    /// Polling reached a terminal state other than a granted token.
    Poll,
    /// The token file could not be written or removed.
    Storage,
    /// The server could not resolve a session for the stored token.
    Session,
}

/// Errors produced by the device-authorization flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client ID is not configured")]
    MissingClientId,
    #[error("Device authorization endpoint not found")]
    EndpointNotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Device authorization failed (status {status}): {message}")]
    RequestFailed { status: u16, message: String },
    #[error("Access was denied by the user")]
    AccessDenied,
    #[error("The device code has expired")]
    ExpiredToken,
    #[error("Authorization server error ({code}): {description}")]
    Server { code: String, description: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("No active session for the stored token")]
    Unauthenticated,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingClientId => ErrorCategory::Config,
            Self::EndpointNotFound | Self::BadRequest(_) | Self::RequestFailed { .. } => {
                ErrorCategory::Request
            }
            Self::AccessDenied
            | Self::ExpiredToken
            | Self::Server { .. }
            | Self::Network(_)
            | Self::Cancelled => ErrorCategory::Poll,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Storage,
            Self::NotLoggedIn | Self::Unauthenticated | Self::InvalidResponse(_) => {
                ErrorCategory::Session
            }
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
