//! Error types for the API client

use ofeed_core::status_codes;
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote returned a non-success status
    #[error("{message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Plain-text meaning of the status code
        message: String,
    },

    /// Response had no body
    #[error("Empty response")]
    EmptyResponse,

    /// Results could not be prepared for upload
    #[error("Failed to insert external ids")]
    Transform(String),

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Credentials link could not be used
    #[error("Invalid credentials link: {0}")]
    InvalidCredentials(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a status error whose message is the plain-text meaning of `status`
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self::ApiResponse {
            status,
            message: status_codes::meaning(status),
        }
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::EmptyResponse
            | Self::Config(_)
            | Self::Transform(_)
            | Self::InvalidUrl(_)
            | Self::InvalidCredentials(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }

    /// Extra detail worth logging next to the short status message
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Request(e) => Some(error_chain(e)),
            Self::Transform(detail) => Some(detail.clone()),
            _ => None,
        }
    }
}

/// Render an error and its sources on one line
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Identifies a request in log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation
    pub request_id: String,
    /// URL that was called
    pub url: String,
    /// HTTP method used
    pub method: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (request_id: {})", self.method, self.url, self.request_id)
    }
}
