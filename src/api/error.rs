//! Typed errors for analytics API calls

use thiserror::Error;

/// Failures talking to the analytics API
///
/// The display text of each variant is what panels report to the refresh
/// coordinator, so it is written for an operator reading the dashboard.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection refused, timeout, TLS failure, ...
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not the JSON shape we expect
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The configured base URL cannot be parsed
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// Whether the service itself reported a server-side failure (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
