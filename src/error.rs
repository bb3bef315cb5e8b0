// MIT License - Copyright (c) 2026 Peter Wright
// Error types

use reqwest::StatusCode;

/// Why a single post-login request produced no data.
///
/// Only ever formatted into a log line. Callers of the request executor see
/// absence, never the cause.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// No bearer token yet; nothing was sent.
    #[error("not authenticated, login first")]
    NotAuthenticated,

    /// Server answered with something other than 200.
    #[error("failed with status code {}, response: {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    /// 200, but the body is not JSON.
    #[error("received non-JSON response ({content_type}): {body}")]
    NotJson { content_type: String, body: String },

    /// Declared JSON that failed to decode.
    #[error("invalid JSON body: {0}")]
    Decode(#[source] serde_json::Error),

    /// JSON response with an empty or `null` body.
    #[error("returned an empty body")]
    Empty,

    /// The request exceeded the configured timeout.
    #[error("timeout occurred")]
    Timeout,

    /// Connection, TLS or other transport failure.
    #[error("client error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl RequestError {
    /// Classify a transport-level reqwest error.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// All errors surfaced by the sector-alarm library.
#[derive(Debug, thiserror::Error)]
pub enum SectorError {
    /// Login failed. Covers bad credentials, a missing token, timeouts and
    /// transport failures alike.
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },
}

impl SectorError {
    pub(crate) fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, SectorError::Authentication { .. })
    }
}

pub type Result<T> = std::result::Result<T, SectorError>;

/// Outcome of a failed credential check, as shown to the person entering
/// the credentials.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("unknown error")]
    Unknown(#[source] SectorError),
}

impl From<SectorError> for ValidationError {
    fn from(err: SectorError) -> Self {
        if err.is_authentication() {
            ValidationError::AuthenticationFailed
        } else {
            ValidationError::Unknown(err)
        }
    }
}
