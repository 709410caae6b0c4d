//! Error handling for tokloader

use std::time::Duration;
use thiserror::Error;

/// Failure of a single resolver endpoint.
///
/// The resolver recovers from these locally by moving on to the next
/// endpoint; only the last one survives, as the reason inside
/// [`ResolutionError::AllSourcesFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0}")]
    Unreachable(String),

    #[error("{}", timeout_message(.0))]
    Timeout(Duration),

    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error("No data from API")]
    NoData,

    /// The payload had an unexpected shape; the detail is only logged
    #[error("No data from API")]
    Decode(String),

    #[error("No data from API")]
    NoPlayableUrl,
}

impl SourceError {
    /// Classify a transport failure of a request bounded by `timeout`
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Unreachable(err.to_string())
        }
    }
}

/// Wording shared by every elapsed request deadline
pub fn timeout_message(timeout: &Duration) -> String {
    format!("timeout of {}ms exceeded", timeout.as_millis())
}

/// Outcome of a failed `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("TikTok URL is required")]
    MissingReference,

    #[error("Invalid TikTok URL format")]
    InvalidReference(String),

    #[error("Failed to fetch video data from TikTok APIs")]
    AllSourcesFailed { last_error: String },
}

/// Returned by a [`ByteSink`](crate::relay::ByteSink) once the caller has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("byte sink closed by the caller")]
pub struct SinkClosed;

/// Relay failures.
///
/// `ResolutionFailed`, `NoVariantAvailable` and `Upstream` happen before any
/// header reaches the caller and can still become a structured response.
/// `Cancelled` is also pre-commit, but nobody is left to receive it.
/// The rest happen after commit and can only be logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error(transparent)]
    ResolutionFailed(#[from] ResolutionError),

    #[error("No video quality available")]
    NoVariantAvailable,

    #[error("{0}")]
    Upstream(String),

    #[error("Upstream stream failed after headers were sent: {0}")]
    UpstreamStream(String),

    #[error("Client disconnected before headers were sent")]
    Cancelled,

    #[error("Client disconnected after {bytes_sent} bytes")]
    ClientDisconnected { bytes_sent: u64 },

    #[error("Internal relay error: {0}")]
    Internal(String),
}

impl RelayError {
    /// True when the failure happened after response headers were committed.
    pub fn is_post_commit(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamStream(_) | RelayError::ClientDisconnected { .. }
        )
    }
}
