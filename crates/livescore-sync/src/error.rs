//! Error taxonomy for upstream calls and synchronization cycles
//!
//! Recovery policy per kind:
//! - `Credential`: fatal until the client is reconfigured, never retried
//! - `RateLimit`, `Transport`: transient, eligible for manual retry
//! - `InvalidArgument`: caller bug, rejected before any request
//! - `Upstream`, `Decode`: surfaced verbatim

use thiserror::Error;

/// Maximum number of body characters kept in `Upstream` errors
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Errors produced by the upstream client and propagated by the controller
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Credential missing, blank, or rejected by the upstream (HTTP 401)
    #[error("{0}")]
    Credential(String),

    /// Upstream quota exhausted (HTTP 429)
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimit,

    /// Rejected locally before reaching the network
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other non-2xx response
    #[error("API request failed: {status}{}", fmt_body(.body))]
    Upstream { status: u16, body: String },

    /// Connect/timeout/body-read failure
    #[error("network error: {0}")]
    Transport(String),

    /// 2xx response whose payload could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

fn fmt_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

impl SyncError {
    /// Build an `Upstream` error, keeping only an excerpt of the body
    pub fn upstream(status: u16, body: &str) -> Self {
        let body: String = body.trim().chars().take(BODY_EXCERPT_CHARS).collect();
        SyncError::Upstream { status, body }
    }

    /// Errors that will not go away by asking again
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Credential(_))
    }

    /// Errors worth a manual retry after a short wait
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RateLimit | SyncError::Transport(_) => true,
            SyncError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for display next to the last good event list
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Credential(msg) => format!("API Key Error: {}", msg),
            SyncError::Upstream { status: 404, .. } => {
                "The requested sport data is not available.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}
