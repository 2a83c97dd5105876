//! Huginn error types

use std::time::Duration;

/// Huginn error types.
///
/// `Clone` so that a single failed upstream fetch can be handed to every
/// request that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HuginnError {
    // Admission
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    // Upstream errors
    #[error("upstream rejected the request with HTTP {status}")]
    UpstreamRejected { status: u16 },

    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    // Routing
    #[error("invalid {kind} key: {key:?}")]
    InvalidKey { kind: &'static str, key: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HuginnError {
    /// Whether a caller may reasonably retry the same request later.
    ///
    /// Nothing inside huginn retries; this is for operators layering their
    /// own policy on top.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Unreachable(_) | Self::Timeout(_) => true,
            Self::UpstreamRejected { status } => *status == 429 || *status >= 500,
            Self::InvalidKey { .. } | Self::Configuration(_) => false,
        }
    }

    /// Suggested wait before retrying, when one is known.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
