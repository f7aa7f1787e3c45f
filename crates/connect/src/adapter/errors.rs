//! Adapter error types and retry classification.

use std::time::Duration;
use thiserror::Error;

use storesync_core::sync::SyncCounts;

/// Classification for retry policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal for this run; retrying won't help.
    Never,
    /// Transient; retry with exponential backoff.
    WithBackoff,
}

/// Errors that can occur while one platform adapter syncs.
///
/// Adapter errors never leave the orchestrator: each one is folded into the
/// platform's result for the run.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The call exceeded its time bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The platform rate limited the request (HTTP 429).
    #[error("Rate limited by {platform}")]
    RateLimited { platform: String },

    /// Network or server-side failure reaching the platform.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credentials were refused.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The platform rejected the sync. Carries counts when the platform
    /// processed part of the batch before failing.
    #[error("Rejected by platform: {message}")]
    Rejected {
        message: String,
        counts: Option<SyncCounts>,
    },

    /// No adapter is registered for the platform.
    #[error("No adapter registered for platform '{0}'")]
    Unsupported(String),

    /// The adapter panicked or failed unexpectedly.
    #[error("Adapter failure: {0}")]
    Internal(String),
}

impl AdapterError {
    /// Returns the retry classification for this error.
    ///
    /// ```
    /// use std::time::Duration;
    /// use storesync_connect::adapter::{AdapterError, RetryClass};
    ///
    /// let error = AdapterError::Timeout(Duration::from_secs(30));
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = AdapterError::Unsupported("bigcommerce".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout(_) | Self::RateLimited { .. } | Self::Transport(_) => {
                RetryClass::WithBackoff
            }
            Self::Unauthorized(_)
            | Self::Rejected { .. }
            | Self::Unsupported(_)
            | Self::Internal(_) => RetryClass::Never,
        }
    }

    /// Counts the platform reported before failing, if any.
    pub fn partial_counts(&self) -> Option<SyncCounts> {
        match self {
            Self::Rejected { counts, .. } => *counts,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            AdapterError::Rejected {
                message: format!("invalid response body: {}", err),
                counts: None,
            }
        } else {
            AdapterError::Transport(err.to_string())
        }
    }
}
