// Error types for the alert lifecycle

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for siren operations
pub type Result<T> = std::result::Result<T, SirenError>;

/// Errors that can occur in the alert lifecycle
#[derive(Debug, Error)]
pub enum SirenError {
    /// Gated submission without a usable location
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// Summarization collaborator failed
    #[error("summarizer error: {0}")]
    Summarizer(String),

    /// Summarization collaborator did not answer within the deadline
    #[error("summarizer timed out after {0}s")]
    SummarizerTimeout(u64),

    /// Backward or unknown status transition
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Status string not in the canonical vocabulary
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// Alert does not exist
    #[error("alert not found: {0}")]
    AlertNotFound(Uuid),

    /// User does not exist (profile missing after authentication is fatal)
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    /// Notification was already claimed by another session
    #[error("notification already claimed: {0}")]
    NotificationClaimed(Uuid),

    /// Storage layer failure
    #[error("store error: {0}")]
    Store(String),
}

impl SirenError {
    /// Create a summarizer error
    pub fn summarizer(msg: impl Into<String>) -> Self {
        SirenError::Summarizer(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        SirenError::Store(msg.into())
    }

    /// Create a location error
    pub fn location(msg: impl Into<String>) -> Self {
        SirenError::LocationUnavailable(msg.into())
    }

    /// Whether the caller can meaningfully retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SirenError::Store(_) | SirenError::Summarizer(_) | SirenError::SummarizerTimeout(_)
        )
    }
}
