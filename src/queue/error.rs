//! Queue Error Types
//!
//! Overflow is not an error: it is counted and reported in-band. The only
//! recoverable failures are configuration mistakes caught before enabling.

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Invalid source identity: {reason}")]
    InvalidSource { reason: String },

    #[error("Invalid queue configuration: {message}")]
    Configuration { message: String },
}

impl crate::core::error_handling::ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::InvalidSource { reason } => Some(reason),
            QueueError::Configuration { message } => Some(message),
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
