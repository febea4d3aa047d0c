//! Delivery Error Types

use crate::core::error_handling::ContextualError;
use crate::queue::QueueError;

/// Failure reported by a sink; logged by the worker, never propagated to producers
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink '{sink}' I/O failure: {source}")]
    Io {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink '{sink}' could not format message: {message}")]
    Format { sink: String, message: String },

    #[error("Sink '{sink}' is not running")]
    NotStarted { sink: String },
}

impl ContextualError for SinkError {
    fn is_user_actionable(&self) -> bool {
        false // Sink failures are runtime conditions
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors surfaced by [`crate::delivery::AsyncHandler`] construction and lifecycle
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid handler configuration: {message}")]
    Configuration { message: String },

    #[error("Handler '{name}' has been shut down and cannot be restarted")]
    ShutDown { name: String },

    #[error("Failed to spawn delivery worker for '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl ContextualError for HandlerError {
    fn is_user_actionable(&self) -> bool {
        match self {
            HandlerError::Configuration { .. } => true, // User can fix config issues
            HandlerError::ShutDown { .. } => true,
            HandlerError::Queue(err) => err.is_user_actionable(),
            HandlerError::WorkerSpawn { .. } => false,
            HandlerError::Sink(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            HandlerError::Configuration { message } => Some(message),
            HandlerError::ShutDown { .. } => Some("the handler has already been shut down"),
            HandlerError::Queue(err) => err.user_message(),
            _ => None,
        }
    }
}

/// Result type for handler operations
pub type HandlerResult<T> = Result<T, HandlerError>;
