//! Generic error handling utilities
//!
//! Every error enum in the crate implements [`ContextualError`] so the binary
//! can decide whether to show the caller a specific message (bad config,
//! invalid flag) or a generic context line with details at debug level
//! (I/O failures inside a sink, a worker that could not be spawned).

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use logpump::core::error_handling::log_error_with_context;
/// # use logpump::delivery::HandlerError;
/// let err = HandlerError::Configuration {
///     message: "handler needs at least one sink".to_string(),
/// };
/// log_error_with_context(&err, "Starting delivery handler");
/// // Logs: "FATAL: handler needs at least one sink"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{HandlerError, SinkError};
    use crate::queue::QueueError;

    #[test]
    fn test_configuration_errors_are_user_actionable() {
        let error = HandlerError::Configuration {
            message: "handler needs at least one sink".to_string(),
        };

        assert!(error.is_user_actionable());
        assert_eq!(error.user_message(), Some("handler needs at least one sink"));
    }

    #[test]
    fn test_queue_source_error_is_user_actionable() {
        let error = QueueError::InvalidSource {
            reason: "source identity must not be empty".to_string(),
        };

        assert!(error.is_user_actionable());
        assert!(error.user_message().unwrap().contains("empty"));
    }

    #[test]
    fn test_sink_io_error_uses_generic_context() {
        let error = SinkError::Io {
            sink: "file".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };

        assert!(!error.is_user_actionable());
        assert_eq!(error.user_message(), None);
        // Must not panic regardless of logger state
        log_error_with_context(&error, "Writing log batch");
    }
}
