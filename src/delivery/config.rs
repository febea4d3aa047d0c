//! Handler configuration

use crate::core::validation::validate_name;
use crate::delivery::error::{HandlerError, HandlerResult};
use crate::queue::{QueueConfig, DEFAULT_QUEUE_SIZE, DEFAULT_WAKE_THRESHOLD};
use serde::Deserialize;
use std::time::Duration;

/// Messages moved from the queue to the sinks per worker iteration
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// How long the worker sleeps when it finds nothing to do
pub const DEFAULT_IDLE_WAIT_MS: u64 = 50;

/// Sleep between checks while a flush caller waits on its barrier
pub const DEFAULT_FLUSH_POLL_MS: u64 = 5;

/// Settings for [`crate::delivery::AsyncHandler`]
///
/// Deserializes from the `[handler]` table of the configuration file; any
/// missing field takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub name: String,
    pub max_queue_size: usize,
    /// Allow producers to capture source locations if a sink wants them
    pub allow_record_source_stack_frame: bool,
    pub use_local_sequence_generator: bool,
    pub batch_size: usize,
    pub wake_threshold: usize,
    pub idle_wait_ms: u64,
    pub flush_poll_ms: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_queue_size: DEFAULT_QUEUE_SIZE,
            allow_record_source_stack_frame: false,
            use_local_sequence_generator: true,
            batch_size: DEFAULT_BATCH_SIZE,
            wake_threshold: DEFAULT_WAKE_THRESHOLD,
            idle_wait_ms: DEFAULT_IDLE_WAIT_MS,
            flush_poll_ms: DEFAULT_FLUSH_POLL_MS,
        }
    }
}

impl HandlerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Settings for the handler's queue
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.max_queue_size,
            use_local_sequence_generator: self.use_local_sequence_generator,
            wake_threshold: self.wake_threshold,
        }
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    pub fn flush_poll_interval(&self) -> Duration {
        Duration::from_millis(self.flush_poll_ms)
    }

    /// Check the values that have no sensible floor
    pub fn validate(&self) -> HandlerResult<()> {
        validate_name(&self.name).map_err(|message| HandlerError::Configuration {
            message: format!("handler name: {}", message),
        })?;
        if self.batch_size == 0 {
            return Err(HandlerError::Configuration {
                message: "batch_size must be greater than 0".to_string(),
            });
        }
        if self.idle_wait_ms == 0 || self.flush_poll_ms == 0 {
            return Err(HandlerError::Configuration {
                message: "idle_wait_ms and flush_poll_ms must be greater than 0".to_string(),
            });
        }
        self.queue_config().validate()?;
        Ok(())
    }
}
