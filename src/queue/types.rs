//! Configuration and statistics types for the bounded queue

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::sequence::SeqNum;
use serde::Deserialize;

/// Default number of messages a queue holds before dropping
pub const DEFAULT_QUEUE_SIZE: usize = 10000;

/// Smallest capacity a queue will be built with
///
/// The drop report needs two free slots to be admitted, so anything smaller
/// could never report its own drops.
pub const MIN_QUEUE_CAPACITY: usize = 2;

/// Backlog at which an enqueue wakes the worker early
pub const DEFAULT_WAKE_THRESHOLD: usize = 100;

/// Queue construction settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of queued messages (floored at [`MIN_QUEUE_CAPACITY`])
    pub capacity: usize,
    /// Assign sequence numbers at admission instead of trusting producers
    pub use_local_sequence_generator: bool,
    /// Post-enqueue count at which producers signal the worker
    pub wake_threshold: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_SIZE,
            use_local_sequence_generator: true,
            wake_threshold: DEFAULT_WAKE_THRESHOLD,
        }
    }
}

impl QueueConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Capacity after the floor is applied
    pub fn effective_capacity(&self) -> usize {
        self.capacity.max(MIN_QUEUE_CAPACITY)
    }

    /// Reject settings that cannot be corrected by flooring
    pub fn validate(&self) -> QueueResult<()> {
        if self.wake_threshold == 0 {
            return Err(QueueError::Configuration {
                message: "wake_threshold must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Approximate point-in-time view of a queue, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    pub count: usize,
    pub capacity: usize,
    pub enabled: bool,
    pub full: bool,
    pub total_drop_count: u64,
    pub last_in: SeqNum,
    pub last_out: SeqNum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_floor() {
        assert_eq!(QueueConfig::with_capacity(0).effective_capacity(), 2);
        assert_eq!(QueueConfig::with_capacity(1).effective_capacity(), 2);
        assert_eq!(QueueConfig::with_capacity(2).effective_capacity(), 2);
        assert_eq!(QueueConfig::with_capacity(50).effective_capacity(), 50);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: QueueConfig = toml::from_str("capacity = 64").unwrap();

        assert_eq!(config.capacity, 64);
        assert!(config.use_local_sequence_generator);
        assert_eq!(config.wake_threshold, DEFAULT_WAKE_THRESHOLD);
    }

    #[test]
    fn test_zero_wake_threshold_is_rejected() {
        let config = QueueConfig {
            wake_threshold: 0,
            ..QueueConfig::default()
        };

        match config.validate() {
            Err(QueueError::Configuration { message }) => {
                assert!(message.contains("wake_threshold"));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
        assert!(QueueConfig::default().validate().is_ok());
    }
}
