//! Public API for the queue system
//!
//! External modules should import from here rather than directly from internal modules.
//! See module documentation for complete usage examples and architecture details.

// Core queue components
pub use crate::queue::internal::{Admission, BoundedQueue, QueueGuard};

// Message types and utilities
pub use crate::queue::message::{Message, MessageType, MessageTypeMask, SourceLocation};

// Sequence tracking
pub use crate::queue::sequence::{RangeSnapshot, SeqNum, SequenceRange};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Configuration and statistics
pub use crate::queue::types::{QueueConfig, QueueStats, DEFAULT_QUEUE_SIZE, MIN_QUEUE_CAPACITY};
