//! Bounded Delivery Queue Component
//!
//! A fixed-capacity, thread-safe message queue with sequence tracking and a
//! drop-on-full policy. It sits between any number of producer threads and a
//! single delivery worker (see [`crate::delivery`]).
//!
//! # Overview
//!
//! - **Never blocks producers**: a full queue drops new messages and counts them
//! - **Burst reporting**: once two slots free up, the queue appends one report
//!   describing how many messages the burst lost and for how long
//! - **Sequence tracking**: every admitted message can carry a sequence number;
//!   a [`SequenceRange`] answers "is this message still queued?"
//! - **Zero-copy batches**: messages are frozen into `Arc<Message>` at admission
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  ┌────────────┐  ┌────────────┐
//! │ Producer A │  │ Producer B │  │ Producer C │
//! └─────┬──────┘  └─────┬──────┘  └─────┬──────┘
//!       │ enqueue       │ enqueue       │ enqueue
//!       ▼               ▼               ▼
//! ┌─────────────────────────────────────────────┐
//! │ BoundedQueue (capacity C, one mutex)        │
//! │  ┌───┬───┬───┬───┬───┬───┐   full? drop    │
//! │  │ 7 │ 8 │ 9 │10 │11 │...│   and count     │
//! │  └───┴───┴───┴───┴───┴───┘                 │
//! │  SequenceRange (last_out, last_in]          │
//! └───────────────────┬─────────────────────────┘
//!                     │ dequeue_up_to(batch)
//!                     ▼
//!              ┌─────────────┐
//!              │   worker    │ ──▶ sinks
//!              └─────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use logpump::queue::{BoundedQueue, Message, MessageType, QueueConfig};
//!
//! let queue = BoundedQueue::new(QueueConfig::with_capacity(2));
//! queue.set_source("example").unwrap();
//! queue.enable();
//!
//! queue.enqueue_one(Message::new("svc", MessageType::Info, "one"));
//! queue.enqueue_one(Message::new("svc", MessageType::Info, "two"));
//! queue.enqueue_one(Message::new("svc", MessageType::Info, "three"));
//! assert_eq!(queue.count(), 2);
//! assert_eq!(queue.total_drop_count(), 1);
//!
//! let batch = queue.dequeue_up_to(10);
//! assert_eq!(batch.len(), 2);
//! ```

pub mod api;
mod error;
mod internal;
mod message;
mod sequence;
mod types;

pub use error::{QueueError, QueueResult};
pub use internal::{Admission, BoundedQueue, QueueGuard};
pub use message::{Message, MessageType, MessageTypeMask, SourceLocation};
pub use sequence::{RangeSnapshot, SeqNum, SequenceRange};
pub use types::{
    QueueConfig, QueueStats, DEFAULT_QUEUE_SIZE, DEFAULT_WAKE_THRESHOLD, MIN_QUEUE_CAPACITY,
};

#[cfg(test)]
mod tests;
