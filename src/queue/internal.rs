//! BoundedQueue: fixed-capacity FIFO with a drop-on-full policy
//!
//! This module provides the core queue functionality with:
//! - Admission that never blocks: a full queue drops and counts instead
//! - Burst accounting, reported in-band once space frees up again
//! - Sequence tracking through a [`SequenceRange`]
//! - Arc-wrapped messages so batches can be shared with every sink
//!
//! All mutation happens under one mutex. Counters that diagnostics poll are
//! mirrored into atomics and may be read without the lock, but those reads
//! are approximate and are never used to make admission or removal decisions.

use crate::core::sync::{lock_unpoisoned, read_unpoisoned, write_unpoisoned, WakeSignal};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::{Message, MessageType};
use crate::queue::sequence::{SeqNum, SequenceRange};
use crate::queue::types::{QueueConfig, QueueStats};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

/// Outcome of offering one message to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended; carries the sequence number it is tracked under, if any
    Admitted(Option<SeqNum>),
    /// Queue was full; counted as a drop
    Dropped,
    /// Queue disabled or message empty; not counted
    Ignored,
}

/// State guarded by the queue mutex
#[derive(Debug)]
struct QueueState {
    messages: VecDeque<Arc<Message>>,
    /// Last number handed out by the local generator
    last_generated: SeqNum,
    /// Drops in the current burst
    current_drop_count: u64,
    full_since: Option<Instant>,
}

/// Exclusive access to the queue for a compound operation
///
/// Returned by [`BoundedQueue::lock`] so that an owner can update its own
/// bookkeeping inside the same critical section as an admission.
pub struct QueueGuard<'a> {
    queue: &'a BoundedQueue,
    state: MutexGuard<'a, QueueState>,
}

impl QueueGuard<'_> {
    /// Offer one message under the held lock
    pub fn admit(&mut self, message: Message) -> Admission {
        if !self.queue.is_enabled() || message.is_empty() {
            return Admission::Ignored;
        }
        self.queue.admit_locked(&mut self.state, message)
    }

    /// Exact number of queued messages
    pub fn len(&self) -> usize {
        self.state.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.messages.is_empty()
    }

    /// Drops in the current burst
    pub fn current_drop_count(&self) -> u64 {
        self.state.current_drop_count
    }
}

/// Fixed-capacity message queue feeding a single delivery worker
#[derive(Debug)]
pub struct BoundedQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    use_local_sequence: bool,
    wake_threshold: usize,
    /// Effective source identity stamped on the queue's own diagnostics
    source: RwLock<Option<String>>,
    wakeup: Option<Arc<WakeSignal>>,

    enabled: AtomicBool,
    full: AtomicBool,
    count: AtomicUsize,
    total_drop_count: AtomicU64,
    range: SequenceRange,
}

impl BoundedQueue {
    /// Create a disabled queue without a wakeup signal
    pub fn new(config: QueueConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a disabled queue that signals `wakeup` when backlog builds up
    pub fn with_wakeup(config: QueueConfig, wakeup: Arc<WakeSignal>) -> Self {
        Self::build(config, Some(wakeup))
    }

    fn build(config: QueueConfig, wakeup: Option<Arc<WakeSignal>>) -> Self {
        let capacity = config.effective_capacity();
        Self {
            state: Mutex::new(QueueState {
                messages: VecDeque::with_capacity(capacity),
                last_generated: SeqNum::default(),
                current_drop_count: 0,
                full_since: None,
            }),
            capacity,
            use_local_sequence: config.use_local_sequence_generator,
            wake_threshold: config.wake_threshold.max(1),
            source: RwLock::new(None),
            wakeup,
            enabled: AtomicBool::new(false),
            full: AtomicBool::new(false),
            count: AtomicUsize::new(0),
            total_drop_count: AtomicU64::new(0),
            range: SequenceRange::new(),
        }
    }

    /// Set the source identity used for the queue's own diagnostics
    pub fn set_source(&self, source: impl Into<String>) -> QueueResult<()> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(QueueError::InvalidSource {
                reason: "source identity must not be empty".to_string(),
            });
        }
        *write_unpoisoned(&self.source) = Some(source);
        Ok(())
    }

    pub fn source(&self) -> Option<String> {
        read_unpoisoned(&self.source).clone()
    }

    /// Start admitting messages
    ///
    /// # Panics
    ///
    /// Panics if no source identity has been set; enabling such a queue is a
    /// programming error.
    pub fn enable(&self) {
        assert!(
            read_unpoisoned(&self.source).is_some(),
            "BoundedQueue::enable called before a source identity was set"
        );
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop admitting messages and wake the worker so it starts draining
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        self.wake();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn wakeup(&self) -> Option<&Arc<WakeSignal>> {
        self.wakeup.as_ref()
    }

    /// Signal the worker, if one is attached
    pub fn wake(&self) {
        if let Some(wakeup) = &self.wakeup {
            wakeup.signal();
        }
    }

    /// Acquire the queue lock for a compound operation
    pub fn lock(&self) -> QueueGuard<'_> {
        QueueGuard {
            queue: self,
            state: lock_unpoisoned(&self.state),
        }
    }

    /// Offer one message; returns the queue length afterwards
    pub fn enqueue_one(&self, message: Message) -> usize {
        if !self.is_enabled() {
            return self.count();
        }
        let count = {
            let mut guard = self.lock();
            guard.admit(message);
            guard.len()
        };
        self.notify_if_backlogged(count);
        count
    }

    /// Offer several messages under one lock acquisition and one notification
    pub fn enqueue_batch<I>(&self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        if !self.is_enabled() {
            return self.count();
        }
        let count = {
            let mut guard = self.lock();
            for message in messages {
                guard.admit(message);
            }
            guard.len()
        };
        self.notify_if_backlogged(count);
        count
    }

    /// Wake the worker early if `count` reached the backlog threshold
    pub fn notify_if_backlogged(&self, count: usize) {
        if count >= self.wake_threshold {
            self.wake();
        }
    }

    /// Remove up to `max_count` messages in FIFO order
    ///
    /// If the queue was in a drop burst and at least two slots are free
    /// afterwards, a drop report is appended behind the remaining messages and
    /// the burst is closed.
    pub fn dequeue_up_to(&self, max_count: usize) -> Vec<Arc<Message>> {
        let mut state = lock_unpoisoned(&self.state);

        let take = max_count.min(state.messages.len());
        let batch: Vec<Arc<Message>> = state.messages.drain(..take).collect();

        if let Some(seq) = batch.iter().rev().find_map(|message| message.sequence()) {
            self.range.record_out(seq);
        }
        self.count.store(state.messages.len(), Ordering::Relaxed);

        if self.full.load(Ordering::Relaxed) && self.capacity - state.messages.len() >= 2 {
            let dropped = state.current_drop_count;
            let elapsed = state
                .full_since
                .map(|since| since.elapsed().as_secs_f64())
                .unwrap_or_default();
            let total = self.total_drop_count.load(Ordering::Relaxed);

            log::warn!(
                "Queue '{}' dropped {} messages in {:.3}s while full ({} dropped in total)",
                self.source().unwrap_or_default(),
                dropped,
                elapsed,
                total
            );
            let report = self.diagnostic(format!(
                "Dropped {} messages in {:.3}s because the delivery queue was full ({} dropped in total)",
                dropped, elapsed, total
            ));
            self.admit_internal(&mut state, report);

            state.current_drop_count = 0;
            state.full_since = None;
            self.full.store(false, Ordering::Relaxed);
        }

        batch
    }

    /// Append a final drop summary if anything was ever dropped
    ///
    /// Used by the worker while draining, after admission has been disabled.
    /// Returns true if a summary was queued.
    pub fn emit_final_drop_report(&self) -> bool {
        let total = self.total_drop_count.load(Ordering::Relaxed);
        if total == 0 {
            return false;
        }
        let mut state = lock_unpoisoned(&self.state);
        let report = self.diagnostic(format!(
            "Delivery queue stopped; {} messages were dropped in total",
            total
        ));
        self.admit_internal(&mut state, report)
    }

    /// Whether `seq` has been admitted and not yet dequeued
    pub fn is_seq_still_queued(&self, seq: SeqNum) -> bool {
        self.range.contains(seq)
    }

    pub fn range(&self) -> &SequenceRange {
        &self.range
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Approximate number of queued messages
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Approximate emptiness check
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Approximate: true while a drop burst is open
    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Relaxed)
    }

    pub fn total_drop_count(&self) -> u64 {
        self.total_drop_count.load(Ordering::Relaxed)
    }

    pub fn last_in(&self) -> SeqNum {
        self.range.last_in()
    }

    pub fn last_out(&self) -> SeqNum {
        self.range.last_out()
    }

    pub fn stats(&self) -> QueueStats {
        let snapshot = self.range.snapshot();
        QueueStats {
            count: self.count(),
            capacity: self.capacity,
            enabled: self.is_enabled(),
            full: self.is_full(),
            total_drop_count: self.total_drop_count(),
            last_in: snapshot.last_in,
            last_out: snapshot.last_out,
        }
    }

    fn admit_locked(&self, state: &mut QueueState, message: Message) -> Admission {
        if state.messages.len() < self.capacity {
            return Admission::Admitted(self.push_locked(state, message));
        }

        if !self.full.load(Ordering::Relaxed) {
            self.full.store(true, Ordering::Relaxed);
            state.full_since = Some(Instant::now());
            state.current_drop_count = 0;
        }
        state.current_drop_count += 1;
        self.total_drop_count.fetch_add(1, Ordering::Relaxed);
        Admission::Dropped
    }

    /// Privileged admission for the queue's own reports
    ///
    /// Skips the enabled check and the drop accounting, so a report can never
    /// produce another report.
    fn admit_internal(&self, state: &mut QueueState, message: Message) -> bool {
        if state.messages.len() >= self.capacity {
            log::warn!("No room left for internal report: {}", message.text);
            return false;
        }
        self.push_locked(state, message);
        true
    }

    fn push_locked(&self, state: &mut QueueState, mut message: Message) -> Option<SeqNum> {
        if self.use_local_sequence {
            state.last_generated = state.last_generated.next();
            message.assign_sequence(state.last_generated);
        }
        let sequence = message.sequence();
        if let Some(seq) = sequence {
            self.range.record_in(seq);
        }
        state.messages.push_back(Arc::new(message));
        self.count.store(state.messages.len(), Ordering::Relaxed);
        sequence
    }

    fn diagnostic(&self, text: String) -> Message {
        let source = self.source().unwrap_or_else(|| "queue".to_string());
        Message::new(source, MessageType::Warning, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_queue(capacity: usize) -> BoundedQueue {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(capacity));
        queue.set_source("test-queue").unwrap();
        queue.enable();
        queue
    }

    fn message(text: &str) -> Message {
        Message::new("test-producer", MessageType::Info, text)
    }

    #[test]
    fn test_bounded_queue_creation() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(1000));

        assert_eq!(queue.capacity(), 1000);
        assert_eq!(queue.count(), 0);
        assert!(!queue.is_enabled());
        assert!(!queue.is_full());
        assert_eq!(queue.total_drop_count(), 0);
        assert_eq!(queue.source(), None);
    }

    #[test]
    #[should_panic(expected = "source identity")]
    fn test_enable_without_source_panics() {
        let queue = BoundedQueue::new(QueueConfig::default());
        queue.enable();
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let queue = BoundedQueue::new(QueueConfig::default());

        match queue.set_source("  ") {
            Err(QueueError::InvalidSource { reason }) => assert!(reason.contains("empty")),
            other => panic!("Expected InvalidSource error, got {:?}", other),
        }
    }

    #[test]
    fn test_local_sequence_assignment() {
        let queue = enabled_queue(10);

        queue.enqueue_one(message("first"));
        queue.enqueue_one(message("second"));

        let batch = queue.dequeue_up_to(10);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].sequence(), Some(SeqNum::new(1)));
        assert_eq!(batch[1].sequence(), Some(SeqNum::new(2)));
        assert_eq!(queue.last_in(), SeqNum::new(2));
        assert_eq!(queue.last_out(), SeqNum::new(2));
    }

    #[test]
    fn test_local_generator_overrides_producer_sequence() {
        let queue = enabled_queue(10);

        queue.enqueue_one(message("tagged").with_sequence(SeqNum::new(77)));

        let batch = queue.dequeue_up_to(1);
        assert_eq!(batch[0].sequence(), Some(SeqNum::new(1)));
    }

    #[test]
    fn test_disabled_queue_ignores_messages() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(4));
        queue.set_source("test-queue").unwrap();

        assert_eq!(queue.enqueue_one(message("ignored")), 0);

        let mut guard = queue.lock();
        assert_eq!(guard.admit(message("ignored")), Admission::Ignored);
    }

    #[test]
    fn test_empty_message_is_ignored_not_dropped() {
        let queue = enabled_queue(2);
        queue.enqueue_one(message("a"));
        queue.enqueue_one(message("b"));

        let mut guard = queue.lock();
        assert_eq!(guard.admit(message("")), Admission::Ignored);
        drop(guard);

        assert_eq!(queue.total_drop_count(), 0);
        assert!(!queue.is_full());
    }

    #[test]
    fn test_guard_reports_admission_outcomes() {
        let queue = enabled_queue(2);
        let mut guard = queue.lock();

        assert_eq!(guard.admit(message("a")), Admission::Admitted(Some(SeqNum::new(1))));
        assert_eq!(guard.admit(message("b")), Admission::Admitted(Some(SeqNum::new(2))));
        assert_eq!(guard.admit(message("c")), Admission::Dropped);
        assert_eq!(guard.current_drop_count(), 1);
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_wake_signal_raised_at_threshold() {
        let wakeup = Arc::new(WakeSignal::new());
        let config = QueueConfig {
            capacity: 10,
            use_local_sequence_generator: true,
            wake_threshold: 3,
        };
        let queue = BoundedQueue::with_wakeup(config, Arc::clone(&wakeup));
        queue.set_source("test-queue").unwrap();
        queue.enable();

        queue.enqueue_one(message("1"));
        queue.enqueue_one(message("2"));
        assert!(!wakeup.is_signalled());

        queue.enqueue_one(message("3"));
        assert!(wakeup.is_signalled());
    }

    #[test]
    fn test_disable_signals_worker() {
        let wakeup = Arc::new(WakeSignal::new());
        let queue = BoundedQueue::with_wakeup(QueueConfig::default(), Arc::clone(&wakeup));
        queue.set_source("test-queue").unwrap();
        queue.enable();

        queue.disable();

        assert!(!queue.is_enabled());
        assert!(wakeup.is_signalled());
    }
}
