//! Edge case tests for admission, disabling and malformed input

#[cfg(test)]
mod tests {
    use crate::queue::api::{Admission, BoundedQueue, Message, MessageType, QueueConfig, SeqNum};

    fn message(text: &str) -> Message {
        Message::new("edge", MessageType::Debug, text)
    }

    #[test]
    fn test_disable_stops_admission_but_keeps_state() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(8));
        queue.set_source("edge-queue").unwrap();
        queue.enable();
        queue.enqueue_batch(vec![message("a"), message("b"), message("c")]);

        queue.disable();
        assert_eq!(queue.enqueue_one(message("late")), 3);
        assert_eq!(queue.enqueue_batch(vec![message("later")]), 3);
        assert_eq!(queue.last_in(), SeqNum::new(3));

        // Existing backlog is still removable after disable
        let batch = queue.dequeue_up_to(10);
        let texts: Vec<&str> = batch.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reenable_resumes_sequence() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(8));
        queue.set_source("edge-queue").unwrap();
        queue.enable();
        queue.enqueue_one(message("before"));
        queue.disable();
        queue.enable();
        queue.enqueue_one(message("after"));

        let batch = queue.dequeue_up_to(2);
        assert_eq!(batch[1].sequence(), Some(SeqNum::new(2)));
    }

    #[test]
    fn test_empty_messages_in_batch_are_skipped() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(8));
        queue.set_source("edge-queue").unwrap();
        queue.enable();

        let count = queue.enqueue_batch(vec![message("x"), message(""), message("y")]);

        assert_eq!(count, 2);
        assert_eq!(queue.total_drop_count(), 0);
        assert_eq!(queue.last_in(), SeqNum::new(2));
    }

    #[test]
    fn test_dequeue_from_empty_queue() {
        let queue = BoundedQueue::new(QueueConfig::default());
        queue.set_source("edge-queue").unwrap();
        queue.enable();

        assert!(queue.dequeue_up_to(10).is_empty());
        assert!(queue.dequeue_up_to(0).is_empty());
        assert_eq!(queue.last_out(), SeqNum::new(0));
    }

    #[test]
    fn test_dequeue_zero_leaves_queue_untouched() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(4));
        queue.set_source("edge-queue").unwrap();
        queue.enable();
        queue.enqueue_one(message("stay"));

        assert!(queue.dequeue_up_to(0).is_empty());
        assert_eq!(queue.count(), 1);
        assert!(queue.is_seq_still_queued(SeqNum::new(1)));
    }

    #[test]
    fn test_report_untracked_with_producer_sequences() {
        let queue = BoundedQueue::new(QueueConfig {
            use_local_sequence_generator: false,
            ..QueueConfig::with_capacity(2)
        });
        queue.set_source("edge-queue").unwrap();
        queue.enable();

        for seq in 1..=3 {
            queue.enqueue_one(message("p").with_sequence(SeqNum::new(seq)));
        }
        queue.dequeue_up_to(2);

        let report = queue.dequeue_up_to(1);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].sequence(), None);
        assert_eq!(queue.last_out(), SeqNum::new(2));
    }

    #[test]
    fn test_guard_admission_while_disabled_is_ignored() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(2));
        queue.set_source("edge-queue").unwrap();

        let mut guard = queue.lock();
        assert_eq!(guard.admit(message("nope")), Admission::Ignored);
        assert!(guard.is_empty());
    }
}
