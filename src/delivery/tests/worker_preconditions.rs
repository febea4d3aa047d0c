//! Worker start-up precondition tests

#[cfg(test)]
mod tests {
    use crate::core::sync::WakeSignal;
    use crate::delivery::sinks::MemorySink;
    use crate::delivery::worker::{DeliveryState, DeliveryWorker, WorkerPhase, WorkerSettings};
    use crate::delivery::SinkHandle;
    use crate::queue::api::{BoundedQueue, QueueConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> WorkerSettings {
        WorkerSettings {
            batch_size: 16,
            idle_wait: Duration::from_millis(10),
        }
    }

    fn run_to_completion(
        state: Arc<DeliveryState>,
        sinks: Vec<SinkHandle>,
    ) -> std::thread::Result<()> {
        let worker = DeliveryWorker::new(state, sinks.into(), settings());
        worker
            .spawn("precondition-test".to_string())
            .unwrap()
            .join()
    }

    #[test]
    fn test_missing_wakeup_panics_and_cleans_up() {
        let queue = BoundedQueue::new(QueueConfig::with_capacity(8));
        queue.set_source("no-wakeup").unwrap();
        queue.enable();
        let state = Arc::new(DeliveryState::new(Arc::new(queue)));
        let sink = Arc::new(MemorySink::new("memory"));

        let result = run_to_completion(Arc::clone(&state), vec![sink.clone() as SinkHandle]);

        assert!(result.is_err(), "worker should refuse to start");
        assert!(!state.queue.is_enabled());
        assert!(sink.is_shut_down());
        assert!(!sink.is_started());
        assert_eq!(state.phase(), WorkerPhase::Stopped);
    }

    #[test]
    fn test_disabled_queue_panics() {
        let queue =
            BoundedQueue::with_wakeup(QueueConfig::with_capacity(8), Arc::new(WakeSignal::new()));
        queue.set_source("disabled").unwrap();
        let state = Arc::new(DeliveryState::new(Arc::new(queue)));
        let sink = Arc::new(MemorySink::new("memory"));

        let result = run_to_completion(Arc::clone(&state), vec![sink.clone() as SinkHandle]);

        assert!(result.is_err());
        assert!(sink.is_shut_down());
        assert_eq!(state.phase(), WorkerPhase::Stopped);
    }

    #[test]
    fn test_no_sinks_panics() {
        let queue =
            BoundedQueue::with_wakeup(QueueConfig::with_capacity(8), Arc::new(WakeSignal::new()));
        queue.set_source("no-sinks").unwrap();
        queue.enable();
        let state = Arc::new(DeliveryState::new(Arc::new(queue)));

        let result = run_to_completion(Arc::clone(&state), Vec::new());

        assert!(result.is_err());
        assert!(!state.queue.is_enabled());
    }

    #[test]
    fn test_valid_worker_exits_cleanly_when_disabled() {
        let queue =
            BoundedQueue::with_wakeup(QueueConfig::with_capacity(8), Arc::new(WakeSignal::new()));
        queue.set_source("valid").unwrap();
        queue.enable();
        let state = Arc::new(DeliveryState::new(Arc::new(queue)));
        let sink = Arc::new(MemorySink::new("memory"));

        let sinks: Vec<SinkHandle> = vec![sink.clone()];
        let worker = DeliveryWorker::new(Arc::clone(&state), sinks.into(), settings());
        let handle = worker.spawn("valid-worker".to_string()).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        state.queue.disable();

        assert!(handle.join().is_ok());
        assert!(sink.is_started());
        assert!(sink.is_shut_down());
        assert_eq!(state.phase(), WorkerPhase::Stopped);
    }
}
