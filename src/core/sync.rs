//! Synchronization utilities shared by the queue and the delivery worker
//!
//! A logging pipeline has to keep running after a producer thread panics while
//! holding one of its locks, so poisoned locks are recovered rather than
//! propagated as errors. The wakeup signal is the single blocking primitive the
//! delivery worker suspends on, and it always waits with a timeout.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Lock a mutex, recovering the guard if a previous holder panicked
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison_err| {
        log::warn!("Recovering poisoned mutex; a thread panicked while holding it");
        PoisonError::into_inner(poison_err)
    })
}

/// Read-lock an RwLock, recovering from poisoning
pub fn read_unpoisoned<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock an RwLock, recovering from poisoning
pub fn write_unpoisoned<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Auto-reset style wakeup signal with bounded waits
///
/// Producers call [`WakeSignal::signal`]; the worker calls
/// [`WakeSignal::reset`] at the top of each iteration and
/// [`WakeSignal::wait_timeout`] when it found nothing to do. A signal raised
/// between the reset and the wait is not lost because the flag is sticky until
/// the next reset.
#[derive(Debug, Default)]
pub struct WakeSignal {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake the waiter, if any
    pub fn signal(&self) {
        let mut signalled = lock_unpoisoned(&self.signalled);
        *signalled = true;
        self.condvar.notify_all();
    }

    /// Clear the signal
    pub fn reset(&self) {
        *lock_unpoisoned(&self.signalled) = false;
    }

    pub fn is_signalled(&self) -> bool {
        *lock_unpoisoned(&self.signalled)
    }

    /// Block until signalled or until `timeout` elapses
    ///
    /// Returns true if the signal was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let signalled = lock_unpoisoned(&self.signalled);
        let (signalled, _) = self
            .condvar
            .wait_timeout_while(signalled, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        *signalled
    }
}
