//! Host lifecycle signals
//!
//! The scheduler does not own process startup. The host hands it a
//! [`Lifecycle`] and signals readiness when the rest of the process is up;
//! starting the worker pool waits for that signal.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Lifecycle {
    ready: Mutex<bool>,
    ready_cond: Condvar,
}

impl Lifecycle {
    /// A lifecycle that has not signaled readiness yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A lifecycle that is already ready, for hosts without a startup phase
    pub fn ready() -> Self {
        Self {
            ready: Mutex::new(true),
            ready_cond: Condvar::new(),
        }
    }

    pub fn signal_ready(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        if !*ready {
            *ready = true;
            info!("Host signaled ready");
        }
        drop(ready);
        self.ready_cond.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the host signals readiness
    pub fn wait_ready(&self) {
        debug!("Lifecycle::wait_ready: called");
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            ready = self.ready_cond.wait(ready).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until ready or the timeout elapses; returns readiness
    pub fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        debug!(?timeout, "Lifecycle::wait_ready_timeout: called");
        let deadline = Instant::now() + timeout;
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .ready_cond
                .wait_timeout(ready, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            ready = next;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_not_ready_by_default() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_ready());
        assert!(!lifecycle.wait_ready_timeout(Duration::from_millis(10)));
        assert!(Lifecycle::ready().is_ready());
    }

    #[test]
    fn test_signal_wakes_waiter() {
        let lifecycle = Arc::new(Lifecycle::new());
        let waiter = {
            let lifecycle = Arc::clone(&lifecycle);
            thread::spawn(move || lifecycle.wait_ready())
        };

        thread::sleep(Duration::from_millis(20));
        lifecycle.signal_ready();
        waiter.join().unwrap();
        assert!(lifecycle.is_ready());
    }
}
