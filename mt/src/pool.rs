//! Worker pool
//!
//! Fixed set of OS threads that pull READY actions from the registry in
//! submission order and drive each one to a terminal state.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::action;
use crate::error::MaintenanceError;
use crate::registry::ActionRegistry;

/// Worker threads bound to one registry
#[derive(Debug, Default)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `count` additional workers
    ///
    /// Workers that spawned before a failure stay in the pool so `join`
    /// still waits for them.
    pub fn spawn(
        &mut self,
        count: usize,
        registry: &Arc<ActionRegistry>,
        max_steps: Option<u64>,
    ) -> Result<(), MaintenanceError> {
        debug!(count, ?max_steps, "WorkerPool::spawn: called");
        for _ in 0..count {
            let index = self.workers.len();
            let registry = Arc::clone(registry);
            let handle = thread::Builder::new()
                .name(format!("maintenance-worker-{index}"))
                .spawn(move || worker_loop(index, registry, max_steps))
                .map_err(|e| MaintenanceError::ThreadSpawn(format!("worker {index}: {e}")))?;
            self.workers.push(handle);
        }
        info!(workers = self.workers.len(), "Worker pool running");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to exit
    ///
    /// Workers exit once the registry is shutting down and their current
    /// action, if any, has reached a terminal state.
    pub fn join(&mut self) {
        debug!(workers = self.workers.len(), "WorkerPool::join: called");
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(%name, "Worker thread panicked");
            }
        }
    }
}

fn worker_loop(index: usize, registry: Arc<ActionRegistry>, max_steps: Option<u64>) {
    debug!(index, "worker_loop: started");
    while let Some(handle) = registry.next_ready() {
        let id = handle.id();
        let state = action::execute(&registry, handle, max_steps);
        debug!(index, id, %state, "worker_loop: action done");
    }
    debug!(index, "worker_loop: exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionFactory;
    use crate::domain::{ActionDescription, ActionProperties, ActionState};
    use std::time::Duration;

    #[test]
    fn test_pool_drains_queue_then_joins() {
        let registry = Arc::new(ActionRegistry::new(Duration::ZERO));
        let factory = ActionFactory::with_builtin();
        for n in 1..=4 {
            let desc = ActionDescription::from_pairs([("name", "Countdown".to_string()), ("iterate_count", n.to_string())]);
            registry.insert(desc, ActionProperties::empty(), &factory).unwrap();
        }

        let mut pool = WorkerPool::new();
        pool.spawn(2, &registry, None).unwrap();
        assert_eq!(pool.len(), 2);

        assert!(registry.wait_until_idle(Duration::from_secs(10)));
        registry.begin_shutdown();
        pool.join();
        assert!(pool.is_empty());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 4);
        for (row, expected) in snapshot.iter().zip(1..=4u64) {
            assert_eq!(row.state, ActionState::Complete);
            assert_eq!(row.progress, expected);
        }
    }

    #[test]
    fn test_join_without_workers() {
        let mut pool = WorkerPool::new();
        pool.join();
        assert!(pool.is_empty());
    }
}
