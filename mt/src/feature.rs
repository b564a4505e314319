//! MaintenanceFeature - public entry point of the scheduler
//!
//! Composes the registry, the action factory and the worker pool:
//! - `add_action` checks dedup/cooldown, constructs and inserts the action
//! - without a running pool, `execute_now` drives the action inline
//! - `start` raises the pool once the host has signaled readiness
//! - `begin_shutdown` / `join` drain the pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::action::{self, ActionFactory};
use crate::config::MaintenanceConfig;
use crate::domain::{ActionDescription, ActionId, ActionProperties, ActionRecord, ActionSnapshot, ActionState};
use crate::error::MaintenanceError;
use crate::lifecycle::Lifecycle;
use crate::pool::WorkerPool;
use crate::registry::{ActionRegistry, RegistryStats};

#[derive(Debug, Default)]
struct PoolState {
    started: bool,
    workers: WorkerPool,
}

/// The maintenance scheduler as seen by the hosting process
pub struct MaintenanceFeature {
    config: MaintenanceConfig,
    registry: Arc<ActionRegistry>,
    factory: ActionFactory,
    lifecycle: Arc<Lifecycle>,
    pool: Mutex<PoolState>,
    threads: AtomicUsize,
}

impl MaintenanceFeature {
    /// Create a feature with no worker threads running
    pub fn new(config: MaintenanceConfig, factory: ActionFactory, lifecycle: Arc<Lifecycle>) -> Self {
        debug!(?config, ?factory, "MaintenanceFeature::new: called");
        let registry = Arc::new(ActionRegistry::new(config.cooldown()));
        Self {
            config,
            registry,
            factory,
            lifecycle,
            pool: Mutex::new(PoolState::default()),
            threads: AtomicUsize::new(0),
        }
    }

    /// Submit an action
    ///
    /// Rejections (bad description, unknown type, duplicate, cooldown) are
    /// returned immediately. With no worker threads and `execute_now` set, the
    /// action runs to completion on the calling thread and the result is ok
    /// only if it COMPLETEs; a FAILED action comes back as
    /// [`MaintenanceError::ActionFailed`] carrying its final record. Otherwise
    /// the action is queued and the result reports acceptance only.
    pub fn add_action(
        &self,
        description: ActionDescription,
        properties: ActionProperties,
        execute_now: bool,
    ) -> Result<ActionRecord, MaintenanceError> {
        debug!(%description, execute_now, "MaintenanceFeature::add_action: called");

        if !execute_now || self.thread_count() > 0 {
            debug!("MaintenanceFeature::add_action: queuing");
            return self.registry.insert(description, properties, &self.factory);
        }

        let handle = self.registry.insert_claimed(description, properties, &self.factory)?;
        let id = handle.id();
        let state = action::execute(&self.registry, handle, self.config.max_steps_per_action);
        let record = self.registry.record(id).ok_or(MaintenanceError::UnknownAction(id))?;

        match state {
            ActionState::Complete => Ok(record),
            _ => Err(MaintenanceError::ActionFailed(Box::new(record))),
        }
    }

    /// Start `threads` workers once the host is ready
    ///
    /// Blocks until the lifecycle signals readiness. The pool can be raised
    /// once; `start(0)` keeps the unthreaded mode and does not use that up.
    pub fn start(&self, threads: usize) -> Result<(), MaintenanceError> {
        debug!(threads, "MaintenanceFeature::start: called");
        self.lifecycle.wait_ready();

        let mut pool = self.lock_pool();
        if pool.started {
            debug!("MaintenanceFeature::start: already started");
            return Err(MaintenanceError::AlreadyStarted);
        }
        if self.registry.is_shutting_down() {
            return Err(MaintenanceError::ShuttingDown);
        }
        if threads == 0 {
            debug!("MaintenanceFeature::start: no threads requested, staying unthreaded");
            return Ok(());
        }
        pool.started = true;

        let spawned = pool
            .workers
            .spawn(threads, &self.registry, self.config.max_steps_per_action);
        self.threads.store(pool.workers.len(), Ordering::SeqCst);
        spawned?;

        info!(threads, "Maintenance started");
        Ok(())
    }

    /// Stop workers from taking new READY actions
    pub fn begin_shutdown(&self) {
        debug!("MaintenanceFeature::begin_shutdown: called");
        self.registry.begin_shutdown();
    }

    /// Wait for workers to finish their in-flight actions and exit
    pub fn join(&self) {
        debug!("MaintenanceFeature::join: called");
        let mut pool = self.lock_pool();
        pool.workers.join();
        self.threads.store(0, Ordering::SeqCst);
    }

    /// Number of running worker threads
    pub fn thread_count(&self) -> usize {
        self.threads.load(Ordering::SeqCst)
    }

    /// `{id, state, result, progress}` for every action, in id order
    pub fn snapshot(&self) -> Vec<ActionSnapshot> {
        self.registry.snapshot()
    }

    /// The snapshot as a structured document
    pub fn snapshot_document(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.snapshot())
    }

    pub fn record(&self, id: ActionId) -> Option<ActionRecord> {
        self.registry.record(id)
    }

    pub fn records(&self) -> Vec<ActionRecord> {
        self.registry.records()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Block until every submitted action is terminal, or the timeout elapses
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.registry.wait_until_idle(timeout)
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn factory(&self) -> &ActionFactory {
        &self.factory
    }

    pub fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    fn lock_pool(&self) -> MutexGuard<'_, PoolState> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MaintenanceFeature {
    fn drop(&mut self) {
        debug!("MaintenanceFeature::drop: called");
        self.registry.begin_shutdown();
        self.lock_pool().workers.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::COUNTDOWN_ACTION;

    fn unthreaded() -> MaintenanceFeature {
        let config = MaintenanceConfig {
            seconds_actions_block: 0,
            ..Default::default()
        };
        MaintenanceFeature::new(config, ActionFactory::with_builtin(), Arc::new(Lifecycle::ready()))
    }

    fn countdown(fields: &[(&str, &str)]) -> ActionDescription {
        let mut pairs = vec![("name", COUNTDOWN_ACTION)];
        pairs.extend_from_slice(fields);
        ActionDescription::from_pairs(pairs)
    }

    #[test]
    fn test_inline_ok() {
        let feature = unthreaded();
        let record = feature
            .add_action(countdown(&[("iterate_count", "1")]), ActionProperties::empty(), true)
            .unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.progress, 1);
        assert_eq!(record.state, ActionState::Complete);
        assert!(record.result.is_ok());
    }

    #[test]
    fn test_inline_failure_carries_record() {
        let feature = unthreaded();
        let err = feature
            .add_action(
                countdown(&[("iterate_count", "1"), ("result_code", "1")]),
                ActionProperties::empty(),
                true,
            )
            .unwrap_err();

        let record = err.failed_record().expect("failed record");
        assert_eq!(record.id, 1);
        assert_eq!(record.progress, 1);
        assert_eq!(record.state, ActionState::Failed);
        assert_eq!(record.result.code, 1);
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_queued_without_threads_stays_ready() {
        let feature = unthreaded();
        let record = feature
            .add_action(countdown(&[("iterate_count", "3")]), ActionProperties::empty(), false)
            .unwrap();
        assert_eq!(record.state, ActionState::Ready);

        let snapshot = feature.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].state, ActionState::Ready);
        assert_eq!(snapshot[0].progress, 0);
    }

    #[test]
    fn test_start_only_once() {
        let feature = unthreaded();
        feature.start(1).unwrap();
        assert_eq!(feature.thread_count(), 1);
        assert!(matches!(feature.start(2), Err(MaintenanceError::AlreadyStarted)));

        feature.begin_shutdown();
        feature.join();
        assert_eq!(feature.thread_count(), 0);
    }

    #[test]
    fn test_start_zero_keeps_pool_raisable() {
        let feature = unthreaded();
        feature.start(0).unwrap();
        assert_eq!(feature.thread_count(), 0);

        let record = feature
            .add_action(countdown(&[("iterate_count", "1")]), ActionProperties::empty(), true)
            .unwrap();
        assert_eq!(record.state, ActionState::Complete);

        feature.start(2).unwrap();
        assert_eq!(feature.thread_count(), 2);
        assert!(matches!(feature.start(1), Err(MaintenanceError::AlreadyStarted)));
    }

    #[test]
    fn test_execute_now_is_queued_when_threaded() {
        let feature = unthreaded();
        feature.start(1).unwrap();

        let record = feature
            .add_action(countdown(&[("iterate_count", "2")]), ActionProperties::empty(), true)
            .unwrap();
        assert_eq!(record.state, ActionState::Ready);

        assert!(feature.wait_until_idle(Duration::from_secs(10)));
        assert_eq!(feature.record(record.id).unwrap().state, ActionState::Complete);
    }

    #[test]
    fn test_snapshot_document_field_order() {
        let feature = unthreaded();
        feature
            .add_action(countdown(&[("iterate_count", "2")]), ActionProperties::empty(), true)
            .unwrap();

        let document = feature.snapshot_document().unwrap();
        assert_eq!(
            document.to_string(),
            r#"[{"id":1,"state":5,"result":0,"progress":2}]"#
        );
    }
}
