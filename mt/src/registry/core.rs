//! Registry implementation

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::action::{Action, ActionFactory};
use crate::domain::{
    ActionDescription, ActionId, ActionProperties, ActionRecord, ActionSnapshot, ActionState, Outcome,
};
use crate::error::MaintenanceError;

use super::handle::ActionHandle;
use super::stats::RegistryStats;

/// A registered action and its bookkeeping
struct ActionEntry {
    description: Arc<ActionDescription>,
    state: ActionState,
    progress: u64,
    result: Outcome,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    /// Monotonic completion time, used for the cooldown window
    finished: Option<Instant>,
    /// Held while READY; moved into the handle on checkout
    action: Option<Box<dyn Action>>,
}

impl ActionEntry {
    fn new(description: Arc<ActionDescription>) -> Self {
        Self {
            description,
            state: ActionState::Ready,
            progress: 0,
            result: Outcome::ok(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            finished: None,
            action: None,
        }
    }

    fn record(&self, id: ActionId) -> ActionRecord {
        ActionRecord {
            id,
            description: (*self.description).clone(),
            state: self.state,
            result: self.result.clone(),
            progress: self.progress,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    fn snapshot(&self, id: ActionId) -> ActionSnapshot {
        ActionSnapshot {
            id,
            state: self.state,
            result: self.result.code,
            progress: self.progress,
        }
    }

    /// Time left before an equal description may be submitted again
    fn cooldown_remaining(&self, cooldown: Duration, now: Instant) -> Option<Duration> {
        let finished = self.finished?;
        let elapsed = now.saturating_duration_since(finished);
        (elapsed < cooldown).then(|| cooldown - elapsed)
    }
}

/// Internal state protected by mutex
struct RegistryInner {
    /// All actions in id (= insertion) order, terminal ones included
    entries: BTreeMap<ActionId, ActionEntry>,

    /// Most recent action id per description
    by_description: HashMap<Arc<ActionDescription>, ActionId>,

    /// READY actions in submission order
    ready: VecDeque<ActionId>,

    next_id: ActionId,

    /// Number of READY or EXECUTING actions
    active: usize,

    /// Number of EXECUTING actions
    executing: usize,

    shutdown: bool,

    stats: RegistryStats,
}

impl RegistryInner {
    /// Nothing left that an idle waiter could still see finish
    fn is_settled(&self) -> bool {
        self.active == 0 || (self.shutdown && self.executing == 0)
    }
}

/// Thread-safe registry of maintenance actions
///
/// A single mutex guards both indices. `ready_cond` is signaled on every
/// queued insertion and on shutdown; `idle_cond` when the last active action
/// finishes. The lock is never held while an action step runs.
pub struct ActionRegistry {
    cooldown: Duration,
    inner: Mutex<RegistryInner>,
    ready_cond: Condvar,
    idle_cond: Condvar,
}

impl ActionRegistry {
    /// Create a registry with the given retry cooldown window
    pub fn new(cooldown: Duration) -> Self {
        debug!(?cooldown, "ActionRegistry::new: called");
        Self {
            cooldown,
            inner: Mutex::new(RegistryInner {
                entries: BTreeMap::new(),
                by_description: HashMap::new(),
                ready: VecDeque::new(),
                next_id: 1,
                active: 0,
                executing: 0,
                shutdown: false,
                stats: RegistryStats::default(),
            }),
            ready_cond: Condvar::new(),
            idle_cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Insert a new READY action and wake one waiting worker
    ///
    /// Returns the record of the inserted action as of insertion.
    pub fn insert(
        &self,
        description: ActionDescription,
        properties: ActionProperties,
        factory: &ActionFactory,
    ) -> Result<ActionRecord, MaintenanceError> {
        debug!(%description, "ActionRegistry::insert: called");
        let mut guard = self.lock();
        if guard.shutdown {
            debug!("ActionRegistry::insert: shutting down, rejecting");
            return Err(MaintenanceError::ShuttingDown);
        }

        let (id, description, action) = self.admit(&mut guard, description, properties, factory)?;

        let inner = &mut *guard;
        let mut entry = ActionEntry::new(description);
        entry.action = Some(action);
        let record = entry.record(id);
        inner.entries.insert(id, entry);
        inner.ready.push_back(id);
        inner.stats.peak_queue_depth = inner.stats.peak_queue_depth.max(inner.ready.len());
        drop(guard);

        debug!(id, "ActionRegistry::insert: queued");
        self.ready_cond.notify_one();
        Ok(record)
    }

    /// Insert a new action that is checked out to the caller immediately
    ///
    /// Used for inline execution: the action never sits in the ready queue,
    /// so no worker can pick it up.
    pub fn insert_claimed(
        &self,
        description: ActionDescription,
        properties: ActionProperties,
        factory: &ActionFactory,
    ) -> Result<ActionHandle, MaintenanceError> {
        debug!(%description, "ActionRegistry::insert_claimed: called");
        let mut guard = self.lock();
        let (id, description, action) = self.admit(&mut guard, description, properties, factory)?;

        let mut entry = ActionEntry::new(Arc::clone(&description));
        entry.state = ActionState::Executing;
        entry.started_at = Some(entry.created_at);
        guard.entries.insert(id, entry);
        guard.executing += 1;

        debug!(id, "ActionRegistry::insert_claimed: checked out");
        Ok(ActionHandle::new(id, description, action))
    }

    /// Dedup, cooldown and construction checks, then id assignment
    fn admit(
        &self,
        inner: &mut RegistryInner,
        description: ActionDescription,
        properties: ActionProperties,
        factory: &ActionFactory,
    ) -> Result<(ActionId, Arc<ActionDescription>, Box<dyn Action>), MaintenanceError> {
        description.validate()?;
        self.check_conflict(inner, &description)?;

        let action = factory.create(&description, properties)?;

        let id = inner.next_id;
        inner.next_id += 1;
        let description = Arc::new(description);
        inner.by_description.insert(Arc::clone(&description), id);
        inner.active += 1;
        inner.stats.total_accepted += 1;
        info!(id, %description, "Action accepted");
        Ok((id, description, action))
    }

    fn check_conflict(&self, inner: &mut RegistryInner, description: &ActionDescription) -> Result<(), MaintenanceError> {
        let Some(&existing) = inner.by_description.get(description) else {
            return Ok(());
        };
        let Some(entry) = inner.entries.get(&existing) else {
            return Ok(());
        };

        let terminal = entry.state.is_terminal();
        let remaining = entry.cooldown_remaining(self.cooldown, Instant::now());

        if !terminal {
            inner.stats.total_rejected_duplicate += 1;
            warn!(id = existing, %description, "Rejected: equal action still active");
            return Err(MaintenanceError::DuplicateActive { id: existing });
        }

        if let Some(remaining) = remaining {
            inner.stats.total_rejected_cooldown += 1;
            warn!(id = existing, %description, ?remaining, "Rejected: equal action in cooldown");
            return Err(MaintenanceError::InCooldown { id: existing, remaining });
        }

        Ok(())
    }

    /// Take the oldest READY action, blocking until one exists
    ///
    /// Returns `None` once shutdown has begun.
    pub fn next_ready(&self) -> Option<ActionHandle> {
        debug!("ActionRegistry::next_ready: called");
        let mut guard = self.lock();
        loop {
            if guard.shutdown {
                debug!("ActionRegistry::next_ready: shutdown, returning none");
                return None;
            }
            if let Some(handle) = Self::checkout(&mut guard) {
                return Some(handle);
            }
            guard = self.ready_cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Take the oldest READY action without blocking
    pub fn try_next_ready(&self) -> Option<ActionHandle> {
        debug!("ActionRegistry::try_next_ready: called");
        let mut guard = self.lock();
        if guard.shutdown {
            return None;
        }
        Self::checkout(&mut guard)
    }

    fn checkout(inner: &mut RegistryInner) -> Option<ActionHandle> {
        while let Some(id) = inner.ready.pop_front() {
            let Some(entry) = inner.entries.get_mut(&id) else {
                continue;
            };
            let Some(action) = entry.action.take() else {
                continue;
            };
            entry.state = ActionState::Executing;
            entry.started_at = Some(Utc::now());
            inner.executing += 1;
            debug!(id, "ActionRegistry::checkout: executing");
            return Some(ActionHandle::new(id, Arc::clone(&entry.description), action));
        }
        None
    }

    /// Publish a step result for an executing action
    ///
    /// A non-terminal update only refreshes progress and result. A terminal
    /// update moves the action to COMPLETE or FAILED according to `result`
    /// and stamps its completion time. Returns the resulting state, or `None`
    /// if the action is unknown or not executing.
    pub fn record_step(&self, id: ActionId, progress: u64, result: &Outcome, terminal: bool) -> Option<ActionState> {
        debug!(id, progress, terminal, "ActionRegistry::record_step: called");
        let mut guard = self.lock();
        let inner = &mut *guard;

        let Some(entry) = inner.entries.get_mut(&id) else {
            warn!(id, "record_step for unknown action");
            return None;
        };
        if entry.state != ActionState::Executing {
            warn!(id, state = %entry.state, "record_step for action that is not executing");
            return None;
        }

        entry.progress = progress;
        entry.result = result.clone();
        if !terminal {
            return Some(entry.state);
        }

        let state = if result.is_ok() {
            ActionState::Complete
        } else {
            ActionState::Failed
        };
        entry.state = state;
        entry.completed_at = Some(Utc::now());
        entry.finished = Some(Instant::now());

        match state {
            ActionState::Complete => inner.stats.total_completed += 1,
            _ => inner.stats.total_failed += 1,
        }
        inner.active = inner.active.saturating_sub(1);
        inner.executing = inner.executing.saturating_sub(1);
        let idle = inner.is_settled();
        drop(guard);

        info!(id, %state, progress, result = %result, "Action finished");
        if idle {
            self.idle_cond.notify_all();
        }
        Some(state)
    }

    /// Stop handing out READY actions and wake all waiting workers
    ///
    /// Idle waiters are woken too: after shutdown they stop waiting once the
    /// in-flight actions are done, since READY actions will never run.
    pub fn begin_shutdown(&self) {
        debug!("ActionRegistry::begin_shutdown: called");
        let mut guard = self.lock();
        guard.shutdown = true;
        drop(guard);
        self.ready_cond.notify_all();
        self.idle_cond.notify_all();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutdown
    }

    /// Block until no action is READY or EXECUTING, or the timeout elapses
    ///
    /// After shutdown the wait also ends once nothing is EXECUTING. Returns
    /// true only when no action is left READY or EXECUTING.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        debug!(?timeout, "ActionRegistry::wait_until_idle: called");
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.lock();
        while !guard.is_settled() {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(active = guard.active, "ActionRegistry::wait_until_idle: timed out");
                        return false;
                    }
                    let (next, _) = self
                        .idle_cond
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard = next;
                }
                None => {
                    guard = self.idle_cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        guard.active == 0
    }

    /// Consistent view of every action in id order
    pub fn snapshot(&self) -> Vec<ActionSnapshot> {
        debug!("ActionRegistry::snapshot: called");
        let inner = self.lock();
        inner.entries.iter().map(|(id, entry)| entry.snapshot(*id)).collect()
    }

    /// Detailed view of every action in id order
    pub fn records(&self) -> Vec<ActionRecord> {
        let inner = self.lock();
        inner.entries.iter().map(|(id, entry)| entry.record(*id)).collect()
    }

    pub fn record(&self, id: ActionId) -> Option<ActionRecord> {
        let inner = self.lock();
        inner.entries.get(&id).map(|entry| entry.record(id))
    }

    /// Most recent action submitted with this description
    pub fn find(&self, description: &ActionDescription) -> Option<ActionRecord> {
        let inner = self.lock();
        let id = *inner.by_description.get(description)?;
        inner.entries.get(&id).map(|entry| entry.record(id))
    }

    pub fn stats(&self) -> RegistryStats {
        self.lock().stats.clone()
    }

    /// Number of READY or EXECUTING actions
    pub fn active_count(&self) -> usize {
        self.lock().active
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ActionRegistry")
            .field("cooldown", &self.cooldown)
            .field("entries", &inner.entries.len())
            .field("ready", &inner.ready.len())
            .field("active", &inner.active)
            .field("executing", &inner.executing)
            .field("shutdown", &inner.shutdown)
            .finish()
    }
}
