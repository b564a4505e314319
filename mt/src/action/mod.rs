//! Action execution contract
//!
//! An action is driven by repeated step calls. `begin_step` runs exactly once
//! and first; `continue_step` runs while the previous call asked for more
//! work. Each step may write the action's result through the [`StepContext`].
//! The result in the context when the loop ends decides whether the action is
//! COMPLETE or FAILED.
//!
//! Steps run outside the registry lock and must only touch the action's own
//! state. The driver publishes progress to the registry.

mod countdown;
mod driver;
mod factory;

pub use countdown::{COUNTDOWN_ACTION, CountdownAction};
pub use driver::{drive, execute};
pub use factory::{ActionConstructor, ActionFactory};

use crate::domain::{ActionId, Outcome};

/// A unit of maintenance work with a resumable two-phase step contract
pub trait Action: Send {
    /// First step. Returns true to request more work.
    fn begin_step(&mut self, step: &mut StepContext) -> bool;

    /// Continuation step. Returns true to request more work.
    fn continue_step(&mut self, step: &mut StepContext) -> bool;
}

/// Per-run state visible to an action during its steps
///
/// Progress is owned by the driver; the action only reads it. The result is
/// the one field an action writes.
#[derive(Debug, Clone)]
pub struct StepContext {
    id: ActionId,
    progress: u64,
    result: Outcome,
}

impl StepContext {
    pub(crate) fn new(id: ActionId) -> Self {
        Self {
            id,
            progress: 0,
            result: Outcome::ok(),
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Number of step calls so far that asked for more work
    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn result(&self) -> &Outcome {
        &self.result
    }

    pub fn set_result(&mut self, result: Outcome) {
        self.result = result;
    }

    pub(crate) fn advance(&mut self) {
        self.progress += 1;
    }
}
