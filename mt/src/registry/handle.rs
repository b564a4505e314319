//! Exclusive handle to an executing action

use std::sync::Arc;

use crate::action::Action;
use crate::domain::{ActionDescription, ActionId};

/// An action checked out of the registry for execution
///
/// The registry marks the action EXECUTING when it hands out the handle.
/// The holder drives the steps and reports back through
/// [`ActionRegistry::record_step`](super::ActionRegistry::record_step).
pub struct ActionHandle {
    id: ActionId,
    description: Arc<ActionDescription>,
    action: Box<dyn Action>,
}

impl ActionHandle {
    pub(crate) fn new(id: ActionId, description: Arc<ActionDescription>, action: Box<dyn Action>) -> Self {
        Self {
            id,
            description,
            action,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn description(&self) -> &ActionDescription {
        &self.description
    }

    pub fn action_mut(&mut self) -> &mut dyn Action {
        self.action.as_mut()
    }
}

impl std::fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandle")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
