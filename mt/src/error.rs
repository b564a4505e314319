//! Errors returned by the maintenance scheduler

use std::time::Duration;

use thiserror::Error;

use crate::domain::{ActionId, ActionRecord};

/// Errors from submission and lifecycle operations
///
/// Rejections are returned synchronously and never retried; the caller
/// decides whether to resubmit.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    #[error("Failed to construct action {name}: {reason}")]
    ActionConstruction { name: String, reason: String },

    #[error("Action {id} with an equal description is still active")]
    DuplicateActive { id: ActionId },

    #[error("Action {id} with an equal description finished recently; retry in {remaining:?}")]
    InCooldown { id: ActionId, remaining: Duration },

    #[error("Action {0} not found")]
    UnknownAction(ActionId),

    #[error("Action {} failed: {}", .0.id, .0.result)]
    ActionFailed(Box<ActionRecord>),

    #[error("Worker pool already started")]
    AlreadyStarted,

    #[error("Scheduler is shutting down")]
    ShuttingDown,

    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawn(String),
}

impl MaintenanceError {
    /// Stable error code for external reporting
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadParameter(_) => "bad_parameter",
            Self::UnknownActionType(_) => "unknown_action_type",
            Self::ActionConstruction { .. } => "action_construction",
            Self::DuplicateActive { .. } => "duplicate_active",
            Self::InCooldown { .. } => "in_cooldown",
            Self::UnknownAction(_) => "unknown_action",
            Self::ActionFailed(_) => "action_failed",
            Self::AlreadyStarted => "already_started",
            Self::ShuttingDown => "shutting_down",
            Self::ThreadSpawn(_) => "thread_spawn",
        }
    }

    /// True when the submission was refused before anything was inserted
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::BadParameter(_)
                | Self::UnknownActionType(_)
                | Self::ActionConstruction { .. }
                | Self::DuplicateActive { .. }
                | Self::InCooldown { .. }
                | Self::ShuttingDown
        )
    }

    /// The final record of an action that ran inline and failed
    pub fn failed_record(&self) -> Option<&ActionRecord> {
        match self {
            Self::ActionFailed(record) => Some(&**record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            MaintenanceError::BadParameter("x".to_string()),
            MaintenanceError::UnknownActionType("x".to_string()),
            MaintenanceError::DuplicateActive { id: 1 },
            MaintenanceError::InCooldown {
                id: 1,
                remaining: Duration::from_secs(1),
            },
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(errors.iter().all(|e| e.is_rejection()));
    }

    #[test]
    fn test_display() {
        let err = MaintenanceError::DuplicateActive { id: 7 };
        assert_eq!(err.to_string(), "Action 7 with an equal description is still active");
        assert!(err.failed_record().is_none());
    }
}
