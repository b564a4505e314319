//! Externally visible views of registry entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActionDescription, ActionId, ActionState, Outcome};

/// Detailed point-in-time view of one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    pub description: ActionDescription,
    pub state: ActionState,
    pub result: Outcome,
    pub progress: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Snapshot row: `{id, state, result, progress}` in this field order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSnapshot {
    pub id: ActionId,
    pub state: ActionState,
    pub result: i32,
    pub progress: u64,
}

impl From<&ActionRecord> for ActionSnapshot {
    fn from(record: &ActionRecord) -> Self {
        Self {
            id: record.id,
            state: record.state,
            result: record.result.code,
            progress: record.progress,
        }
    }
}
