//! Registry statistics

use serde::{Deserialize, Serialize};

/// Counters maintained by the registry
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_accepted: u64,
    pub total_rejected_duplicate: u64,
    pub total_rejected_cooldown: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub peak_queue_depth: usize,
}
