//! Domain types for the maintenance scheduler
//!
//! Descriptions identify requested work, properties carry the opaque payload,
//! and records/snapshots are the externally visible view of registry entries.

mod description;
mod outcome;
mod properties;
mod record;
mod state;

pub use description::{ActionDescription, NAME_KEY};
pub use outcome::{CONTRACT_VIOLATION_CODE, FAULT_CODE, OK_CODE, Outcome, STEP_BUDGET_CODE};
pub use properties::ActionProperties;
pub use record::{ActionRecord, ActionSnapshot};
pub use state::ActionState;

/// Process-unique action identifier, assigned in insertion order starting at 1
pub type ActionId = u64;
