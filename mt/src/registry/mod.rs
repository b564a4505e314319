//! Action registry
//!
//! The authoritative collection of known actions, indexed by id and by
//! description. Enforces at most one active action per description and the
//! retry cooldown after an action finishes.

mod core;
mod handle;
mod stats;

pub use self::core::ActionRegistry;
pub use handle::ActionHandle;
pub use stats::RegistryStats;
