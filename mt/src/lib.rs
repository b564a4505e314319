//! Maintenance - local reconciliation scheduler for a cluster node
//!
//! Accepts descriptions of maintenance work ("create local shard replica",
//! "drop stale index"), rejects duplicates of work that is still active or
//! finished too recently, and drives every accepted action to completion
//! through a bounded pool of worker threads.
//!
//! # Core Concepts
//!
//! - **Description identity**: equal key/value descriptions conflict; at most
//!   one of them may be active at a time
//! - **Cooldown**: a finished description stays blocked for
//!   `seconds-actions-block` to stop flapping retries
//! - **Resumable steps**: actions run as `begin_step` followed by
//!   `continue_step` calls, each returning whether more work is wanted
//! - **Inline or pooled**: without workers an action can run on the caller's
//!   thread; with workers it is queued in submission order
//!
//! # Modules
//!
//! - [`domain`] - descriptions, properties, states, records
//! - [`action`] - the step contract, the factory and the driver loop
//! - [`registry`] - dedup/cooldown registry and ready queue
//! - [`pool`] - worker threads
//! - [`feature`] - the public facade
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod action;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feature;
pub mod lifecycle;
pub mod plan;
pub mod pool;
pub mod registry;

// Re-export commonly used types
pub use action::{Action, ActionConstructor, ActionFactory, COUNTDOWN_ACTION, CountdownAction, StepContext};
pub use config::{Config, LoggingConfig, MaintenanceConfig};
pub use domain::{
    ActionDescription, ActionId, ActionProperties, ActionRecord, ActionSnapshot, ActionState, CONTRACT_VIOLATION_CODE,
    FAULT_CODE, NAME_KEY, OK_CODE, Outcome, STEP_BUDGET_CODE,
};
pub use error::MaintenanceError;
pub use feature::MaintenanceFeature;
pub use lifecycle::Lifecycle;
pub use plan::{Plan, PlanEntry};
pub use pool::WorkerPool;
pub use registry::{ActionHandle, ActionRegistry, RegistryStats};
