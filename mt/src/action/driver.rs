//! Driver loop
//!
//! ```text
//! progress = 0
//! more = begin_step()
//! while more:
//!     progress += 1
//!     more = continue_step()
//! final = COMPLETE if result is ok else FAILED
//! ```
//!
//! Every step call is isolated with `catch_unwind`, so a panicking action
//! fails instead of taking down the thread that drives it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::{Action, StepContext};
use crate::domain::{ActionId, ActionState, Outcome, STEP_BUDGET_CODE};
use crate::registry::{ActionHandle, ActionRegistry};

#[derive(Debug, Clone, Copy)]
enum Phase {
    Begin,
    Continue,
}

/// Run an action's step loop to the end
///
/// `on_progress` is called after every step that asked for more work.
/// With `max_steps` set, an action still asking for more work after that
/// many successful steps is stopped and failed.
pub fn drive<F>(id: ActionId, action: &mut dyn Action, max_steps: Option<u64>, mut on_progress: F) -> StepContext
where
    F: FnMut(&StepContext),
{
    debug!(id, ?max_steps, "drive: called");
    let mut step = StepContext::new(id);

    let mut more = run_step(action, &mut step, Phase::Begin);
    while more {
        if max_steps.is_some_and(|limit| step.progress() >= limit) {
            warn!(id, progress = step.progress(), "Action exceeded its step budget");
            step.set_result(
                Outcome::failed(STEP_BUDGET_CODE)
                    .with_message(format!("step budget of {} exhausted", step.progress())),
            );
            break;
        }
        step.advance();
        on_progress(&step);
        more = run_step(action, &mut step, Phase::Continue);
    }

    debug!(id, progress = step.progress(), result = %step.result(), "drive: finished");
    step
}

/// Drive a checked-out action and publish every step to the registry
///
/// Returns the terminal state recorded by the registry.
pub fn execute(registry: &ActionRegistry, mut handle: ActionHandle, max_steps: Option<u64>) -> ActionState {
    let id = handle.id();
    debug!(id, description = %handle.description(), "execute: called");

    let step = drive(id, handle.action_mut(), max_steps, |step| {
        registry.record_step(id, step.progress(), step.result(), false);
    });

    registry
        .record_step(id, step.progress(), step.result(), true)
        .unwrap_or(if step.result().is_ok() {
            ActionState::Complete
        } else {
            ActionState::Failed
        })
}

fn run_step(action: &mut dyn Action, step: &mut StepContext, phase: Phase) -> bool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match phase {
        Phase::Begin => action.begin_step(step),
        Phase::Continue => action.continue_step(step),
    }));

    match outcome {
        Ok(more) => more,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(id = step.id(), ?phase, %message, "Action step panicked");
            step.set_result(Outcome::fault(format!("{:?} step panicked: {}", phase, message)));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FAULT_CODE, OK_CODE};

    /// Succeeds `successes` times, then stops with `final_code`
    struct Scripted {
        successes: u64,
        final_code: i32,
        begin_calls: u32,
        continue_calls: u32,
    }

    impl Scripted {
        fn new(successes: u64, final_code: i32) -> Self {
            Self {
                successes,
                final_code,
                begin_calls: 0,
                continue_calls: 0,
            }
        }

        fn step(&mut self, step: &mut StepContext) -> bool {
            if step.progress() < self.successes {
                return true;
            }
            step.set_result(Outcome::from_code(self.final_code));
            false
        }
    }

    impl Action for Scripted {
        fn begin_step(&mut self, step: &mut StepContext) -> bool {
            self.begin_calls += 1;
            self.step(step)
        }

        fn continue_step(&mut self, step: &mut StepContext) -> bool {
            self.continue_calls += 1;
            self.step(step)
        }
    }

    struct Forever;

    impl Action for Forever {
        fn begin_step(&mut self, _step: &mut StepContext) -> bool {
            true
        }

        fn continue_step(&mut self, _step: &mut StepContext) -> bool {
            true
        }
    }

    struct PanicsOnSecondStep;

    impl Action for PanicsOnSecondStep {
        fn begin_step(&mut self, _step: &mut StepContext) -> bool {
            true
        }

        fn continue_step(&mut self, _step: &mut StepContext) -> bool {
            panic!("index file missing");
        }
    }

    #[test]
    fn test_progress_counts_successful_steps() {
        for k in [0u64, 1, 2, 100] {
            let mut action = Scripted::new(k, OK_CODE);
            let step = drive(1, &mut action, None, |_| {});
            assert_eq!(step.progress(), k);
            assert!(step.result().is_ok());
            assert_eq!(action.begin_calls, 1);
            assert_eq!(action.continue_calls as u64, k);
        }
    }

    #[test]
    fn test_failing_result_after_k_steps() {
        let mut action = Scripted::new(7, 1);
        let step = drive(1, &mut action, None, |_| {});
        assert_eq!(step.progress(), 7);
        assert_eq!(step.result().code, 1);
    }

    #[test]
    fn test_progress_callback_per_step() {
        let mut seen = Vec::new();
        let mut action = Scripted::new(3, OK_CODE);
        drive(1, &mut action, None, |step| seen.push(step.progress()));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_step_budget_stops_runaway_action() {
        let mut action = Forever;
        let step = drive(1, &mut action, Some(10), |_| {});
        assert_eq!(step.progress(), 10);
        assert_eq!(step.result().code, STEP_BUDGET_CODE);
    }

    #[test]
    fn test_step_budget_allows_exact_fit() {
        let mut action = Scripted::new(10, OK_CODE);
        let step = drive(1, &mut action, Some(10), |_| {});
        assert_eq!(step.progress(), 10);
        assert!(step.result().is_ok());
    }

    #[test]
    fn test_panic_becomes_fault() {
        let mut action = PanicsOnSecondStep;
        let step = drive(1, &mut action, None, |_| {});
        assert_eq!(step.progress(), 1);
        assert_eq!(step.result().code, FAULT_CODE);
        assert!(step.result().message.as_deref().unwrap().contains("index file missing"));
    }
}
