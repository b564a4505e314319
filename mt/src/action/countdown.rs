//! Built-in diagnostic action
//!
//! `Countdown` asks for more work `iterate_count` times, then records
//! `result_code` as its result. It also checks that the driver honours the
//! step order, which makes it useful for smoke-testing a node's scheduler.

use eyre::{Context, Result};

use super::{Action, StepContext};
use crate::domain::{ActionDescription, CONTRACT_VIOLATION_CODE, Outcome};

/// Type name of the built-in countdown action
pub const COUNTDOWN_ACTION: &str = "Countdown";

const ITERATE_COUNT_KEY: &str = "iterate_count";
const RESULT_CODE_KEY: &str = "result_code";

#[derive(Debug, Clone)]
pub struct CountdownAction {
    remaining: i64,
    result_code: i32,
}

impl CountdownAction {
    pub fn new(iterations: i64, result_code: i32) -> Self {
        Self {
            remaining: if iterations < 0 { 1 } else { iterations },
            result_code,
        }
    }

    /// Read `iterate_count` (default 1) and `result_code` (default 0)
    pub fn from_description(description: &ActionDescription) -> Result<Self> {
        let iterations = match description.get(ITERATE_COUNT_KEY) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context(format!("invalid {}: {}", ITERATE_COUNT_KEY, raw))?,
            None => 1,
        };
        let result_code = match description.get(RESULT_CODE_KEY) {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .context(format!("invalid {}: {}", RESULT_CODE_KEY, raw))?,
            None => 0,
        };
        Ok(Self::new(iterations, result_code))
    }

    fn tick(&mut self, step: &mut StepContext) -> bool {
        if self.remaining == 0 {
            step.set_result(Outcome::from_code(self.result_code));
        }
        let more = self.remaining > 0 && step.result().is_ok();
        self.remaining -= 1;
        more
    }
}

impl Action for CountdownAction {
    fn begin_step(&mut self, step: &mut StepContext) -> bool {
        let more = self.tick(step);
        if step.progress() != 0 {
            step.set_result(Outcome::failed(CONTRACT_VIOLATION_CODE).with_message("begin_step called after progress"));
            return false;
        }
        more
    }

    fn continue_step(&mut self, step: &mut StepContext) -> bool {
        let more = self.tick(step);
        if step.progress() == 0 {
            step.set_result(Outcome::failed(CONTRACT_VIOLATION_CODE).with_message("continue_step called before begin"));
            return false;
        }
        more
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(fields: &[(&str, &str)]) -> Result<CountdownAction> {
        let mut pairs = vec![("name", COUNTDOWN_ACTION)];
        pairs.extend_from_slice(fields);
        CountdownAction::from_description(&ActionDescription::from_pairs(pairs))
    }

    #[test]
    fn test_defaults() {
        let action = countdown(&[]).unwrap();
        assert_eq!(action.remaining, 1);
        assert_eq!(action.result_code, 0);
    }

    #[test]
    fn test_negative_count_is_one() {
        let action = countdown(&[("iterate_count", "-5")]).unwrap();
        assert_eq!(action.remaining, 1);
    }

    #[test]
    fn test_invalid_count_rejected() {
        let err = countdown(&[("iterate_count", "lots")]).unwrap_err();
        assert!(format!("{:#}", err).contains("iterate_count"));
        assert!(countdown(&[("result_code", "x")]).is_err());
    }

    #[test]
    fn test_zero_iterations_stops_immediately() {
        let mut action = countdown(&[("iterate_count", "0"), ("result_code", "1")]).unwrap();
        let mut step = StepContext::new(1);
        assert!(!action.begin_step(&mut step));
        assert_eq!(step.result().code, 1);
    }

    #[test]
    fn test_counts_down_then_sets_result() {
        let mut action = countdown(&[("iterate_count", "2"), ("result_code", "4")]).unwrap();
        let mut step = StepContext::new(1);

        assert!(action.begin_step(&mut step));
        step.advance();
        assert!(action.continue_step(&mut step));
        step.advance();
        assert!(step.result().is_ok());
        assert!(!action.continue_step(&mut step));
        assert_eq!(step.result().code, 4);
    }

    #[test]
    fn test_detects_out_of_order_steps() {
        let mut action = countdown(&[("iterate_count", "3")]).unwrap();
        let mut step = StepContext::new(1);
        assert!(!action.continue_step(&mut step));
        assert_eq!(step.result().code, CONTRACT_VIOLATION_CODE);
    }

    #[test]
    fn test_violation_survives_final_step() {
        // The last tick writes result_code; the violation must win over it
        let mut action = countdown(&[("iterate_count", "0"), ("result_code", "0")]).unwrap();
        let mut step = StepContext::new(1);
        assert!(!action.continue_step(&mut step));
        assert_eq!(step.result().code, CONTRACT_VIOLATION_CODE);

        let mut action = countdown(&[("iterate_count", "0"), ("result_code", "0")]).unwrap();
        let mut step = StepContext::new(1);
        step.advance();
        assert!(!action.begin_step(&mut step));
        assert_eq!(step.result().code, CONTRACT_VIOLATION_CODE);
    }
}
