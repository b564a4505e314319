//! Action results

use serde::{Deserialize, Serialize};

/// Result code of a successful action
pub const OK_CODE: i32 = 0;

/// Result code recorded when a step panics
pub const FAULT_CODE: i32 = -1;

/// Result code used by actions that detect a step-order violation
pub const CONTRACT_VIOLATION_CODE: i32 = 2;

/// Result code recorded when an action exceeds the configured step budget
pub const STEP_BUDGET_CODE: i32 = 3;

/// Outcome of an action: ok, or a failure code with an optional diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            code: OK_CODE,
            message: None,
        }
    }

    /// A failure with the given code. Code 0 still means ok.
    pub fn failed(code: i32) -> Self {
        Self { code, message: None }
    }

    /// Ok for code 0, failure otherwise
    pub fn from_code(code: i32) -> Self {
        if code == OK_CODE { Self::ok() } else { Self::failed(code) }
    }

    /// A fault caught while running a step
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            code: FAULT_CODE,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::ok()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.message, self.is_ok()) {
            (_, true) => write!(f, "ok"),
            (Some(message), false) => write!(f, "error {}: {}", self.code, message),
            (None, false) => write!(f, "error {}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert!(Outcome::from_code(0).is_ok());
        assert!(!Outcome::from_code(1).is_ok());
        assert_eq!(Outcome::from_code(7).code, 7);
    }

    #[test]
    fn test_fault() {
        let outcome = Outcome::fault("boom");
        assert!(!outcome.is_ok());
        assert_eq!(outcome.code, FAULT_CODE);
        assert_eq!(outcome.to_string(), "error -1: boom");
    }

    #[test]
    fn test_display() {
        assert_eq!(Outcome::ok().to_string(), "ok");
        assert_eq!(Outcome::failed(1).to_string(), "error 1");
    }
}
