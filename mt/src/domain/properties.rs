//! Opaque action properties

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured payload handed to the action constructor
///
/// Not part of the action identity; ownership moves into the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionProperties(Value);

impl ActionProperties {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Empty object payload
    pub fn empty() -> Self {
        Self(Value::Object(Default::default()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Default for ActionProperties {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for ActionProperties {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
