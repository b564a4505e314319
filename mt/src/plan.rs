//! Submission plans for `mt run`
//!
//! A plan is a YAML list of actions to queue:
//!
//! ```yaml
//! actions:
//!   - description: {name: Countdown, iterate_count: 100, result_code: 1}
//!   - description: {name: Countdown, iterate_count: 2}
//!     properties: {shard: s1001}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::domain::{ActionDescription, ActionProperties};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub actions: Vec<PlanEntry>,
}

/// One planned submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Description fields; scalar values are converted to strings
    pub description: BTreeMap<String, Value>,

    #[serde(default)]
    pub properties: Value,
}

impl Plan {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context(format!("Failed to read plan {}", path.display()))?;
        Self::from_yaml(&content).context(format!("Failed to parse plan {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl PlanEntry {
    pub fn description(&self) -> Result<ActionDescription> {
        let mut fields = BTreeMap::new();
        for (key, value) in &self.description {
            fields.insert(key.clone(), scalar_to_string(key, value)?);
        }
        Ok(ActionDescription::new(fields))
    }

    pub fn properties(&self) -> Result<ActionProperties> {
        if self.properties.is_null() {
            return Ok(ActionProperties::empty());
        }
        let value = serde_json::to_value(&self.properties).context("Properties are not representable as JSON")?;
        Ok(ActionProperties::new(value))
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(eyre!("description field '{}' must be a scalar", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let yaml = r#"
actions:
  - description: {name: Countdown, iterate_count: 100, result_code: 1}
  - description:
      name: Countdown
      iterate_count: "2"
    properties:
      shard: s1001
      replicas: [a, b]
"#;
        let plan = Plan::from_yaml(yaml).unwrap();
        assert_eq!(plan.actions.len(), 2);

        let first = plan.actions[0].description().unwrap();
        assert_eq!(first.get("iterate_count"), Some("100"));
        assert_eq!(first.get("result_code"), Some("1"));
        assert!(plan.actions[0].properties().unwrap().as_value().is_object());

        let second = plan.actions[1].properties().unwrap();
        assert_eq!(second.get("shard").and_then(|v| v.as_str()), Some("s1001"));
    }

    #[test]
    fn test_nested_description_value_rejected() {
        let yaml = r#"
actions:
  - description: {name: Countdown, nested: {a: 1}}
"#;
        let plan = Plan::from_yaml(yaml).unwrap();
        assert!(plan.actions[0].description().is_err());
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::from_yaml("{}").unwrap();
        assert!(plan.actions.is_empty());
    }
}
