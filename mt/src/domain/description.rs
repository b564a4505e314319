//! Action descriptions
//!
//! A description is the key/value identity of a requested action. Two
//! submissions whose descriptions are equal conflict with each other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MaintenanceError;

/// Reserved key holding the action type name
pub const NAME_KEY: &str = "name";

/// Immutable key/value identity of an action
///
/// Backed by an ordered map so equality and hashing do not depend on the
/// order in which fields were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionDescription(BTreeMap<String, String>);

impl ActionDescription {
    /// Create a description from a complete field map
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }

    /// Create a description from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The action type name, if present and non-empty
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY).filter(|name| !name.trim().is_empty())
    }

    /// Look up a single field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check the description is usable and return the type name
    pub fn validate(&self) -> Result<&str, MaintenanceError> {
        self.name().ok_or_else(|| {
            MaintenanceError::BadParameter(format!("description is missing a non-empty '{}' field", NAME_KEY))
        })
    }
}

impl std::fmt::Display for ActionDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name().unwrap_or("?"))?;
        let mut first = true;
        for (key, value) in self.iter().filter(|(k, _)| *k != NAME_KEY) {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        write!(f, ")")
    }
}

impl From<BTreeMap<String, String>> for ActionDescription {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionDescription {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
