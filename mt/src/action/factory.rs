//! Name to constructor mapping for action types

use std::collections::HashMap;

use tracing::debug;

use super::Action;
use super::countdown::{COUNTDOWN_ACTION, CountdownAction};
use crate::domain::{ActionDescription, ActionProperties};
use crate::error::MaintenanceError;

/// Builds a concrete action from its description and properties
pub type ActionConstructor =
    Box<dyn Fn(&ActionDescription, ActionProperties) -> eyre::Result<Box<dyn Action>> + Send + Sync>;

/// Registry of constructible action types
///
/// The hosting system registers its own types; registering an existing name
/// replaces the previous constructor.
#[derive(Default)]
pub struct ActionFactory {
    constructors: HashMap<String, ActionConstructor>,
}

impl ActionFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the built-in action types registered
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register(COUNTDOWN_ACTION, |description, _properties| {
            Ok(Box::new(CountdownAction::from_description(description)?) as Box<dyn Action>)
        });
        factory
    }

    /// Register (or replace) the constructor for an action type
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&ActionDescription, ActionProperties) -> eyre::Result<Box<dyn Action>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(%name, "ActionFactory::register: called");
        if self.constructors.insert(name.clone(), Box::new(constructor)).is_some() {
            debug!(%name, "ActionFactory::register: replaced existing constructor");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the action named by the description
    pub fn create(
        &self,
        description: &ActionDescription,
        properties: ActionProperties,
    ) -> Result<Box<dyn Action>, MaintenanceError> {
        let name = description.validate()?;
        debug!(%name, "ActionFactory::create: called");

        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| MaintenanceError::UnknownActionType(name.to_string()))?;

        constructor(description, properties).map_err(|e| MaintenanceError::ActionConstruction {
            name: name.to_string(),
            reason: format!("{:#}", e),
        })
    }
}

impl std::fmt::Debug for ActionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionFactory").field("types", &self.names()).finish()
    }
}
