use super::{Component, merge_option};
use crate::config::{expect_map, join, optional_str, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::types::validate_name;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SCALAR_KEYS: [&str; 2] = ["description", "plugins"];

/// A custom scalar type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarType {
    name: String,
    description: Option<String>,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl ScalarType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_config(
        name: &str,
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        validate_name(name)?;
        let mut scalar = Self::new(name);
        if value.is_null() {
            return Ok(scalar);
        }
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &SCALAR_KEYS, path)?;
        scalar.description = optional_str(map, "description", path)?;
        if let Some(plugins) = map.get("plugins") {
            scalar.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(scalar)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Component for ScalarType {
    fn name(&self) -> &str {
        &self.name
    }

    fn plugins(&self) -> &PluginBindings {
        &self.plugins
    }

    fn plugins_mut(&mut self) -> &mut PluginBindings {
        &mut self.plugins
    }

    fn merge(&mut self, other: Self) {
        merge_option(&mut self.description, other.description);
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)
    }
}
