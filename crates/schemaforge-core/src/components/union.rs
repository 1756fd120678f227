use super::{Component, merge_option};
use crate::config::{expect_map, expect_string_list, join, optional_str, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::types::validate_name;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

const UNION_KEYS: [&str; 3] = ["types", "description", "plugins"];

/// A union of object types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    name: String,
    description: Option<String>,
    types: BTreeSet<String>,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl UnionType {
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
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &UNION_KEYS, path)?;

        let mut union = Self::new(name);
        union.description = optional_str(map, "description", path)?;
        if let Some(types) = map.get("types") {
            union.types.extend(expect_string_list(types, &join(path, "types"))?);
        }
        if let Some(plugins) = map.get("plugins") {
            union.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(union)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn add_type(&mut self, name: impl Into<String>) {
        self.types.insert(name.into());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains(name)
    }
}

impl Component for UnionType {
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
        self.types.extend(other.types);
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        if self.types.is_empty() {
            return Err(SchemaError::component(
                &self.name,
                "union must have at least one member type",
            ));
        }
        self.types.iter().try_for_each(|t| validate_name(t))
    }
}
