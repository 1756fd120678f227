use super::{Component, merge_option};
use crate::config::{expect_map, expect_str, join, optional_str, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::types::validate_name;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::Value;

const ENUM_KEYS: [&str; 3] = ["values", "description", "plugins"];
const VALUE_KEYS: [&str; 2] = ["value", "description"];

/// One value of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    name: String,
    value: String,
    description: Option<String>,
}

impl EnumValue {
    /// A value whose internal value equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: name.clone(),
            name,
            description: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// An enum type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    name: String,
    description: Option<String>,
    values: IndexMap<String, EnumValue>,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl EnumType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style: add a value.
    #[must_use]
    pub fn with_value(mut self, value: EnumValue) -> Self {
        self.add_value(value);
        self
    }

    /// Parse an enum definition.
    ///
    /// `values` is required and must be non-empty; it is either a list of
    /// names or a mapping of name → `true` | value string |
    /// `{ value, description }`.
    pub fn from_config(
        name: &str,
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        validate_name(name)?;
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &ENUM_KEYS, path)?;

        let values_path = join(path, "values");
        let mut en = Self::new(name);
        match map.get("values") {
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let value_name = expect_str(item, &format!("{}[{}]", values_path, i))?;
                    en.add_value(EnumValue::new(value_name));
                }
            }
            Some(Value::Object(entries)) => {
                for (value_name, def) in entries {
                    en.add_value(parse_value(value_name, def, &join(&values_path, value_name))?);
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(SchemaError::shape(
                    values_path,
                    format!("expected a list or mapping of values, found {}", other),
                ));
            }
        }
        if en.values.is_empty() {
            return Err(SchemaError::EnumMissingValues(name.to_string()));
        }

        en.description = optional_str(map, "description", path)?;
        if let Some(plugins) = map.get("plugins") {
            en.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(en)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn values(&self) -> impl Iterator<Item = &EnumValue> {
        self.values.values()
    }

    pub fn add_value(&mut self, value: EnumValue) {
        self.values.insert(value.name.clone(), value);
    }
}

fn parse_value(name: &str, def: &Value, path: &str) -> Result<EnumValue, SchemaError> {
    let mut value = EnumValue::new(name);
    match def {
        Value::Bool(true) | Value::Null => {}
        Value::String(internal) => value.value = internal.clone(),
        other => {
            let map = expect_map(other, path)?;
            reject_unknown_keys(map, &VALUE_KEYS, path)?;
            if let Some(internal) = optional_str(map, "value", path)? {
                value.value = internal;
            }
            value.description = optional_str(map, "description", path)?;
        }
    }
    Ok(value)
}

impl Component for EnumType {
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
        self.values.extend(other.values);
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        if self.values.is_empty() {
            return Err(SchemaError::EnumMissingValues(self.name.clone()));
        }
        self.values.keys().try_for_each(|v| validate_name(v))
    }
}
