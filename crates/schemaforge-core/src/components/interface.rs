use super::{Component, Field, merge_option};
use crate::config::{expect_map, join, optional_str, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::types::validate_name;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::Value;

const INTERFACE_KEYS: [&str; 3] = ["fields", "description", "plugins"];

/// An interface type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceType {
    name: String,
    description: Option<String>,
    fields: IndexMap<String, Field>,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl InterfaceType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    pub fn from_config(
        name: &str,
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        validate_name(name)?;
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &INTERFACE_KEYS, path)?;

        let mut interface = Self::new(name);
        interface.description = optional_str(map, "description", path)?;
        if let Some(fields) = map.get("fields") {
            let fields_path = join(path, "fields");
            for (field_name, def) in expect_map(fields, &fields_path)? {
                interface.add_field(Field::from_config(
                    field_name,
                    def,
                    &join(&fields_path, field_name),
                    registry,
                )?);
            }
        }
        if let Some(plugins) = map.get("plugins") {
            interface.plugins =
                PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(interface)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn add_field(&mut self, field: Field) {
        match self.fields.get_mut(field.name()) {
            Some(existing) => existing.merge(field),
            None => {
                self.fields.insert(field.name().to_string(), field);
            }
        }
    }
}

impl Component for InterfaceType {
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
        for field in other.fields.into_values() {
            self.add_field(field);
        }
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        if self.fields.is_empty() {
            return Err(SchemaError::component(
                &self.name,
                "interface must define at least one field",
            ));
        }
        self.fields.values().try_for_each(Field::validate)
    }
}
