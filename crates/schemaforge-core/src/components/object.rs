use super::{Component, Field, merge_option};
use crate::config::{expect_bool, expect_map, expect_string_list, join, optional_str, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::types::validate_name;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use indexmap::IndexMap;
use std::collections::BTreeSet;

const TYPE_KEYS: [&str; 5] = ["fields", "interfaces", "description", "input", "plugins"];

/// An object type or input type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    name: String,
    description: Option<String>,
    fields: IndexMap<String, Field>,
    interfaces: BTreeSet<String>,
    is_input: bool,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl ObjectType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an input type.
    #[must_use]
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            is_input: true,
            ..Self::new(name)
        }
    }

    /// Builder-style: add a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    /// Parse `{ fields, interfaces, description, input, plugins }`.
    pub fn from_config(
        name: &str,
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        validate_name(name)?;
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &TYPE_KEYS, path)?;

        let mut ty = Self::new(name);
        ty.description = optional_str(map, "description", path)?;
        if let Some(input) = map.get("input") {
            ty.is_input = expect_bool(input, &join(path, "input"))?;
        }
        if let Some(fields) = map.get("fields") {
            let fields_path = join(path, "fields");
            for (field_name, def) in expect_map(fields, &fields_path)? {
                ty.add_field(Field::from_config(
                    field_name,
                    def,
                    &join(&fields_path, field_name),
                    registry,
                )?);
            }
        }
        if let Some(interfaces) = map.get("interfaces") {
            ty.interfaces
                .extend(expect_string_list(interfaces, &join(path, "interfaces"))?);
        }
        if let Some(plugins) = map.get("plugins") {
            ty.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(ty)
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    #[must_use]
    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn set_input(&mut self, is_input: bool) {
        self.is_input = is_input;
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Add a field, merging with an existing field of the same name.
    pub fn add_field(&mut self, field: Field) {
        match self.fields.get_mut(field.name()) {
            Some(existing) => existing.merge(field),
            None => {
                self.fields.insert(field.name().to_string(), field);
            }
        }
    }

    /// Get a field, creating an untyped one if absent.
    pub fn find_or_make_field(&mut self, name: &str) -> &mut Field {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| Field::new(name))
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        self.fields.shift_remove(name)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(String::as_str)
    }

    pub fn add_interface(&mut self, name: impl Into<String>) {
        self.interfaces.insert(name.into());
    }

    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.contains(interface)
    }
}

impl Component for ObjectType {
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
        self.is_input |= other.is_input;
        for field in other.fields.into_values() {
            self.add_field(field);
        }
        self.interfaces.extend(other.interfaces);
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        if self.fields.is_empty() {
            return Err(SchemaError::component(
                &self.name,
                "type must define at least one field",
            ));
        }
        for field in self.fields.values() {
            field.validate().map_err(|e| match e {
                SchemaError::InvalidComponent { component, message } => SchemaError::component(
                    format!("{}.{}", self.name, component),
                    message,
                ),
                other => other,
            })?;
            if self.is_input && field.args().next().is_some() {
                return Err(SchemaError::component(
                    format!("{}.{}", self.name, field.name()),
                    "input fields cannot take arguments",
                ));
            }
        }
        for interface in &self.interfaces {
            validate_name(interface)?;
        }
        Ok(())
    }
}
