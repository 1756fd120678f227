use super::{Component, merge_option};
use crate::config::{expect_map, expect_str, join, optional_str, reject_unknown_keys, to_literal};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::type_ref::TypeRef;
use crate::types::validate_name;
use crate::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELD_KEYS: [&str; 5] = ["type", "description", "args", "resolver", "plugins"];
const ARG_KEYS: [&str; 3] = ["type", "default", "description"];

/// An argument of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    name: String,
    type_ref: String,
    default_value: Option<String>,
    description: Option<String>,
}

impl Argument {
    #[must_use]
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            default_value: None,
            description: None,
        }
    }

    /// Builder-style: set the default value literal.
    #[must_use]
    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }

    /// Parse `name: "Type"` or `name: { type, default, description }`.
    pub fn from_config(name: &str, value: &Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::String(type_ref) => Ok(Self::new(name, type_ref.clone())),
            other => {
                let map = expect_map(other, path)?;
                reject_unknown_keys(map, &ARG_KEYS, path)?;
                let type_ref = map
                    .get("type")
                    .ok_or_else(|| SchemaError::shape(path, "argument requires a 'type'"))?;
                Ok(Self {
                    name: name.to_string(),
                    type_ref: expect_str(type_ref, &join(path, "type"))?.to_string(),
                    default_value: map.get("default").map(to_literal),
                    description: optional_str(map, "description", path)?,
                })
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_ref(&self) -> &str {
        &self.type_ref
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn validate(&self, owner: &str) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        TypeRef::parse(&self.type_ref).map_err(|reason| {
            SchemaError::component(owner, format!("argument '{}': {}", self.name, reason))
        })?;
        Ok(())
    }
}

/// A field of a type, interface, or root operation type.
///
/// Root queries and mutations are fields of the `Query` and `Mutation`
/// types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    type_ref: Option<String>,
    description: Option<String>,
    args: IndexMap<String, Argument>,
    resolver: Option<String>,
    #[serde(skip)]
    plugins: PluginBindings,
}

impl Field {
    /// Create a field without a type yet.
    ///
    /// A type must be set before the schema is validated.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a field with a type.
    #[must_use]
    pub fn typed(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self::new(name).with_type(type_ref)
    }

    #[must_use]
    pub fn with_type(mut self, type_ref: impl Into<String>) -> Self {
        self.type_ref = Some(type_ref.into());
        self
    }

    /// The same field under another name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.add_arg(arg);
        self
    }

    /// Parse a field definition: a type string or a mapping.
    pub fn from_config(
        name: &str,
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        validate_name(name)?;
        if let Value::String(type_ref) = value {
            return Ok(Self::typed(name, type_ref.clone()));
        }

        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &FIELD_KEYS, path)?;

        let mut field = Self::new(name);
        field.type_ref = optional_str(map, "type", path)?;
        field.description = optional_str(map, "description", path)?;
        field.resolver = optional_str(map, "resolver", path)?;
        if let Some(args) = map.get("args") {
            let args_path = join(path, "args");
            for (arg_name, arg) in expect_map(args, &args_path)? {
                field.add_arg(Argument::from_config(arg_name, arg, &join(&args_path, arg_name))?);
            }
        }
        if let Some(plugins) = map.get("plugins") {
            field.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        Ok(field)
    }

    #[must_use]
    pub fn type_ref(&self) -> Option<&str> {
        self.type_ref.as_deref()
    }

    pub fn set_type(&mut self, type_ref: impl Into<String>) {
        self.type_ref = Some(type_ref.into());
    }

    /// The parsed type, if set and well-formed.
    #[must_use]
    pub fn parsed_type(&self) -> Option<TypeRef> {
        self.type_ref.as_deref().and_then(|t| TypeRef::parse(t).ok())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    #[must_use]
    pub fn resolver(&self) -> Option<&str> {
        self.resolver.as_deref()
    }

    pub fn set_resolver(&mut self, resolver: impl Into<String>) {
        self.resolver = Some(resolver.into());
    }

    pub fn args(&self) -> impl Iterator<Item = &Argument> {
        self.args.values()
    }

    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Argument> {
        self.args.get(name)
    }

    /// Add or replace an argument.
    pub fn add_arg(&mut self, arg: Argument) {
        self.args.insert(arg.name.clone(), arg);
    }

    pub fn remove_arg(&mut self, name: &str) -> Option<Argument> {
        self.args.shift_remove(name)
    }
}

impl Component for Field {
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
        merge_option(&mut self.type_ref, other.type_ref);
        merge_option(&mut self.description, other.description);
        merge_option(&mut self.resolver, other.resolver);
        self.args.extend(other.args);
        self.plugins.merge(other.plugins);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        let type_ref = self
            .type_ref
            .as_deref()
            .ok_or_else(|| SchemaError::component(&self.name, "field has no type"))?;
        TypeRef::parse(type_ref).map_err(|reason| SchemaError::component(&self.name, reason))?;
        for arg in self.args.values() {
            arg.validate(&self.name)?;
        }
        Ok(())
    }
}
