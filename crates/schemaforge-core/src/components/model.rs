//! Model-backed types.
//!
//! A `ModelType` wraps a `SchemaModel` and exposes a subset of its fields.
//! Operations are only declared while config is ingested; `compile` turns
//! them into root query and mutation fields once per build.

use super::{Argument, Component, Field, ObjectType, merge_option};
use crate::config::{expect_bool, expect_map, expect_string_list, join, optional_str, reject_unknown_keys};
use crate::context::{DefaultPlugins, Relation, SchemaContext, SchemaModel};
use crate::plugin::PluginBindings;
use crate::primitives::WILDCARD;
use crate::types::validate_name;
use crate::SchemaError;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const MODEL_KEYS: [&str; 6] = ["fields", "excludeFields", "operations", "plugins", "description", "name"];
const OPERATION_KEYS: [&str; 2] = ["plugins", "name"];

// =============================================================================
// MODEL FIELDS
// =============================================================================

/// A field of a model type, optionally backed by a relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelField {
    field: Field,
    relation: Option<Relation>,
}

impl ModelField {
    #[must_use]
    pub fn new(field: Field) -> Self {
        Self {
            field,
            relation: None,
        }
    }

    #[must_use]
    pub fn related(field: Field, relation: Relation) -> Self {
        Self {
            field,
            relation: Some(relation),
        }
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    #[must_use]
    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    #[must_use]
    pub fn into_field(self) -> Field {
        self.field
    }
}

impl Component for ModelField {
    fn name(&self) -> &str {
        self.field.name()
    }

    fn plugins(&self) -> &PluginBindings {
        self.field.plugins()
    }

    fn plugins_mut(&mut self) -> &mut PluginBindings {
        self.field.plugins_mut()
    }

    fn merge(&mut self, other: Self) {
        self.field.merge(other.field);
        merge_option(&mut self.relation, other.relation);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        self.field.validate()
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// The operations a model can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelOperationKind {
    Read,
    ReadOne,
    Create,
    Update,
    Delete,
}

impl ModelOperationKind {
    pub const ALL: [Self; 5] = [Self::Read, Self::ReadOne, Self::Create, Self::Update, Self::Delete];

    #[must_use]
    pub fn parse(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.identifier() == identifier)
    }

    /// Config identifier of the operation.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadOne => "readOne",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the operation belongs on the root mutation type.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

/// Per-operation config on a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationConfig {
    pub enabled: bool,
    /// Overrides the generated field name.
    pub name: Option<String>,
    pub plugins: PluginBindings,
}

impl OperationConfig {
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    fn from_config(
        value: &Value,
        path: &str,
        context: &SchemaContext,
    ) -> Result<Self, SchemaError> {
        if let Value::Bool(_) = value {
            return Ok(Self {
                enabled: expect_bool(value, path)?,
                ..Self::default()
            });
        }
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &OPERATION_KEYS, path)?;
        let mut op = Self::enabled();
        op.name = optional_str(map, "name", path)?;
        if let Some(name) = &op.name {
            validate_name(name)?;
        }
        if let Some(plugins) = map.get("plugins") {
            op.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), context.plugins())?;
        }
        Ok(op)
    }

    fn merge(&mut self, other: Self) {
        self.enabled = other.enabled;
        merge_option(&mut self.name, other.name);
        self.plugins.merge(other.plugins);
    }
}

/// A generated root field.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOperation {
    pub kind: ModelOperationKind,
    pub field: Field,
}

/// Output of `ModelType::compile`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledModel {
    /// Generated operations keyed by field name.
    pub operations: BTreeMap<String, ModelOperation>,
    /// Input types the operations refer to.
    pub extra_types: Vec<ObjectType>,
}

/// A component registered as a side effect of adding a model.
#[derive(Debug, Clone)]
pub enum ExtraType {
    Type(ObjectType),
    Model(ModelType),
}

// =============================================================================
// MODEL TYPE
// =============================================================================

/// A type whose fields and operations derive from a domain model.
#[derive(Clone)]
pub struct ModelType {
    name: String,
    model: Arc<dyn SchemaModel>,
    description: Option<String>,
    fields: IndexMap<String, ModelField>,
    operations: BTreeMap<String, OperationConfig>,
    operation_defaults: BTreeMap<String, PluginBindings>,
    plugins: PluginBindings,
    extra_types: Vec<ExtraType>,
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("class", &self.model.source_class())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("operations", &self.operations)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

impl ModelType {
    /// Create a model type with the model's default fields.
    ///
    /// Relations among the default fields register the related models as
    /// extra types.
    pub fn new(model: Arc<dyn SchemaModel>, context: &SchemaContext) -> Result<Self, SchemaError> {
        Self::build(model, context, true)
    }

    /// Like `new`, but relations do not register extra models.
    fn detached(model: Arc<dyn SchemaModel>, context: &SchemaContext) -> Result<Self, SchemaError> {
        Self::build(model, context, false)
    }

    fn build(
        model: Arc<dyn SchemaModel>,
        context: &SchemaContext,
        follow_relations: bool,
    ) -> Result<Self, SchemaError> {
        let name = model.type_name();
        validate_name(&name)?;
        let mut ty = Self {
            name,
            model,
            description: None,
            fields: IndexMap::new(),
            operations: BTreeMap::new(),
            operation_defaults: BTreeMap::new(),
            plugins: PluginBindings::new(),
            extra_types: Vec::new(),
        };
        for field in ty.model.default_field_names() {
            ty.add_model_field(&field, context, follow_relations)?;
        }
        Ok(ty)
    }

    /// Parse a model definition keyed by domain class.
    ///
    /// `value` may be `true`/null (defaults only) or a mapping of `fields`,
    /// `excludeFields`, `operations`, `plugins`, `description` and `name`.
    pub fn from_config(
        class: &str,
        value: &Value,
        path: &str,
        context: &SchemaContext,
    ) -> Result<Self, SchemaError> {
        let model = context
            .create_model(class)
            .ok_or_else(|| SchemaError::NoModelForClass(class.to_string()))?;
        let mut ty = Self::new(model, context)?;
        if matches!(value, Value::Null | Value::Bool(true)) {
            return Ok(ty);
        }

        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &MODEL_KEYS, path)?;

        if let Some(name) = optional_str(map, "name", path)? {
            validate_name(&name)?;
            ty.name = name;
        }
        ty.description = optional_str(map, "description", path)?;

        if let Some(fields) = map.get("fields") {
            let fields_path = join(path, "fields");
            let fields = expect_map(fields, &fields_path)?;
            if let Some(wildcard) = fields.get(WILDCARD) {
                if expect_bool(wildcard, &join(&fields_path, WILDCARD))? {
                    for field in ty.model.field_names() {
                        ty.add_field_by_name(&field, context)?;
                    }
                }
            }
            for (field_name, def) in fields.iter().filter(|(k, _)| k.as_str() != WILDCARD) {
                let field_path = join(&fields_path, field_name);
                match def {
                    Value::Bool(true) => ty.add_field_by_name(field_name, context)?,
                    Value::Bool(false) => {
                        ty.remove_field(field_name);
                    }
                    other => {
                        if ty.model.field(field_name).is_some() {
                            ty.add_field_by_name(field_name, context)?;
                        }
                        let field = Field::from_config(field_name, other, &field_path, context.plugins())?;
                        ty.add_field(ModelField::new(field));
                    }
                }
            }
        }

        if let Some(excluded) = map.get("excludeFields") {
            for field in expect_string_list(excluded, &join(path, "excludeFields"))? {
                ty.remove_field(&field);
            }
        }

        if let Some(operations) = map.get("operations") {
            let ops_path = join(path, "operations");
            let operations = expect_map(operations, &ops_path)?;
            if let Some(wildcard) = operations.get(WILDCARD) {
                let op = OperationConfig::from_config(wildcard, &join(&ops_path, WILDCARD), context)?;
                for kind in ModelOperationKind::ALL {
                    ty.configure_operation(kind.identifier(), op.clone());
                }
            }
            for (id, def) in operations.iter().filter(|(k, _)| k.as_str() != WILDCARD) {
                let op = OperationConfig::from_config(def, &join(&ops_path, id), context)?;
                ty.configure_operation(id, op);
            }
        }

        if let Some(plugins) = map.get("plugins") {
            ty.plugins = PluginBindings::from_config(plugins, &join(path, "plugins"), context.plugins())?;
        }
        Ok(ty)
    }

    #[must_use]
    pub fn model(&self) -> &Arc<dyn SchemaModel> {
        &self.model
    }

    /// The domain class backing this type.
    #[must_use]
    pub fn source_class(&self) -> &str {
        self.model.source_class()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = &ModelField> {
        self.fields.values()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut ModelField> {
        self.fields.get_mut(name)
    }

    /// Add a field, merging with an existing field of the same name.
    pub fn add_field(&mut self, field: ModelField) {
        match self.fields.get_mut(field.name()) {
            Some(existing) => existing.merge(field),
            None => {
                self.fields.insert(field.name().to_string(), field);
            }
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<ModelField> {
        self.fields.shift_remove(name)
    }

    /// Expose a field of the underlying model.
    ///
    /// Relations are typed by the related model's type name; the related
    /// model is registered as an extra type unless it is this model.
    pub fn add_field_by_name(&mut self, name: &str, context: &SchemaContext) -> Result<(), SchemaError> {
        self.add_model_field(name, context, true)
    }

    fn add_model_field(
        &mut self,
        name: &str,
        context: &SchemaContext,
        follow_relations: bool,
    ) -> Result<(), SchemaError> {
        validate_name(name)?;
        let info = self.model.field(name).ok_or_else(|| {
            SchemaError::component(&self.name, format!("model has no field '{}'", name))
        })?;

        let field = match info.relation {
            Some(relation) => {
                let related = context
                    .create_model(&relation.class)
                    .ok_or_else(|| SchemaError::NoModelForClass(relation.class.clone()))?;
                let type_name = related.type_name();
                if follow_relations && relation.class != self.model.source_class() {
                    let extra = Self::detached(related, context)?;
                    self.extra_types.push(ExtraType::Model(extra));
                }
                let type_ref = if relation.many {
                    format!("[{}!]!", type_name)
                } else {
                    type_name
                };
                ModelField::related(Field::typed(name, type_ref), relation)
            }
            None => ModelField::new(Field::typed(name, info.type_ref)),
        };
        self.add_field(field);
        Ok(())
    }

    /// Enable or reconfigure an operation by identifier.
    ///
    /// Identifiers are checked when the model is compiled.
    pub fn configure_operation(&mut self, id: &str, config: OperationConfig) {
        match self.operations.get_mut(id) {
            Some(existing) => existing.merge(config),
            None => {
                self.operations.insert(id.to_string(), config);
            }
        }
    }

    /// Configured operations, enabled or not.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &OperationConfig)> {
        self.operations.iter().map(|(id, op)| (id.as_str(), op))
    }

    /// Seed model and per-operation default plugins underneath the
    /// explicitly configured ones.
    pub fn seed_default_plugins(&mut self, defaults: &DefaultPlugins) {
        self.plugins.seed_defaults(&defaults.model);
        for (op, bindings) in &defaults.operations {
            self.operation_defaults
                .entry(op.clone())
                .or_default()
                .merge(bindings.clone());
        }
    }

    /// Extra types collected so far, leaving none behind.
    pub fn take_extra_types(&mut self) -> Vec<ExtraType> {
        std::mem::take(&mut self.extra_types)
    }

    /// Generate the enabled operations.
    pub fn compile(&self, context: &SchemaContext) -> Result<CompiledModel, SchemaError> {
        let mut compiled = CompiledModel::default();
        for (id, config) in self.operations.iter().filter(|(_, op)| op.enabled) {
            let kind = ModelOperationKind::parse(id).ok_or_else(|| SchemaError::InvalidModelOperation {
                model: self.name.clone(),
                operation: id.clone(),
            })?;

            let mut field = self.operation_field(kind, context, &mut compiled.extra_types);
            if let Some(name) = &config.name {
                field = field.renamed(name.clone());
            }
            field.set_resolver(format!("{}.{}", self.model.identifier(), kind.identifier()));
            let mut plugins = config.plugins.clone();
            if let Some(defaults) = self.operation_defaults.get(id) {
                plugins.seed_defaults(defaults);
            }
            *field.plugins_mut() = plugins;

            tracing::trace!(model = %self.name, operation = %id, field = %field.name(), "compiled model operation");
            compiled
                .operations
                .insert(field.name().to_string(), ModelOperation { kind, field });
        }
        Ok(compiled)
    }

    fn operation_field(
        &self,
        kind: ModelOperationKind,
        context: &SchemaContext,
        extras: &mut Vec<ObjectType>,
    ) -> Field {
        let plural = context.pluralise(&self.name);
        match kind {
            ModelOperationKind::Read => Field::typed(format!("read{}", plural), format!("[{}!]!", self.name)),
            ModelOperationKind::ReadOne => Field::typed(format!("readOne{}", self.name), self.name.clone())
                .with_arg(Argument::new("id", "ID!")),
            ModelOperationKind::Create => {
                let mut field = Field::typed(format!("create{}", self.name), self.name.clone());
                let input = self.input_type(format!("Create{}Input", self.name), false);
                if input.field_count() > 0 {
                    field.add_arg(Argument::new("input", format!("{}!", input.name())));
                    extras.push(input);
                }
                field
            }
            ModelOperationKind::Update => {
                let mut input = self.input_type(format!("Update{}Input", self.name), true);
                input.add_field(Field::typed("id", "ID!"));
                let field = Field::typed(format!("update{}", self.name), self.name.clone())
                    .with_arg(Argument::new("input", format!("{}!", input.name())));
                extras.push(input);
                field
            }
            ModelOperationKind::Delete => Field::typed(format!("delete{}", plural), "[ID]")
                .with_arg(Argument::new("ids", "[ID!]!")),
        }
    }

    /// Input type of the writable fields: everything except `id` and
    /// relations.
    fn input_type(&self, name: String, nullable: bool) -> ObjectType {
        let mut input = ObjectType::input(name);
        for model_field in self.fields.values() {
            if model_field.relation.is_some() || model_field.name() == "id" {
                continue;
            }
            let Some(type_ref) = model_field.field.parsed_type() else {
                continue;
            };
            let type_ref = if nullable {
                type_ref.nullable().to_string()
            } else {
                type_ref.to_string()
            };
            input.add_field(Field::typed(model_field.name(), type_ref));
        }
        input
    }

    /// The plain object type this model is exposed as.
    #[must_use]
    pub fn to_object_type(&self) -> ObjectType {
        let mut ty = ObjectType::new(self.name.clone());
        if let Some(description) = &self.description {
            ty.set_description(description.clone());
        }
        for model_field in self.fields.values() {
            ty.add_field(model_field.field.clone());
        }
        ty
    }
}

impl Component for ModelType {
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
        for (id, op) in other.operations {
            self.configure_operation(&id, op);
        }
        for (id, bindings) in other.operation_defaults {
            self.operation_defaults.entry(id).or_default().merge(bindings);
        }
        self.plugins.merge(other.plugins);
        self.extra_types.extend(other.extra_types);
    }

    fn validate(&self) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        if self.fields.is_empty() {
            return Err(SchemaError::component(
                &self.name,
                "model must expose at least one field",
            ));
        }
        for field in self.fields.values() {
            field.validate().map_err(|e| match e {
                SchemaError::InvalidComponent { component, message } => {
                    SchemaError::component(format!("{}.{}", self.name, component), message)
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
