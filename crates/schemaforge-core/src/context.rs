//! # Schema Context
//!
//! Configuration resolved once per `Schema`: the pluraliser, the model
//! creators that turn domain class names into model capabilities, the plugin
//! registry, default plugins per model kind, and free-form extension
//! settings.
//!
//! The context is written through `SchemaContext::apply` while config is
//! ingested and is only read during the build.

use crate::config::{ConfigMap, expect_map, expect_str, join, reject_unknown_keys};
use crate::plugin::{PluginBindings, PluginRegistry};
use crate::SchemaError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// MODEL CAPABILITY
// =============================================================================

/// Introspection data for one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFieldInfo {
    /// Type reference for scalar fields (ignored for relations).
    pub type_ref: String,
    /// Set when the field points at another domain class.
    pub relation: Option<Relation>,
}

/// A relation from one domain class to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub class: String,
    pub many: bool,
}

/// Default plugins a model kind contributes to its types and operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultPlugins {
    /// Plugins for the model type itself.
    pub model: PluginBindings,
    /// Plugins per operation identifier (`read`, `create`, ...).
    pub operations: BTreeMap<String, PluginBindings>,
}

impl DefaultPlugins {
    /// Parse a `modelConfig.<identifier>` entry.
    pub fn from_config(
        value: &Value,
        path: &str,
        registry: &PluginRegistry,
    ) -> Result<Self, SchemaError> {
        let map = expect_map(value, path)?;
        reject_unknown_keys(map, &["plugins", "operations"], path)?;

        let mut defaults = Self::default();
        if let Some(plugins) = map.get("plugins") {
            defaults.model = PluginBindings::from_config(plugins, &join(path, "plugins"), registry)?;
        }
        if let Some(operations) = map.get("operations") {
            let ops_path = join(path, "operations");
            for (op, op_config) in expect_map(operations, &ops_path)? {
                let op_path = join(&ops_path, op);
                let op_map = expect_map(op_config, &op_path)?;
                reject_unknown_keys(op_map, &["plugins"], &op_path)?;
                if let Some(plugins) = op_map.get("plugins") {
                    defaults.operations.insert(
                        op.clone(),
                        PluginBindings::from_config(plugins, &join(&op_path, "plugins"), registry)?,
                    );
                }
            }
        }
        Ok(defaults)
    }

    /// Merge `other` over `self`.
    pub fn merge(&mut self, other: Self) {
        self.model.merge(other.model);
        for (op, bindings) in other.operations {
            self.operations.entry(op).or_default().merge(bindings);
        }
    }
}

/// A domain model: field and relation metadata for one domain class.
///
/// Supplied by a `ModelCreator`; the engine never inspects domain classes
/// itself.
pub trait SchemaModel: Send + Sync {
    /// Model kind, used to look up `modelConfig` defaults.
    fn identifier(&self) -> &str;

    /// The domain class this model describes.
    fn source_class(&self) -> &str;

    /// Type name the model is exposed under.
    fn type_name(&self) -> String;

    /// Introspect a single field.
    fn field(&self, name: &str) -> Option<ModelFieldInfo>;

    /// Every field that can be exposed, used for the `*` wildcard.
    fn field_names(&self) -> Vec<String>;

    /// Fields always present on the type (e.g. `id`).
    fn default_field_names(&self) -> Vec<String>;

    /// Default plugin configuration for this model kind.
    ///
    /// Read at expansion time, once every fragment has been ingested, so a
    /// `modelConfig` applied after the model still takes effect.
    fn default_plugins(&self, context: &SchemaContext) -> Option<DefaultPlugins> {
        context.model_config(self.identifier()).cloned()
    }
}

/// Turns domain class names into models.
pub trait ModelCreator: Send + Sync {
    /// Create a model for `class`, or `None` if the class is not eligible.
    fn create_model(&self, class: &str, context: &SchemaContext) -> Option<Arc<dyn SchemaModel>>;
}

// =============================================================================
// PLURALISER
// =============================================================================

/// Maps a type name to its plural form.
pub type Pluraliser = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Default English pluralisation.
#[must_use]
pub fn english_plural(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Per-schema configuration.
#[derive(Clone)]
pub struct SchemaContext {
    pluraliser: Pluraliser,
    model_creators: Vec<Arc<dyn ModelCreator>>,
    plugins: PluginRegistry,
    model_config: BTreeMap<String, DefaultPlugins>,
    settings: ConfigMap,
}

impl fmt::Debug for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaContext")
            .field("model_creators", &self.model_creators.len())
            .field("plugins", &self.plugins)
            .field("model_config", &self.model_config.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self {
            pluraliser: Arc::new(english_plural),
            model_creators: Vec::new(),
            plugins: PluginRegistry::new(),
            model_config: BTreeMap::new(),
            settings: ConfigMap::new(),
        }
    }
}

impl SchemaContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: use the given plugin registry.
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Builder-style: append a model creator.
    #[must_use]
    pub fn with_model_creator(mut self, creator: Arc<dyn ModelCreator>) -> Self {
        self.model_creators.push(creator);
        self
    }

    pub fn set_pluraliser(&mut self, pluraliser: Pluraliser) {
        self.pluraliser = pluraliser;
    }

    /// Apply a `config` section.
    ///
    /// Recognised keys: `pluraliser` (`"english"` | `"none"`) and
    /// `modelConfig`. Anything else is kept as an extension setting.
    pub fn apply(&mut self, config: &ConfigMap) -> Result<(), SchemaError> {
        for (key, value) in config {
            let path = join("config", key);
            match key.as_str() {
                "pluraliser" => match expect_str(value, &path)? {
                    "english" => self.pluraliser = Arc::new(english_plural),
                    "none" => self.pluraliser = Arc::new(str::to_string),
                    other => {
                        return Err(SchemaError::shape(
                            path,
                            format!("unknown pluraliser '{}' (expected english or none)", other),
                        ));
                    }
                },
                "modelConfig" => {
                    for (identifier, entry) in expect_map(value, &path)? {
                        let defaults =
                            DefaultPlugins::from_config(entry, &join(&path, identifier), &self.plugins)?;
                        self.model_config
                            .entry(identifier.clone())
                            .or_default()
                            .merge(defaults);
                    }
                }
                _ => {
                    self.settings.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Pluralise a type name.
    #[must_use]
    pub fn pluralise(&self, name: &str) -> String {
        (self.pluraliser)(name)
    }

    /// Create a model for a domain class, asking each creator in order.
    #[must_use]
    pub fn create_model(&self, class: &str) -> Option<Arc<dyn SchemaModel>> {
        self.model_creators
            .iter()
            .find_map(|creator| creator.create_model(class, self))
    }

    #[must_use]
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Default plugins configured for a model kind.
    #[must_use]
    pub fn model_config(&self, identifier: &str) -> Option<&DefaultPlugins> {
        self.model_config.get(identifier)
    }

    /// An extension setting from the `config` section.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}

// =============================================================================
// TESTS
// =============================================================================
